use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::ApiResult;
use crate::io::rest::ShiftQuery;
use crate::AppState;
use shared::{CreateTeamRequest, TeamListResponse};

/// Create a router for team related APIs
pub fn router() -> Router<AppState> {
    Router::new().route("/teams", get(list_teams).post(create_team))
}

pub async fn list_teams(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ShiftQuery>,
) -> ApiResult<impl IntoResponse> {
    let shift_nr = query.required()?;
    info!("GET /api/teams - shift {}", shift_nr);

    state.permission_service.require_shift_member(user.user_id, shift_nr).await?;
    let teams = state.team_service.list_teams(shift_nr).await?;
    Ok(Json(TeamListResponse { teams }))
}

pub async fn create_team(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/teams - request: {:?}", request);

    state.permission_service.require_shift_member(user.user_id, request.shift_nr).await?;
    let team = state.team_service.create_team(request.shift_nr, &request.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{grant_role, insert_user, TestServices};

    #[tokio::test]
    async fn test_create_and_list_teams() {
        let ctx = TestServices::new().await;
        let instructor = insert_user(&ctx.db, "Instructor", false).await;
        grant_role(&ctx.db, instructor, "instructor", Some(3), &[]).await;
        let user = CurrentUser { user_id: instructor };

        let request = CreateTeamRequest { shift_nr: 3, name: "  Punased ".to_string() };
        let response = create_team(State(ctx.state.clone()), user, Ok(Json(request))).await.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let blank = CreateTeamRequest { shift_nr: 3, name: "   ".to_string() };
        let response = create_team(State(ctx.state.clone()), user, Ok(Json(blank))).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let teams = ctx.state.team_service.list_teams(3).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Punased");

        let other = CreateTeamRequest { shift_nr: 4, name: "Sinised".to_string() };
        let response = create_team(State(ctx.state.clone()), user, Ok(Json(other))).await.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
