use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::ApiResult;
use crate::AppState;
use shared::AddTentScoreRequest;

/// Create a router for tent related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shifts/:shift_nr/tents/:tent_nr", get(get_tent))
        .route("/shifts/:shift_nr/tents/:tent_nr/scores", post(add_tent_score))
        .route("/grades/:grade_id", delete(delete_grade))
}

/// Who sleeps in the tent and how it has scored so far
pub async fn get_tent(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((shift_nr, tent_nr)): Path<(i32, i32)>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts/{}/tents/{}", shift_nr, tent_nr);

    state.permission_service.require_shift_member(user.user_id, shift_nr).await?;
    let info = state.tent_service.tent_info(shift_nr, tent_nr).await?;
    Ok(Json(info))
}

pub async fn add_tent_score(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((shift_nr, tent_nr)): Path<(i32, i32)>,
    payload: Result<Json<AddTentScoreRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/shifts/{}/tents/{}/scores - score {}", shift_nr, tent_nr, request.score);

    state.permission_service.require_shift_member(user.user_id, shift_nr).await?;
    let score = state.tent_service.add_score(shift_nr, tent_nr, request.score).await?;
    Ok((StatusCode::CREATED, Json(score)))
}

pub async fn delete_grade(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(grade_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("DELETE /api/grades/{} - user {}", grade_id, user.user_id);

    state.tent_service.delete_score(grade_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
