use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::ApiResult;
use crate::AppState;
use shared::{ShiftEmailsResponse, ShiftListResponse, ShiftUser, ShiftUsersResponse};

/// Create a router for shift related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shifts", get(list_shifts))
        .route("/shifts/:shift_nr/emails", get(get_shift_emails))
        .route("/shifts/:shift_nr/users", get(get_shift_users))
}

pub async fn list_shifts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts");
    let shifts = state.shift_service.list_shift_numbers().await?;
    Ok(Json(ShiftListResponse { shifts }))
}

/// Contact addresses of a shift's registered campers, for the boss's mailing list
pub async fn get_shift_emails(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(shift_nr): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts/{}/emails", shift_nr);

    state.permission_service.require_shift_boss(user.user_id, shift_nr).await?;
    let emails = state.shift_service.shift_emails(shift_nr).await?;
    Ok(Json(ShiftEmailsResponse { emails }))
}

/// Staff holding a role on the shift
pub async fn get_shift_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(shift_nr): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts/{}/users", shift_nr);

    let staff = state.permission_service.shift_staff(user.user_id, shift_nr).await?;
    let users = staff
        .into_iter()
        .map(|member| ShiftUser {
            user_id: member.user_id,
            name: member.name,
            shift_nr: member.shift_nr,
            role: member.role_name,
            role_id: member.role_id,
        })
        .collect();
    Ok(Json(ShiftUsersResponse { users }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{grant_role, insert_registration, insert_test_child, insert_user, seed_shift, TestServices};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_list_shifts() {
        let ctx = TestServices::new().await;
        seed_shift(&ctx.db, 1).await;
        seed_shift(&ctx.db, 2).await;

        let response = list_shifts(State(ctx.state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.state.shift_service.list_shift_numbers().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_emails_require_shift_boss() {
        let ctx = TestServices::new().await;
        let mari = insert_test_child(&ctx.db, "Mari", "F").await;
        insert_registration(&ctx.db, mari, 2, "a@example.com", true).await;
        let root = insert_user(&ctx.db, "Root", true).await;
        let nobody = insert_user(&ctx.db, "Nobody", false).await;

        let response = get_shift_emails(State(ctx.state.clone()), CurrentUser { user_id: root }, Path(2))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let response = get_shift_emails(State(ctx.state.clone()), CurrentUser { user_id: nobody }, Path(2))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_shift_users_listed_for_boss_only() {
        let ctx = TestServices::new().await;
        let boss = insert_user(&ctx.db, "Boss", false).await;
        grant_role(&ctx.db, boss, "boss", Some(2), &[]).await;
        let helper = insert_user(&ctx.db, "Helper", false).await;
        grant_role(&ctx.db, helper, "helper", Some(2), &[]).await;
        let app = crate::create_router(ctx.state.clone(), None).unwrap();

        let users_request = |user_id: i64| {
            Request::builder()
                .method("GET")
                .uri("/api/shifts/2/users")
                .header("x-user-id", user_id.to_string())
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(users_request(boss)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ShiftUsersResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.users.len(), 2);
        assert_eq!(body.users[0].user_id, boss);
        assert_eq!(body.users[0].role, "boss");
        assert_eq!(body.users[1].name, "Helper");
        assert_eq!(body.users[1].shift_nr, 2);

        let response = app.oneshot(users_request(helper)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
