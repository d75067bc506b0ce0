//! # REST API for Attendance Records

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::{ApiError, ApiResult};
use crate::io::rest::mappers::record_mapper::RecordMapper;
use crate::io::rest::ShiftQuery;
use crate::AppState;
use shared::{ForceSyncRequest, PatchRecordRequest, RecordListResponse};

/// Create a router for record related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records))
        .route("/records/sync", post(sync_records))
        .route("/records/:record_id", patch(patch_record))
        .route("/shifts/:shift_nr/records", get(list_shift_records))
}

/// Rebuild a shift's records from its registrations
pub async fn sync_records(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<ForceSyncRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/records/sync - request: {:?}", request);

    state.permission_service.require_shift_boss(user.user_id, request.shift_nr).await?;
    if !request.force_sync {
        return Ok(StatusCode::NOT_MODIFIED);
    }

    let report = state.record_service.sync_shift_records(request.shift_nr).await?;
    info!(
        "Synced shift {} records: {} created, {} activated, {} deactivated",
        request.shift_nr, report.created, report.activated, report.deactivated
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_records(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ShiftQuery>,
) -> ApiResult<impl IntoResponse> {
    let shift_nr = query.required()?;
    info!("GET /api/records - shift {}", shift_nr);
    shift_records(&state, user, shift_nr).await
}

pub async fn list_shift_records(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(shift_nr): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts/{}/records", shift_nr);
    shift_records(&state, user, shift_nr).await
}

async fn shift_records(state: &AppState, user: CurrentUser, shift_nr: i32) -> ApiResult<Json<RecordListResponse>> {
    state.permission_service.require_shift_member(user.user_id, shift_nr).await?;
    let records = state.record_service.list_records(shift_nr).await?;
    Ok(Json(RecordMapper::to_list_response(records)))
}

/// Assign tent or team, or mark presence
pub async fn patch_record(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(record_id): Path<i64>,
    payload: Result<Json<PatchRecordRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("PATCH /api/records/{} - request: {:?}", record_id, request);

    let record = state.record_service.get_record(record_id).await?;
    state
        .permission_service
        .require_shift_member(user.user_id, record.shift_nr)
        .await
        .map_err(|e| ApiError::from(e).conceal())?;

    state.record_service.patch_record(&record, &RecordMapper::to_patch(request)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{grant_role, insert_registration, insert_test_child, insert_user, seed_shift, TestServices};
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn request(method: &str, uri: &str, user_id: i64, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-user-id", user_id.to_string())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn setup() -> (TestServices, Router, i64) {
        let ctx = TestServices::new().await;
        seed_shift(&ctx.db, 2).await;
        let mari = insert_test_child(&ctx.db, "Mari", "F").await;
        insert_registration(&ctx.db, mari, 2, "a@example.com", true).await;
        let boss = insert_user(&ctx.db, "Boss", false).await;
        grant_role(&ctx.db, boss, "boss", Some(2), &[]).await;
        let app = crate::create_router(ctx.state.clone(), None).unwrap();
        (ctx, app, boss)
    }

    #[tokio::test]
    async fn test_sync_requires_force_flag_and_boss() {
        let (ctx, app, boss) = setup().await;
        let helper = insert_user(&ctx.db, "Helper", false).await;
        grant_role(&ctx.db, helper, "helper", Some(2), &[]).await;

        let response = app
            .clone()
            .oneshot(request("POST", "/api/records/sync", helper, json!({"shiftNr": 2, "forceSync": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/records/sync", boss, json!({"shiftNr": 2, "forceSync": false})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(ctx.records.list_records(2).await.unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(request("POST", "/api/records/sync", boss, json!({"shiftNr": 2, "forceSync": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(request("GET", "/api/records?shiftNr=2", helper, json!(null))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["records"][0]["childName"], "Mari");
    }

    #[tokio::test]
    async fn test_patch_record_checks() {
        let (ctx, app, boss) = setup().await;
        ctx.records.sync_shift_records(2).await.unwrap();
        let record_id = ctx.records.list_records(2).await.unwrap()[0].record.id;
        let outsider = insert_user(&ctx.db, "Outsider", false).await;

        let response = app
            .clone()
            .oneshot(request("PATCH", "/api/records/999", boss, json!({"tentNr": 3})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let uri = format!("/api/records/{}", record_id);
        let existing = app.clone().oneshot(request("PATCH", &uri, outsider, json!({"tentNr": 3}))).await.unwrap();
        let missing = app
            .clone()
            .oneshot(request("PATCH", "/api/records/999", outsider, json!({"tentNr": 3})))
            .await
            .unwrap();
        assert_eq!(existing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        let existing_body = to_bytes(existing.into_body(), usize::MAX).await.unwrap();
        let missing_body = to_bytes(missing.into_body(), usize::MAX).await.unwrap();
        assert_eq!(existing_body, missing_body);
        assert_eq!(ctx.records.get_record(record_id).await.unwrap().tent_nr, None);

        let response = app.clone().oneshot(request("PATCH", &uri, boss, json!({"tentNr": 11}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(request("PATCH", &uri, boss, json!({"tentNr": 3, "isPresent": true}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let record = ctx.records.get_record(record_id).await.unwrap();
        assert_eq!(record.tent_nr, Some(3));
        assert!(record.is_present);
    }
}
