//! # REST API for Registrations
//!
//! Public submission of the registration form plus the staff listing and
//! edit endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, patch},
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::{ApiError, ApiResult};
use crate::io::rest::mappers::registration_mapper::RegistrationMapper;
use crate::io::rest::ShiftQuery;
use crate::AppState;
use shared::{CreateRegistrationRequest, CreateRegistrationsResponse, PatchRegistrationRequest};

/// Create a router for registration related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(list_registrations).post(create_registrations))
        .route("/registrations/:reg_id", patch(patch_registration))
}

/// Submit one registration form with one entry per child
pub async fn create_registrations(
    State(state): State<AppState>,
    payload: Result<Json<Vec<CreateRegistrationRequest>>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/registrations - {} entries", request.len());

    let entries = request.into_iter().map(RegistrationMapper::to_entry).collect();
    let outcome = state.registration_service.submit_registrations(entries).await?;

    info!(
        "Registration group {} stored with order {} ({} hidden)",
        outcome.registration_id, outcome.order_nr, outcome.hidden
    );
    let response = CreateRegistrationsResponse { registration_id: outcome.registration_id };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List a shift's registrations, filtered by what the caller may see
pub async fn list_registrations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ShiftQuery>,
) -> ApiResult<impl IntoResponse> {
    let shift_nr = query.required()?;
    info!("GET /api/registrations - shift {} for user {}", shift_nr, user.user_id);

    let listing = state.registration_service.list_registrations(user.user_id, shift_nr).await?;
    Ok(Json(RegistrationMapper::to_list_response(listing)))
}

/// Staff edit of approval status or prices
pub async fn patch_registration(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(reg_id): Path<i64>,
    payload: Result<Json<PatchRegistrationRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("PATCH /api/registrations/{} - request: {:?}", reg_id, request);

    let patch = RegistrationMapper::to_patch(request);
    state
        .registration_service
        .patch_registration(user.user_id, reg_id, &patch)
        .await
        .map_err(|e| ApiError::from(e).conceal())?;

    Ok(StatusCode::NO_CONTENT)
}
