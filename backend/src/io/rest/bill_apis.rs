//! # REST API for Bills
//!
//! Issuing bills per contact e-mail, fetching their PDFs and the per-shift
//! billing overview.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::io::rest::auth::CurrentUser;
use crate::io::rest::error::{ApiError, ApiResult};
use crate::io::rest::mappers::billing_mapper::BillingMapper;
use crate::AppState;
use shared::{BillContactRequest, CreateBillResponse};

/// Create a router for bill related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bills", post(create_bill))
        .route("/bills/:bill_nr", get(get_bill_document))
        .route("/notifications/bill", post(send_bill))
        .route("/shifts/:shift_nr/billing", get(get_shift_billing))
}

/// Issue (or re-render) the bill for a contact's registered campers
pub async fn create_bill(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<BillContactRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/bills - contact {}", request.email);

    state.permission_service.require_user_boss(user.user_id).await?;
    let bill_nr = state.billing_service.create_bill_for_contact(request.email.trim()).await?;

    Ok((StatusCode::CREATED, Json(CreateBillResponse { bill_nr })))
}

/// Stream a stored bill PDF
pub async fn get_bill_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(bill_nr): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/bills/{}", bill_nr);

    state
        .permission_service
        .require_user_boss(user.user_id)
        .await
        .map_err(|e| ApiError::from(e).conceal())?;
    let bytes = state.billing_service.bill_document(bill_nr).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}.pdf\"", bill_nr)),
        ],
        bytes,
    ))
}

/// Issue the bill and e-mail it to the contact
pub async fn send_bill(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<BillContactRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    info!("POST /api/notifications/bill - contact {}", request.email);

    state.permission_service.require_user_boss(user.user_id).await?;
    let bill_nr = state.billing_service.send_bill(request.email.trim()).await?;

    info!("📧 Bill {} sent to {}", bill_nr, request.email);
    Ok(StatusCode::NO_CONTENT)
}

/// Contact groups of a shift with their bill state
pub async fn get_shift_billing(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(shift_nr): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/shifts/{}/billing", shift_nr);

    state.permission_service.require_shift_boss(user.user_id, shift_nr).await?;
    let groups = state.billing_service.shift_billing(shift_nr).await?;
    Ok(Json(BillingMapper::to_shift_billing_response(groups)))
}
