//! # REST API Interface Layer
//!
//! HTTP endpoints of the camp backend. Handlers translate JSON DTOs from the
//! `shared` crate into domain commands, call one service, and map the result
//! (or a [`DomainError`](crate::domain::errors::DomainError)) back to HTTP.
//!
//! Every handler except the public registration form and the shift list
//! requires a [`CurrentUser`](auth::CurrentUser).

pub mod auth;
pub mod bill_apis;
pub mod error;
pub mod mappers;
pub mod record_apis;
pub mod registration_apis;
pub mod team_apis;
pub mod tent_apis;
pub mod shift_apis;

use axum::{extract::rejection::JsonRejection, Router};
use serde::Deserialize;

use crate::io::rest::error::{ApiError, ApiResult};
use crate::AppState;

/// All `/api` routes
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(registration_apis::router())
        .merge(record_apis::router())
        .merge(bill_apis::router())
        .merge(shift_apis::router())
        .merge(team_apis::router())
        .merge(tent_apis::router())
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `?shiftNr=N`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub shift_nr: Option<i32>,
}

impl ShiftQuery {
    pub fn required(&self) -> ApiResult<i32> {
        self.shift_nr.ok_or_else(|| ApiError::BadRequest("Query parameter shiftNr is required".to_string()))
    }
}
