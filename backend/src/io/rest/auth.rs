use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::io::rest::error::ApiError;

/// Header carrying the id of the user authenticated upstream
pub const USER_ID_HEADER: &str = "x-user-id";

/// The staff member making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(|user_id| CurrentUser { user_id })
            .ok_or(ApiError::Unauthorized)
    }
}
