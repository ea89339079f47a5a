//! Caller identity extractor

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::config_store::UserId;
use crate::error::Error;

/// Header carrying the chat user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Numeric user id of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| Error::Unauthorized("missing X-User-Id header".to_string()))?;

        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(Caller)
            .ok_or_else(|| Error::Unauthorized("invalid X-User-Id header".to_string()))
    }
}
