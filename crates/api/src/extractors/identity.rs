use axum::{extract::FromRequestParts, http::request::Parts};
use bson::oid::ObjectId;

use crate::error::ApiError;

/// Caller identity forwarded by the gateway in `X-User-Id`.
/// Authentication and authorization are enforced upstream; this service
/// only needs to know who is acting.
pub struct Identity {
    pub user_id: ObjectId,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing X-User-Id header".to_string()))?;

        let user_id = ObjectId::parse_str(header)
            .map_err(|_| ApiError::BadRequest("Invalid X-User-Id header".to_string()))?;

        Ok(Self { user_id })
    }
}
