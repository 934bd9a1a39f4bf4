//! Caller identity extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use common::{Principal, Role, UserId};

use crate::error::ApiError;

/// Extracts the authenticated [`Principal`] from the `x-user-id` and
/// `x-user-role` headers installed by the upstream gateway.
///
/// Requests without both headers are rejected with 401; token
/// verification itself happens upstream.
pub struct AuthPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .ok_or_else(|| ApiError::Authentication("Authentication required".to_string()))
        };

        let id = header("x-user-id")?
            .to_str()
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        let role = header("x-user-role")?
            .to_str()
            .ok()
            .and_then(|s| s.parse::<Role>().ok())
            .ok_or_else(|| ApiError::Authentication("Invalid credentials".to_string()))?;

        Ok(AuthPrincipal(Principal::new(UserId::new(id), role)))
    }
}
