//! Explicit organization context for tenant-scoped routes.
//!
//! The wider platform resolves the organization from authenticated session
//! claims; that stack is out of scope here, so callers pass the organization
//! explicitly and the extractor below rejects requests that omit it before
//! any service code runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's organization identifier.
pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Organization scope of a request.
#[derive(Debug, Clone)]
pub struct OrgContext {
    /// Identifier of the organization every lookup must be scoped to.
    pub organization_id: String,
}

impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest(format!("Missing organization context ({ORGANIZATION_HEADER} header)"))
            })?;

        Ok(OrgContext {
            organization_id: value.to_string(),
        })
    }
}
