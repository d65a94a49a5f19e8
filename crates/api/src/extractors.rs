//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::response::ApiError;

/// Header carrying the tenant identifier.
pub const TENANT_HEADER: &str = "X-PX-Project-ID";

/// Tenant the request belongs to.
///
/// Taken from [`TENANT_HEADER`] as-is; the upstream gateway is trusted to
/// have authenticated it.
#[derive(Debug, Clone)]
pub struct TenantId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("Missing {} header", TENANT_HEADER)))?;

        Ok(TenantId(tenant.to_string()))
    }
}
