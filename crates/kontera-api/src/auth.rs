//! Tenant resolution
//!
//! Both ingress paths identify the tenant through the `X-Tenant-Slug`
//! header (full session auth lives elsewhere in the platform). The
//! extractor only pulls the header; handlers resolve it against the tenant
//! repository so an unknown slug becomes a domain error, not a 500.

use axum::{extract::FromRequestParts, http::request::Parts};
use kontera_core::models::Tenant;
use kontera_core::AppError;
use kontera_db::TenantRepository;

use crate::error::HttpAppError;

pub const TENANT_SLUG_HEADER: &str = "X-Tenant-Slug";

/// The raw tenant slug from the request headers.
#[derive(Debug, Clone)]
pub struct TenantSlug(pub String);

impl<S> FromRequestParts<S> for TenantSlug
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_SLUG_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(|slug| TenantSlug(slug.to_string()))
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(format!(
                    "Missing {TENANT_SLUG_HEADER} header"
                )))
            })
    }
}

/// Look up the tenant for a slug. Unknown tenants are a caller-visible
/// not-found, matching the webhook contract.
pub async fn resolve_tenant(
    repository: &TenantRepository,
    slug: &str,
) -> Result<Tenant, AppError> {
    repository
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))
}
