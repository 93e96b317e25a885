//! Voucher endpoints: manual conversion and lookup

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use kontera_core::models::VoucherResponse;
use kontera_core::AppError;

use crate::auth::{resolve_tenant, TenantSlug};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/extractions/{id}/voucher",
    tag = "vouchers",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the tenant"),
        ("id" = Uuid, Path, description = "Extraction id")
    ),
    responses(
        (status = 200, description = "Voucher created from the extraction", body = VoucherResponse),
        (status = 404, description = "Unknown tenant or extraction", body = ErrorResponse),
        (status = 409, description = "Extraction is not in a convertible state", body = ErrorResponse)
    )
)]
pub async fn create_voucher_from_extraction(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    Path(extraction_id): Path<Uuid>,
) -> Result<Json<VoucherResponse>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;

    // Scope the extraction to the requesting tenant before converting.
    let extraction = state
        .db
        .extraction_repository
        .get(extraction_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Extraction not found: {extraction_id}")))?;
    state
        .db
        .document_repository
        .get(extraction.document_id)
        .await?
        .filter(|document| document.tenant_id == tenant.id)
        .ok_or_else(|| AppError::NotFound(format!("Extraction not found: {extraction_id}")))?;

    let voucher = state
        .ledger
        .conversion_service
        .create_voucher_from_extraction(extraction.id)
        .await?;

    Ok(Json(voucher))
}

#[utoipa::path(
    get,
    path = "/api/v0/vouchers/{id}",
    tag = "vouchers",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the tenant"),
        ("id" = Uuid, Path, description = "Voucher id")
    ),
    responses(
        (status = 200, description = "Voucher with postings", body = VoucherResponse),
        (status = 404, description = "Unknown tenant or voucher", body = ErrorResponse)
    )
)]
pub async fn get_voucher(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    Path(voucher_id): Path<Uuid>,
) -> Result<Json<VoucherResponse>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;
    let (voucher, postings) = state
        .ledger
        .voucher_service
        .get_voucher(tenant.id, voucher_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Voucher not found: {voucher_id}")))?;
    Ok(Json(VoucherResponse::from_parts(voucher, postings)))
}
