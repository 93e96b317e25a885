//! Extraction read endpoint
//!
//! Returns the extraction state together with the parsed invoice data when
//! the stored payload decodes (both historical payload forms are accepted).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use kontera_core::models::{
    decode_stored_payload, ExtractionStatus, InvoiceData, InvoiceExtraction,
};
use kontera_core::AppError;

use crate::auth::{resolve_tenant, TenantSlug};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractionDetailResponse {
    pub id: Uuid,
    pub document_id: Uuid,
    pub status: ExtractionStatus,
    pub extraction_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Parsed invoice data; absent when the stored payload does not decode
    /// (e.g. failed extractions).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_data: Option<InvoiceData>,
}

impl ExtractionDetailResponse {
    fn from_extraction(extraction: InvoiceExtraction) -> Self {
        let invoice_data = decode_stored_payload(&extraction.payload).ok();
        Self {
            id: extraction.id,
            document_id: extraction.document_id,
            status: extraction.status,
            extraction_date: extraction.extraction_date,
            error_message: extraction.error_message,
            invoice_data,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/extractions/{id}",
    tag = "extractions",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the tenant"),
        ("id" = Uuid, Path, description = "Extraction id")
    ),
    responses(
        (status = 200, description = "Extraction state and parsed invoice data", body = ExtractionDetailResponse),
        (status = 404, description = "Unknown tenant or extraction", body = ErrorResponse)
    )
)]
pub async fn get_extraction(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    Path(extraction_id): Path<Uuid>,
) -> Result<Json<ExtractionDetailResponse>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;

    let extraction = state
        .db
        .extraction_repository
        .get(extraction_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Extraction not found: {extraction_id}")))?;

    // Scope to the requesting tenant through the parent document.
    state
        .db
        .document_repository
        .get(extraction.document_id)
        .await?
        .filter(|document| document.tenant_id == tenant.id)
        .ok_or_else(|| AppError::NotFound(format!("Extraction not found: {extraction_id}")))?;

    Ok(Json(ExtractionDetailResponse::from_extraction(extraction)))
}
