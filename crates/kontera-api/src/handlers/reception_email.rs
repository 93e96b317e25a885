//! Email webhook ingress
//!
//! The inbound-mail worker posts attachments here, one request per file,
//! identifying the tenant with the X-Tenant-Slug header.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use kontera_core::models::ReceptionAck;
use kontera_core::AppError;

use crate::auth::{resolve_tenant, TenantSlug};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::upload::{decode_base64_file, validate_file_size, IncomingFile};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailDocumentRequest {
    #[validate(length(min = 1))]
    pub filename: String,
    #[validate(length(min = 1))]
    pub mime_type: String,
    /// Base64-encoded file content
    #[validate(length(min = 1))]
    pub file_data: String,
    pub sender_email: String,
}

#[utoipa::path(
    post,
    path = "/api/v0/reception/email",
    tag = "reception",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the receiving tenant")
    ),
    request_body = EmailDocumentRequest,
    responses(
        (status = 200, description = "Document received", body = ReceptionAck),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse)
    )
)]
pub async fn receive_email_document(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    ValidatedJson(request): ValidatedJson<EmailDocumentRequest>,
) -> Result<Json<ReceptionAck>, HttpAppError> {
    tracing::info!(tenant = %slug, filename = %request.filename, "Receiving document from email webhook");

    request.validate().map_err(AppError::from)?;
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;

    // Decode before any persistence; bad payloads must leave no rows behind.
    let file_data = decode_base64_file(&request.file_data)?;
    validate_file_size(file_data.len(), state.config.max_file_size_bytes())?;

    let file = IncomingFile {
        data: file_data,
        filename: request.filename,
        content_type: request.mime_type,
    };

    let (document, attachment) = state
        .reception
        .ingest(&tenant, file, Some(&request.sender_email))
        .await?;

    Ok(Json(ReceptionAck::received(document.id, attachment.filename)))
}
