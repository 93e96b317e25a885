//! Multipart upload ingress
//!
//! Accepts one or more `file` fields. Every file is validated before any
//! of them is persisted, so a rejected batch leaves no partial state.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};

use kontera_core::models::ReceptionAck;

use crate::auth::{resolve_tenant, TenantSlug};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{
    extract_multipart_files, validate_file_extension, validate_file_size,
};

/// Sender recorded for files that arrive through the web upload form.
const WEB_UPLOAD_SENDER: &str = "web-upload@kontera.app";

#[utoipa::path(
    post,
    path = "/api/v0/reception/documents",
    tag = "reception",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the receiving tenant")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Files received", body = [ReceptionAck]),
        (status = 400, description = "Invalid file", body = ErrorResponse),
        (status = 404, description = "Unknown tenant", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_documents(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    multipart: Multipart,
) -> Result<Json<Vec<ReceptionAck>>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;

    let files = extract_multipart_files(multipart).await?;
    tracing::info!(tenant = %tenant.slug, files = files.len(), "Reception file upload");

    for file in &files {
        validate_file_size(file.data.len(), state.config.max_file_size_bytes())?;
        validate_file_extension(&file.filename, state.config.reception_allowed_extensions())?;
    }

    let mut acks = Vec::with_capacity(files.len());
    for file in files {
        let (document, attachment) = state
            .reception
            .ingest(&tenant, file, Some(WEB_UPLOAD_SENDER))
            .await?;
        acks.push(ReceptionAck::received(document.id, attachment.filename));
    }

    Ok(Json(acks))
}
