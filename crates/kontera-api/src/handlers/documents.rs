//! Reception document read endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use kontera_core::models::DocumentResponse;
use kontera_core::AppError;

use crate::auth::{resolve_tenant, TenantSlug};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/reception/documents",
    tag = "reception",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the tenant")
    ),
    responses(
        (status = 200, description = "Documents with extraction summaries, newest first", body = [DocumentResponse]),
        (status = 404, description = "Unknown tenant", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
) -> Result<Json<Vec<DocumentResponse>>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;
    let listings = state.db.document_repository.list(tenant.id).await?;
    Ok(Json(
        listings.into_iter().map(DocumentResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v0/reception/documents/{id}",
    tag = "reception",
    params(
        ("X-Tenant-Slug" = String, Header, description = "Slug of the tenant"),
        ("id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document with extraction summary", body = DocumentResponse),
        (status = 404, description = "Unknown tenant or document", body = ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    TenantSlug(slug): TenantSlug,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, HttpAppError> {
    let tenant = resolve_tenant(&state.db.tenant_repository, &slug).await?;
    let listing = state
        .db
        .document_repository
        .get_listing(tenant.id, document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {document_id}")))?;
    Ok(Json(DocumentResponse::from(listing)))
}
