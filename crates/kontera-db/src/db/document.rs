//! Reception document and attachment repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use kontera_core::models::{Attachment, DocumentListing, ExtractionStatus, ReceptionDocument};

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist the attachment and its reception document in one transaction.
    /// Once this returns, a document row exists regardless of what the
    /// extraction pipeline later does.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        filename: &str,
        content_type: &str,
        file_data: &[u8],
        sender_email: Option<&str>,
    ) -> Result<(ReceptionDocument, Attachment)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let attachment = sqlx::query_as::<Postgres, Attachment>(
            r#"
            INSERT INTO attachments (filename, content_type, file_data, byte_size)
            VALUES ($1, $2, $3, $4)
            RETURNING id, filename, content_type, byte_size, created_at
            "#,
        )
        .bind(filename)
        .bind(content_type)
        .bind(file_data)
        .bind(file_data.len() as i64)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create attachment")?;

        let document = sqlx::query_as::<Postgres, ReceptionDocument>(
            r#"
            INSERT INTO reception_documents (tenant_id, attachment_id, sender_email)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, attachment_id, sender_email, received_at,
                extraction_status, extraction_date, processing_error
            "#,
        )
        .bind(tenant_id)
        .bind(attachment.id)
        .bind(sender_email)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create reception document")?;

        tx.commit().await.context("Failed to commit transaction")?;
        Ok((document, attachment))
    }

    pub async fn get(&self, document_id: Uuid) -> Result<Option<ReceptionDocument>> {
        let document = sqlx::query_as::<Postgres, ReceptionDocument>(
            r#"
            SELECT id, tenant_id, attachment_id, sender_email, received_at,
                extraction_status, extraction_date, processing_error
            FROM reception_documents
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get reception document")?;
        Ok(document)
    }

    /// One document with attachment metadata and extraction id, tenant-scoped.
    pub async fn get_listing(
        &self,
        tenant_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<DocumentListing>> {
        let listing = sqlx::query_as::<Postgres, DocumentListing>(
            r#"
            SELECT d.id, d.tenant_id, d.attachment_id, d.sender_email, d.received_at,
                d.extraction_status, d.extraction_date, d.processing_error,
                a.filename, a.content_type, a.byte_size,
                e.id AS extraction_id
            FROM reception_documents d
            JOIN attachments a ON a.id = d.attachment_id
            LEFT JOIN invoice_extractions e ON e.document_id = d.id
            WHERE d.tenant_id = $1 AND d.id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get document listing")?;
        Ok(listing)
    }

    /// All documents for a tenant, newest first, with extraction summaries.
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<DocumentListing>> {
        let listings = sqlx::query_as::<Postgres, DocumentListing>(
            r#"
            SELECT d.id, d.tenant_id, d.attachment_id, d.sender_email, d.received_at,
                d.extraction_status, d.extraction_date, d.processing_error,
                a.filename, a.content_type, a.byte_size,
                e.id AS extraction_id
            FROM reception_documents d
            JOIN attachments a ON a.id = d.attachment_id
            LEFT JOIN invoice_extractions e ON e.document_id = d.id
            WHERE d.tenant_id = $1
            ORDER BY d.received_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list reception documents")?;
        Ok(listings)
    }

    /// Fetch the binary payload of an attachment. Only the extraction job
    /// reads this; list queries never touch the blob.
    pub async fn get_attachment_data(&self, attachment_id: Uuid) -> Result<Option<Vec<u8>>> {
        let data = sqlx::query_scalar::<Postgres, Vec<u8>>(
            r#"
            SELECT file_data
            FROM attachments
            WHERE id = $1
            "#,
        )
        .bind(attachment_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get attachment data")?;
        Ok(data)
    }

    /// Mirror the extraction outcome onto the document's denormalized fields.
    pub async fn set_extraction_mirror(
        &self,
        document_id: Uuid,
        status: ExtractionStatus,
        extraction_date: Option<DateTime<Utc>>,
        processing_error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE reception_documents
            SET extraction_status = $2,
                extraction_date = $3,
                processing_error = $4
            WHERE id = $1
            "#,
        )
        .bind(document_id)
        .bind(status.to_string())
        .bind(extraction_date)
        .bind(processing_error)
        .execute(&self.pool)
        .await
        .context("Failed to update document extraction mirror")?;
        Ok(())
    }
}
