//! Invoice extraction repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use kontera_core::models::{ExtractionStatus, InvoiceExtraction};

const EXTRACTION_COLUMNS: &str =
    "id, document_id, payload, status, extraction_date, error_message, created_at, updated_at";

#[derive(Clone)]
pub struct ExtractionRepository {
    pool: PgPool,
}

impl ExtractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the extraction row at submit time. The unique constraint on
    /// document_id enforces at most one extraction per document.
    pub async fn create_pending(&self, document_id: Uuid) -> Result<InvoiceExtraction> {
        let extraction = sqlx::query_as::<Postgres, InvoiceExtraction>(&format!(
            r#"
            INSERT INTO invoice_extractions (document_id, status)
            VALUES ($1, $2)
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(document_id)
        .bind(ExtractionStatus::Pending.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to create pending extraction")?;
        Ok(extraction)
    }

    pub async fn get(&self, extraction_id: Uuid) -> Result<Option<InvoiceExtraction>> {
        let extraction = sqlx::query_as::<Postgres, InvoiceExtraction>(&format!(
            r#"
            SELECT {EXTRACTION_COLUMNS}
            FROM invoice_extractions
            WHERE id = $1
            "#,
        ))
        .bind(extraction_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get extraction")?;
        Ok(extraction)
    }

    pub async fn update_status(
        &self,
        extraction_id: Uuid,
        status: ExtractionStatus,
    ) -> Result<InvoiceExtraction> {
        let extraction = sqlx::query_as::<Postgres, InvoiceExtraction>(&format!(
            r#"
            UPDATE invoice_extractions
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(extraction_id)
        .bind(status.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to update extraction status")?;
        Ok(extraction)
    }

    pub async fn mark_completed(
        &self,
        extraction_id: Uuid,
        payload: serde_json::Value,
    ) -> Result<InvoiceExtraction> {
        let now = Utc::now();
        let extraction = sqlx::query_as::<Postgres, InvoiceExtraction>(&format!(
            r#"
            UPDATE invoice_extractions
            SET status = $2, payload = $3, extraction_date = $4,
                error_message = NULL, updated_at = $4
            WHERE id = $1
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(extraction_id)
        .bind(ExtractionStatus::Completed.to_string())
        .bind(&payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark extraction completed")?;
        Ok(extraction)
    }

    /// The error message is stored verbatim for later inspection.
    pub async fn mark_failed(
        &self,
        extraction_id: Uuid,
        error_message: &str,
    ) -> Result<InvoiceExtraction> {
        let now = Utc::now();
        let extraction = sqlx::query_as::<Postgres, InvoiceExtraction>(&format!(
            r#"
            UPDATE invoice_extractions
            SET status = $2, extraction_date = $3, error_message = $4, updated_at = $3
            WHERE id = $1
            RETURNING {EXTRACTION_COLUMNS}
            "#,
        ))
        .bind(extraction_id)
        .bind(ExtractionStatus::Failed.to_string())
        .bind(now)
        .bind(error_message)
        .fetch_one(&self.pool)
        .await
        .context("Failed to mark extraction failed")?;
        Ok(extraction)
    }

    pub async fn mark_converted(&self, extraction_id: Uuid) -> Result<InvoiceExtraction> {
        self.update_status(extraction_id, ExtractionStatus::ConvertedToVoucher)
            .await
    }
}
