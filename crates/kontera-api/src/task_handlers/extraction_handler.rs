//! Background extraction job handler
//!
//! Runs the extraction pipeline for one queued document and persists the
//! outcome. Pipeline failures become FAILED extraction rows with the error
//! message stored verbatim; they never escape the job. Voucher
//! auto-creation errors are logged and swallowed so a COMPLETED extraction
//! stays COMPLETED.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use kontera_core::models::{ExtractionStatus, InvoiceData};
use kontera_db::{AccountRepository, DocumentRepository, ExtractionRepository, VatCodeRepository};
use kontera_extraction::{CategorizationContext, InvoiceExtractor};
use kontera_ledger::VoucherConversionService;
use kontera_worker::{ExtractionJob, ExtractionJobHandler};

pub struct ExtractionTaskHandler {
    documents: DocumentRepository,
    extractions: ExtractionRepository,
    vat_codes: VatCodeRepository,
    accounts: AccountRepository,
    extractor: InvoiceExtractor,
    conversion: VoucherConversionService,
}

impl ExtractionTaskHandler {
    pub fn new(
        documents: DocumentRepository,
        extractions: ExtractionRepository,
        vat_codes: VatCodeRepository,
        accounts: AccountRepository,
        extractor: InvoiceExtractor,
        conversion: VoucherConversionService,
    ) -> Self {
        Self {
            documents,
            extractions,
            vat_codes,
            accounts,
            extractor,
            conversion,
        }
    }

    /// The extraction pipeline proper: load bytes, snapshot the ledger
    /// context, extract, parse, correct.
    async fn run_pipeline(&self, job: &ExtractionJob) -> Result<InvoiceData> {
        let file_data = self
            .documents
            .get_attachment_data(job.attachment_id)
            .await?
            .ok_or_else(|| anyhow!("Attachment not found: {}", job.attachment_id))?;

        // Fresh point-in-time snapshot per job; no caching.
        let vat_codes = self.vat_codes.list().await?;
        let accounts = self.accounts.list().await?;
        let context = CategorizationContext::new(vat_codes, accounts);

        let invoice = self.extractor.extract(file_data, &context).await?;
        Ok(invoice)
    }

    async fn persist_completed(
        &self,
        job: &ExtractionJob,
        invoice: &InvoiceData,
    ) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        let payload = serde_json::to_value(invoice)?;
        let extraction = self
            .extractions
            .mark_completed(job.extraction_id, payload)
            .await?;
        self.documents
            .set_extraction_mirror(
                job.document_id,
                ExtractionStatus::Completed,
                extraction.extraction_date,
                None,
            )
            .await?;

        tracing::info!(
            document_id = %job.document_id,
            extraction_id = %job.extraction_id,
            invoice_number = %invoice.invoice_details.invoice_number,
            company = %invoice.invoice_details.company_name,
            "Extraction completed"
        );
        Ok(extraction.extraction_date)
    }

    async fn persist_failed(&self, job: &ExtractionJob, message: &str) -> Result<()> {
        let extraction = self
            .extractions
            .mark_failed(job.extraction_id, message)
            .await?;
        self.documents
            .set_extraction_mirror(
                job.document_id,
                ExtractionStatus::Failed,
                extraction.extraction_date,
                Some(message),
            )
            .await?;

        tracing::warn!(
            document_id = %job.document_id,
            extraction_id = %job.extraction_id,
            error = %message,
            "Extraction failed"
        );
        Ok(())
    }

    /// Voucher auto-creation after a completed extraction. Errors are
    /// logged, never propagated; the extraction stays COMPLETED.
    async fn try_auto_create_voucher(
        &self,
        job: &ExtractionJob,
        extraction_date: Option<chrono::DateTime<chrono::Utc>>,
    ) {
        match self
            .conversion
            .create_voucher_from_extraction(job.extraction_id)
            .await
        {
            Ok(voucher) => {
                tracing::info!(
                    extraction_id = %job.extraction_id,
                    voucher_number = voucher.number,
                    "Auto-created voucher from extraction"
                );
                if let Err(e) = self
                    .documents
                    .set_extraction_mirror(
                        job.document_id,
                        ExtractionStatus::ConvertedToVoucher,
                        extraction_date,
                        None,
                    )
                    .await
                {
                    tracing::warn!(
                        document_id = %job.document_id,
                        error = %e,
                        "Failed to mirror converted status"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    extraction_id = %job.extraction_id,
                    error = %e,
                    "Could not auto-create voucher"
                );
            }
        }
    }
}

#[async_trait]
impl ExtractionJobHandler for ExtractionTaskHandler {
    async fn process_document(self: Arc<Self>, job: &ExtractionJob) -> Result<()> {
        self.extractions
            .update_status(job.extraction_id, ExtractionStatus::Processing)
            .await?;
        self.documents
            .set_extraction_mirror(job.document_id, ExtractionStatus::Processing, None, None)
            .await?;

        match self.run_pipeline(job).await {
            Ok(invoice) => {
                let extraction_date = self.persist_completed(job, &invoice).await?;
                self.try_auto_create_voucher(job, extraction_date).await;
            }
            Err(e) => {
                self.persist_failed(job, &e.to_string()).await?;
            }
        }

        Ok(())
    }
}
