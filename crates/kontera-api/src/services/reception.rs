//! Document ingestion orchestrator
//!
//! Persists incoming files synchronously and queues background extraction
//! for PDFs. The document row always exists once `ingest` returns; nothing
//! that happens on the extraction side can undo it.

use kontera_core::models::{Attachment, ExtractionStatus, ReceptionDocument, Tenant};
use kontera_core::AppError;
use kontera_db::{DocumentRepository, ExtractionRepository};
use kontera_worker::{ExtractionJob, ExtractionQueue};

use crate::utils::upload::IncomingFile;

/// Only native PDFs are extracted; other formats are stored as-is.
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Clone)]
pub struct ReceptionService {
    documents: DocumentRepository,
    extractions: ExtractionRepository,
    queue: ExtractionQueue,
}

impl ReceptionService {
    pub fn new(
        documents: DocumentRepository,
        extractions: ExtractionRepository,
        queue: ExtractionQueue,
    ) -> Self {
        Self {
            documents,
            extractions,
            queue,
        }
    }

    pub fn requires_extraction(content_type: &str) -> bool {
        content_type == PDF_MIME_TYPE
    }

    /// Persist the attachment and document, then queue extraction when the
    /// file is a PDF. Queue-side failures are recorded on the extraction
    /// row; they never fail the ingestion itself.
    pub async fn ingest(
        &self,
        tenant: &Tenant,
        file: IncomingFile,
        sender_email: Option<&str>,
    ) -> Result<(ReceptionDocument, Attachment), AppError> {
        tracing::info!(
            filename = %file.filename,
            content_type = %file.content_type,
            tenant = %tenant.slug,
            byte_size = file.data.len(),
            "Saving reception document"
        );

        let (document, attachment) = self
            .documents
            .create(
                tenant.id,
                &file.filename,
                &file.content_type,
                &file.data,
                sender_email,
            )
            .await?;

        tracing::info!(document_id = %document.id, "Reception document saved");

        if Self::requires_extraction(&file.content_type) {
            self.queue_extraction(&document, &attachment, tenant).await;
        } else {
            tracing::info!(
                document_id = %document.id,
                content_type = %file.content_type,
                "Skipping extraction for non-PDF file"
            );
        }

        Ok((document, attachment))
    }

    async fn queue_extraction(
        &self,
        document: &ReceptionDocument,
        attachment: &Attachment,
        tenant: &Tenant,
    ) {
        let extraction = match self.extractions.create_pending(document.id).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::error!(
                    document_id = %document.id,
                    error = %e,
                    "Failed to create extraction row, document stored without extraction"
                );
                return;
            }
        };

        if let Err(e) = self
            .documents
            .set_extraction_mirror(document.id, ExtractionStatus::Pending, None, None)
            .await
        {
            tracing::warn!(document_id = %document.id, error = %e, "Failed to mirror pending status");
        }

        let job = ExtractionJob {
            document_id: document.id,
            extraction_id: extraction.id,
            attachment_id: attachment.id,
            tenant_id: tenant.id,
        };

        match self.queue.submit(job) {
            Ok(handle) => {
                tracing::info!(
                    document_id = %document.id,
                    extraction_id = %extraction.id,
                    job_id = %handle.id(),
                    "Queued extraction job"
                );
            }
            Err(e) => {
                // The queue is bounded; a rejected submission becomes a
                // visible FAILED extraction instead of a silently lost job.
                tracing::warn!(
                    document_id = %document.id,
                    error = %e,
                    "Extraction queue rejected job"
                );
                let message = format!("Extraction could not be queued: {e}");
                match self.extractions.mark_failed(extraction.id, &message).await {
                    Ok(failed) => {
                        if let Err(mirror_err) = self
                            .documents
                            .set_extraction_mirror(
                                document.id,
                                ExtractionStatus::Failed,
                                failed.extraction_date,
                                Some(&message),
                            )
                            .await
                        {
                            tracing::error!(
                                document_id = %document.id,
                                error = %mirror_err,
                                "Failed to mirror failed status"
                            );
                        }
                    }
                    Err(persist_err) => {
                        tracing::error!(
                            extraction_id = %extraction.id,
                            error = %persist_err,
                            "Failed to record queue rejection"
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_native_pdfs_are_extracted() {
        assert!(ReceptionService::requires_extraction("application/pdf"));
        assert!(!ReceptionService::requires_extraction("image/png"));
        assert!(!ReceptionService::requires_extraction("image/jpeg"));
        assert!(!ReceptionService::requires_extraction("application/octet-stream"));
        // Parameterized or prefixed content types do not count as PDF.
        assert!(!ReceptionService::requires_extraction("application/pdf; charset=binary"));
    }
}
