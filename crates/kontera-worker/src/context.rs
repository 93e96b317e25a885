//! Extraction job handler trait
//!
//! The API implements this trait for its application state. The queue
//! calls `process_document` when a worker picks up a job; the
//! implementation runs the extraction pipeline and persists the outcome.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Everything a worker needs to process one queued extraction.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub document_id: Uuid,
    pub extraction_id: Uuid,
    pub attachment_id: Uuid,
    pub tenant_id: Uuid,
}

/// Context for job dispatch.
///
/// Implemented by the API's application state. The queue holds a weak
/// reference and calls `process_document` when a worker claims a job.
#[async_trait]
pub trait ExtractionJobHandler: Send + Sync {
    async fn process_document(self: Arc<Self>, job: &ExtractionJob) -> Result<()>;
}

/// Placeholder handler used when no real context exists yet (e.g. during
/// init). Processing always errors.
struct NoopHandler;

#[async_trait]
impl ExtractionJobHandler for NoopHandler {
    async fn process_document(self: Arc<Self>, _job: &ExtractionJob) -> Result<()> {
        Err(anyhow!("NoopHandler: no job handler available"))
    }
}

/// Returns a weak reference to a no-op handler. Use as placeholder when
/// building the queue before the real AppState exists.
pub fn empty_handler_weak() -> Weak<dyn ExtractionJobHandler> {
    let n: Arc<dyn ExtractionJobHandler> = Arc::new(NoopHandler);
    Arc::downgrade(&n)
}
