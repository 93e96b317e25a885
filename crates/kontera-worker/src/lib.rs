//! Bounded background extraction queue

pub mod context;
pub mod queue;

pub use context::{empty_handler_weak, ExtractionJob, ExtractionJobHandler};
pub use queue::{ExtractionQueue, ExtractionQueueConfig, JobHandle, JobState, SubmitError};
