//! Extraction pipeline errors
//!
//! Every variant's display text ends up verbatim in the extraction row's
//! error_message, so messages are written for operators reading the queue.

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No text could be extracted from the PDF")]
    NoText,

    #[error("OpenAI API key is not configured")]
    MissingApiKey,

    #[error("Failed to process with completion API: {0}")]
    Completion(String),

    #[error("Failed to parse model response: {0}")]
    MalformedResponse(String),

    #[error("Extraction task failed: {0}")]
    Internal(String),
}
