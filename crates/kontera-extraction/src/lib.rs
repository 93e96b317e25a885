//! Invoice extraction pipeline
//!
//! PDF text extraction, categorization context, the chat-completion client,
//! and the parser/validator that turns untrusted model output into
//! ledger-consistent invoice data.

pub mod context;
pub mod error;
pub mod openai;
pub mod parser;
pub mod pdf;
pub mod pipeline;

pub use context::CategorizationContext;
pub use error::ExtractionError;
pub use openai::{CompletionClient, OpenAiClient};
pub use pipeline::InvoiceExtractor;
