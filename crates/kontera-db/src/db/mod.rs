//! Database repositories for data access layer
//!
//! This module contains all repository implementations for database
//! operations. Each repository is responsible for a specific domain entity
//! and provides CRUD operations and specialized queries.

pub mod document;
pub mod extraction;
pub mod ledger;
pub mod tenant;

pub use document::DocumentRepository;
pub use extraction::ExtractionRepository;
pub use ledger::{AccountRepository, VatCodeRepository, VoucherRepository};
pub use tenant::TenantRepository;
