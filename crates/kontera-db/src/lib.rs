//! Database access layer for Kontera

pub mod db;

pub use db::{
    AccountRepository, DocumentRepository, ExtractionRepository, TenantRepository,
    VatCodeRepository, VoucherRepository,
};
