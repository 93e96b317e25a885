//! Ledger services
//!
//! Voucher creation (balance-validated) and the conversion of completed
//! invoice extractions into vouchers.

pub mod convert;
pub mod voucher;

pub use convert::{build_postings, VoucherConversionService, ACCOUNTS_PAYABLE_ACCOUNT};
pub use voucher::VoucherService;
