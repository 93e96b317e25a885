//! Domain models shared across the workspace

pub mod document;
pub mod extraction;
pub mod invoice;
pub mod ledger;
pub mod tenant;

pub use document::{Attachment, DocumentListing, DocumentResponse, ReceptionAck, ReceptionDocument};
pub use extraction::{ExtractionStatus, InvoiceExtraction};
pub use invoice::{decode_stored_payload, DebitPrediction, InvoiceData, InvoiceDetails};
pub use ledger::{
    Account, CreatePostingPayload, CreateVoucherPayload, Posting, PostingResponse, VatCode,
    Voucher, VoucherResponse,
};
pub use tenant::Tenant;
