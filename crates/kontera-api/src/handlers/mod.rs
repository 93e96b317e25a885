pub mod documents;
pub mod extractions;
pub mod reception_email;
pub mod reception_upload;
pub mod vouchers;
