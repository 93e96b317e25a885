pub mod extraction_handler;

pub use extraction_handler::ExtractionTaskHandler;
