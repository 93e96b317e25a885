//! PDF text extraction
//!
//! The bytes are written to a scoped temporary file which is removed on
//! every exit path (NamedTempFile deletes on drop). A document that cannot
//! be parsed (malformed, encrypted, image-only) yields the empty string;
//! the pipeline treats that as the "no extractable text" sentinel.

use std::io::Write;

use tempfile::NamedTempFile;

/// Extract plain text from PDF bytes. Returns the empty string when
/// extraction is impossible; never fails.
pub fn extract_pdf_text(data: &[u8]) -> String {
    let mut temp_file = match NamedTempFile::new() {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create temporary PDF file");
            return String::new();
        }
    };

    if let Err(e) = temp_file.write_all(data).and_then(|_| temp_file.flush()) {
        tracing::warn!(error = %e, "Failed to write temporary PDF file");
        return String::new();
    }

    match pdf_extract::extract_text(temp_file.path()) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to extract text from PDF");
            String::new()
        }
    }
}
