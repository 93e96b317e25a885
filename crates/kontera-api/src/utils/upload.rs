//! Common utilities for file ingress handlers

use axum::extract::Multipart;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use kontera_core::AppError;

/// One file received through either ingress path.
#[derive(Debug)]
pub struct IncomingFile {
    pub data: Vec<u8>,
    pub filename: String,
    pub content_type: String,
}

/// Decode a base64 webhook payload. Invalid input is a caller-visible 400.
pub fn decode_base64_file(file_data: &str) -> Result<Vec<u8>, AppError> {
    BASE64_STANDARD
        .decode(file_data.trim().as_bytes())
        .map_err(|_| AppError::InvalidInput("Invalid base64 data".to_string()))
}

/// Extract every `file` field from a multipart form. At least one file is
/// required; fields with other names are ignored.
pub async fn extract_multipart_files(
    mut multipart: Multipart,
) -> Result<Vec<IncomingFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        if field_name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s: &str| s.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let content_type = field
            .content_type()
            .map(|s: &str| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?;

        files.push(IncomingFile {
            data: data.to_vec(),
            filename,
            content_type,
        });
    }

    if files.is_empty() {
        return Err(AppError::InvalidInput(
            "Please select files to upload".to_string(),
        ));
    }

    Ok(files)
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size == 0 {
        return Err(AppError::InvalidInput(
            "Uploaded file is empty".to_string(),
        ));
    }
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Validate the filename extension against the reception allowlist.
pub fn validate_file_extension(filename: &str, allowed_extensions: &[String]) -> Result<(), AppError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if extension.is_empty() || !allowed_extensions.iter().any(|allowed| *allowed == extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file format. Please upload {} files only.",
            allowed_extensions.join(", ").to_uppercase()
        )));
    }
    Ok(())
}
