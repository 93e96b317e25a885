use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::extraction::ExtractionStatus;

/// Stored file content metadata. The binary payload lives in the same row
/// but is only fetched by the extraction job, never on list queries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub byte_size: i64,
    pub created_at: DateTime<Utc>,
}

/// One received invoice/receipt file.
///
/// The extraction_* fields mirror the associated extraction row (when one
/// exists) so list views never need the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub attachment_id: Uuid,
    pub sender_email: Option<String>,
    pub received_at: DateTime<Utc>,
    pub extraction_status: Option<ExtractionStatus>,
    pub extraction_date: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for ReceptionDocument {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let extraction_status = row
            .get::<Option<String>, _>("extraction_status")
            .map(|s| {
                s.parse::<ExtractionStatus>().map_err(|e| {
                    sqlx::Error::Decode(format!("Failed to parse extraction status: {}", e).into())
                })
            })
            .transpose()?;
        Ok(ReceptionDocument {
            id: row.get("id"),
            tenant_id: row.get("tenant_id"),
            attachment_id: row.get("attachment_id"),
            sender_email: row.get("sender_email"),
            received_at: row.get("received_at"),
            extraction_status,
            extraction_date: row.get("extraction_date"),
            processing_error: row.get("processing_error"),
        })
    }
}

/// A document joined with its attachment metadata and extraction id, as
/// returned by list queries (newest first).
#[derive(Debug, Clone, Serialize)]
pub struct DocumentListing {
    pub document: ReceptionDocument,
    pub filename: String,
    pub content_type: String,
    pub byte_size: i64,
    pub extraction_id: Option<Uuid>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for DocumentListing {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(DocumentListing {
            document: ReceptionDocument::from_row(row)?,
            filename: row.get("filename"),
            content_type: row.get("content_type"),
            byte_size: row.get("byte_size"),
            extraction_id: row.get("extraction_id"),
        })
    }
}

/// Response model for document read endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub byte_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_email: Option<String>,
    pub received_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_status: Option<ExtractionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

impl From<DocumentListing> for DocumentResponse {
    fn from(listing: DocumentListing) -> Self {
        DocumentResponse {
            id: listing.document.id,
            filename: listing.filename,
            content_type: listing.content_type,
            byte_size: listing.byte_size,
            sender_email: listing.document.sender_email,
            received_at: listing.document.received_at,
            extraction_id: listing.extraction_id,
            extraction_status: listing.document.extraction_status,
            extraction_date: listing.document.extraction_date,
            processing_error: listing.document.processing_error,
        }
    }
}

/// Minimal acknowledgment returned to the email webhook and upload clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceptionAck {
    pub id: Uuid,
    pub filename: String,
    pub status: String,
}

impl ReceptionAck {
    pub fn received(id: Uuid, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
            status: "received".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_response_from_listing() {
        let doc_id = Uuid::new_v4();
        let extraction_id = Uuid::new_v4();
        let received_at = Utc::now();

        let listing = DocumentListing {
            document: ReceptionDocument {
                id: doc_id,
                tenant_id: Uuid::new_v4(),
                attachment_id: Uuid::new_v4(),
                sender_email: Some("billing@example.com".to_string()),
                received_at,
                extraction_status: Some(ExtractionStatus::Completed),
                extraction_date: Some(received_at),
                processing_error: None,
            },
            filename: "invoice.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            byte_size: 2048,
            extraction_id: Some(extraction_id),
        };

        let response = DocumentResponse::from(listing);

        assert_eq!(response.id, doc_id);
        assert_eq!(response.filename, "invoice.pdf");
        assert_eq!(response.content_type, "application/pdf");
        assert_eq!(response.byte_size, 2048);
        assert_eq!(response.extraction_id, Some(extraction_id));
        assert_eq!(response.extraction_status, Some(ExtractionStatus::Completed));
        assert_eq!(response.received_at, received_at);
    }

    #[test]
    fn test_document_response_without_extraction() {
        let listing = DocumentListing {
            document: ReceptionDocument {
                id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                attachment_id: Uuid::new_v4(),
                sender_email: None,
                received_at: Utc::now(),
                extraction_status: None,
                extraction_date: None,
                processing_error: None,
            },
            filename: "receipt.png".to_string(),
            content_type: "image/png".to_string(),
            byte_size: 512,
            extraction_id: None,
        };

        let response = DocumentResponse::from(listing);
        assert_eq!(response.extraction_id, None);
        assert_eq!(response.extraction_status, None);
        assert_eq!(response.processing_error, None);
    }

    #[test]
    fn test_reception_ack() {
        let id = Uuid::new_v4();
        let ack = ReceptionAck::received(id, "invoice.pdf");
        assert_eq!(ack.id, id);
        assert_eq!(ack.filename, "invoice.pdf");
        assert_eq!(ack.status, "received");
    }
}
