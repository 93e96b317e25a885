use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an invoice extraction.
///
/// Pending and Processing are the queue-visible states; Completed may later
/// advance to ConvertedToVoucher, Failed is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    ConvertedToVoucher,
}

impl Display for ExtractionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExtractionStatus::Pending => write!(f, "pending"),
            ExtractionStatus::Processing => write!(f, "processing"),
            ExtractionStatus::Completed => write!(f, "completed"),
            ExtractionStatus::Failed => write!(f, "failed"),
            ExtractionStatus::ConvertedToVoucher => write!(f, "converted_to_voucher"),
        }
    }
}

impl FromStr for ExtractionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExtractionStatus::Pending),
            "processing" => Ok(ExtractionStatus::Processing),
            "completed" => Ok(ExtractionStatus::Completed),
            "failed" => Ok(ExtractionStatus::Failed),
            "converted_to_voucher" => Ok(ExtractionStatus::ConvertedToVoucher),
            _ => Err(anyhow::anyhow!("Invalid extraction status: {}", s)),
        }
    }
}

/// One LLM-derived structured result, tied 1:1 to a reception document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceExtraction {
    pub id: Uuid,
    pub document_id: Uuid,
    pub payload: serde_json::Value,
    pub status: ExtractionStatus,
    pub extraction_date: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, sqlx::postgres::PgRow> for InvoiceExtraction {
    fn from_row(row: &sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(InvoiceExtraction {
            id: row.get("id"),
            document_id: row.get("document_id"),
            payload: row.get("payload"),
            status: row.get::<String, _>("status").parse().map_err(|e| {
                sqlx::Error::Decode(format!("Failed to parse extraction status: {}", e).into())
            })?,
            extraction_date: row.get("extraction_date"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

impl InvoiceExtraction {
    /// Whether a voucher may be created from this extraction.
    pub fn is_convertible(&self) -> bool {
        self.status == ExtractionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_status_display() {
        assert_eq!(ExtractionStatus::Pending.to_string(), "pending");
        assert_eq!(ExtractionStatus::Processing.to_string(), "processing");
        assert_eq!(ExtractionStatus::Completed.to_string(), "completed");
        assert_eq!(ExtractionStatus::Failed.to_string(), "failed");
        assert_eq!(
            ExtractionStatus::ConvertedToVoucher.to_string(),
            "converted_to_voucher"
        );
    }

    #[test]
    fn test_extraction_status_from_str() {
        assert_eq!(
            "pending".parse::<ExtractionStatus>().unwrap(),
            ExtractionStatus::Pending
        );
        assert_eq!(
            "converted_to_voucher".parse::<ExtractionStatus>().unwrap(),
            ExtractionStatus::ConvertedToVoucher
        );
        assert!("invalid_status".parse::<ExtractionStatus>().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ExtractionStatus::Pending,
            ExtractionStatus::Processing,
            ExtractionStatus::Completed,
            ExtractionStatus::Failed,
            ExtractionStatus::ConvertedToVoucher,
        ] {
            assert_eq!(status.to_string().parse::<ExtractionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_only_completed_is_convertible() {
        let mut extraction = InvoiceExtraction {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            payload: serde_json::json!({}),
            status: ExtractionStatus::Completed,
            extraction_date: Some(Utc::now()),
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(extraction.is_convertible());

        extraction.status = ExtractionStatus::ConvertedToVoucher;
        assert!(!extraction.is_convertible());
        extraction.status = ExtractionStatus::Failed;
        assert!(!extraction.is_convertible());
        extraction.status = ExtractionStatus::Pending;
        assert!(!extraction.is_convertible());
    }
}
