use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A jurisdiction-specific tax-rate identifier usable on postings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VatCode {
    pub code: String,
    pub description: String,
    pub rate: Decimal,
    pub vat_type: String,
}

/// One entry in the chart of accounts.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub number: String,
    pub name: String,
    pub description: Option<String>,
}

/// A balanced double-entry bookkeeping record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Voucher {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub number: i64,
    pub date: NaiveDate,
    pub description: String,
    pub extraction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One debit or credit leg of a voucher.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Posting {
    pub id: Uuid,
    pub voucher_id: Uuid,
    pub account_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub posting_date: NaiveDate,
    pub description: String,
    pub vat_code: Option<String>,
    pub row_number: i32,
}

/// Payload for creating one posting leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreatePostingPayload {
    pub account_number: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub posting_date: NaiveDate,
    pub description: String,
    pub vat_code: Option<String>,
    pub row_number: i32,
}

/// Payload for creating a voucher with its postings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVoucherPayload {
    pub date: NaiveDate,
    pub description: String,
    pub postings: Vec<CreatePostingPayload>,
}

impl CreateVoucherPayload {
    /// Sum of all posting amounts. A valid voucher sums to zero.
    pub fn postings_total(&self) -> Decimal {
        self.postings.iter().map(|p| p.amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.postings_total() == Decimal::ZERO
    }
}

/// Response model for voucher endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct PostingResponse {
    pub account_number: String,
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: String,
    pub posting_date: NaiveDate,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_code: Option<String>,
    pub row_number: i32,
}

impl From<Posting> for PostingResponse {
    fn from(posting: Posting) -> Self {
        Self {
            account_number: posting.account_number,
            amount: posting.amount,
            currency: posting.currency,
            posting_date: posting.posting_date,
            description: posting.description,
            vat_code: posting.vat_code,
            row_number: posting.row_number,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoucherResponse {
    pub id: Uuid,
    pub number: i64,
    pub date: NaiveDate,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_id: Option<Uuid>,
    pub postings: Vec<PostingResponse>,
}

impl VoucherResponse {
    pub fn from_parts(voucher: Voucher, postings: Vec<Posting>) -> Self {
        Self {
            id: voucher.id,
            number: voucher.number,
            date: voucher.date,
            description: voucher.description,
            extraction_id: voucher.extraction_id,
            postings: postings.into_iter().map(PostingResponse::from).collect(),
        }
    }
}
