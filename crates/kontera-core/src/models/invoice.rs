use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured invoice data as returned by the extraction model.
///
/// This is the transient shape parsed from the model's JSON response; it is
/// stored verbatim as the extraction payload and re-parsed for voucher
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceData {
    pub debit_prediction: DebitPrediction,
    pub invoice_details: InvoiceDetails,
}

/// The model's predicted debit (expense) account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DebitPrediction {
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceDetails {
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "KID_number", default)]
    pub kid_number: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub swift_bic: Option<String>,
    pub company_name: String,
    pub company_number: String,
    #[schema(value_type = f64)]
    pub order_total: Decimal,
    pub currency: String,
    pub vat_percentage: f64,
    pub vat_code: String,
    #[schema(value_type = f64)]
    pub vat_amount: Decimal,
    pub description: String,
    #[serde(default)]
    pub project: Option<String>,
}

/// Stored extraction payloads come in two historical forms: the legacy one
/// wraps the invoice data in a `data` field (the old result envelope), the
/// current one is the bare object. Decoding tries both explicitly.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredInvoicePayload {
    Wrapped { data: InvoiceData },
    Bare(InvoiceData),
}

/// Decode a stored extraction payload, accepting both storage forms.
pub fn decode_stored_payload(payload: &serde_json::Value) -> Result<InvoiceData, serde_json::Error> {
    let decoded: StoredInvoicePayload = serde_json::from_value(payload.clone())?;
    Ok(match decoded {
        StoredInvoicePayload::Wrapped { data } => data,
        StoredInvoicePayload::Bare(data) => data,
    })
}
