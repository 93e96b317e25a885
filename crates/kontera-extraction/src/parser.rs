//! Model response parsing and categorization correction
//!
//! Model output is untrusted: it may be fenced in markdown, and the
//! predicted VAT code or account may not exist in the ledger. Parsing never
//! panics across the component boundary, and invalid categorization fields
//! are deterministically recomputed rather than rejected, so the result
//! always satisfies referential integrity with the chart of accounts and
//! the VAT table.

use kontera_core::models::InvoiceData;

use crate::context::CategorizationContext;
use crate::error::ExtractionError;

/// Default account when no description keyword matches: Other External Services.
const DEFAULT_COST_ACCOUNT: &str = "6790";

/// Keyword rules for recomputing an invalid debit account from the
/// free-text description. First match wins.
const ACCOUNT_KEYWORDS: &[(&[&str], &str)] = &[
    (&["office", "supplies"], "6540"),     // Inventory
    (&["rent", "lease"], "6300"),          // Rent of Premises
    (&["electricity", "power"], "6200"),   // Electricity
    (&["telephone", "phone"], "6900"),     // Telephone
    (&["travel", "transport"], "7100"),    // Travel Costs
    (&["advertising", "marketing"], "7320"), // Advertising Costs
    (&["insurance"], "7500"),              // Insurance Premiums
    (&["audit", "accounting"], "6700"),    // Audit and Accounting Fees
];

/// Strip markdown code fences the model may add despite instructions.
pub fn clean_model_response(response: &str) -> &str {
    let trimmed = response.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let without_suffix = without_prefix
        .strip_suffix("```")
        .unwrap_or(without_prefix);
    without_suffix.trim()
}

/// Parse the raw model response into invoice data. Parse failures carry the
/// serde message; they are captured by the caller, never thrown.
pub fn parse_invoice_response(raw: &str) -> Result<InvoiceData, ExtractionError> {
    let cleaned = clean_model_response(raw);
    serde_json::from_str(cleaned).map_err(|e| ExtractionError::MalformedResponse(e.to_string()))
}

/// Validate the categorization fields against the ledger snapshot and
/// recompute any that are invalid. Corrections are logged for audit and
/// returned; they are not errors.
pub fn validate_and_correct(
    mut invoice: InvoiceData,
    context: &CategorizationContext,
) -> InvoiceData {
    let vat_code = &invoice.invoice_details.vat_code;
    if !context.vat_code_exists(vat_code) {
        let corrected = vat_code_for_percentage(invoice.invoice_details.vat_percentage);
        tracing::warn!(
            invalid_vat_code = %vat_code,
            vat_percentage = invoice.invoice_details.vat_percentage,
            "Invalid VAT code detected, attempting to correct"
        );
        tracing::info!(
            from = %vat_code,
            to = %corrected,
            "Corrected VAT code"
        );
        invoice.invoice_details.vat_code = corrected.to_string();
    }

    let account = &invoice.debit_prediction.account;
    if !context.is_known_cost_account(account) {
        let corrected = account_for_description(&invoice.invoice_details.description);
        tracing::warn!(
            invalid_account = %account,
            "Invalid debit account detected, attempting to correct"
        );
        tracing::info!(
            from = %account,
            to = %corrected,
            "Corrected debit account"
        );
        invoice.debit_prediction.account = corrected.to_string();
    }

    invoice
}

/// Recompute the VAT code from the percentage using the Norwegian rate
/// thresholds; anything unrecognized falls back to the standard rate.
pub(crate) fn vat_code_for_percentage(vat_percentage: f64) -> &'static str {
    if vat_percentage == 25.0 {
        "1"
    } else if vat_percentage == 12.0 {
        "13"
    } else if vat_percentage == 0.0 {
        "0"
    } else {
        "1"
    }
}

/// Recompute the debit account from description keywords
/// (case-insensitive substring match).
pub(crate) fn account_for_description(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    for (keywords, account) in ACCOUNT_KEYWORDS {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return account;
        }
    }
    DEFAULT_COST_ACCOUNT
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::models::{Account, VatCode};

    fn vat(code: &str, rate: &str) -> VatCode {
        VatCode {
            code: code.to_string(),
            description: String::new(),
            rate: rate.parse().unwrap(),
            vat_type: "input".to_string(),
        }
    }

    fn account(number: &str, name: &str) -> Account {
        Account {
            number: number.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    fn sample_context() -> CategorizationContext {
        CategorizationContext::new(
            vec![vat("0", "0"), vat("1", "25"), vat("13", "12")],
            vec![
                account("6200", "Electricity"),
                account("6300", "Rent of Premises"),
                account("6540", "Inventory"),
                account("6700", "Audit and Accounting Fees"),
                account("6790", "Other External Services"),
                account("6900", "Telephone"),
                account("7100", "Travel Costs"),
                account("7320", "Advertising Costs"),
                account("7500", "Insurance Premiums"),
            ],
        )
    }

    fn sample_invoice(vat_code: &str, account: &str, description: &str) -> InvoiceData {
        let json = serde_json::json!({
            "debit_prediction": { "account": account },
            "invoice_details": {
                "invoice_number": "INV-1",
                "invoice_date": "2025-07-15",
                "due_date": null,
                "KID_number": null,
                "account_number": null,
                "swift_bic": null,
                "company_name": "Example AS",
                "company_number": "981234567",
                "order_total": 1000.0,
                "currency": "NOK",
                "vat_percentage": 25.0,
                "vat_code": vat_code,
                "vat_amount": 250.0,
                "description": description,
                "project": null
            }
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn clean_strips_json_fence() {
        assert_eq!(clean_model_response("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn clean_strips_plain_fence() {
        assert_eq!(clean_model_response("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn clean_leaves_unfenced_input_alone() {
        assert_eq!(clean_model_response("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn parse_failure_carries_serde_message() {
        let result = parse_invoice_response("not json at all");
        match result {
            Err(ExtractionError::MalformedResponse(msg)) => {
                assert!(!msg.is_empty());
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn parse_accepts_fenced_response() {
        let fenced = format!(
            "```json\n{}\n```",
            serde_json::to_string(&sample_invoice("1", "6540", "Office supplies")).unwrap()
        );
        let invoice = parse_invoice_response(&fenced).unwrap();
        assert_eq!(invoice.debit_prediction.account, "6540");
    }

    #[test]
    fn vat_code_thresholds() {
        assert_eq!(vat_code_for_percentage(25.0), "1");
        assert_eq!(vat_code_for_percentage(12.0), "13");
        assert_eq!(vat_code_for_percentage(0.0), "0");
        assert_eq!(vat_code_for_percentage(15.0), "1");
        assert_eq!(vat_code_for_percentage(-3.0), "1");
    }

    #[test]
    fn account_keyword_table() {
        assert_eq!(account_for_description("Office chairs"), "6540");
        assert_eq!(account_for_description("monthly SUPPLIES order"), "6540");
        assert_eq!(account_for_description("Rent for Q3"), "6300");
        assert_eq!(account_for_description("car lease"), "6300");
        assert_eq!(account_for_description("Electricity bill"), "6200");
        assert_eq!(account_for_description("power usage"), "6200");
        assert_eq!(account_for_description("telephone subscription"), "6900");
        assert_eq!(account_for_description("Phone plan"), "6900");
        assert_eq!(account_for_description("travel to Oslo"), "7100");
        assert_eq!(account_for_description("goods transport"), "7100");
        assert_eq!(account_for_description("advertising campaign"), "7320");
        assert_eq!(account_for_description("Marketing services"), "7320");
        assert_eq!(account_for_description("liability insurance"), "7500");
        assert_eq!(account_for_description("annual audit"), "6700");
        assert_eq!(account_for_description("accounting services"), "6700");
        assert_eq!(account_for_description("something else entirely"), "6790");
        assert_eq!(account_for_description(""), "6790");
    }

    #[test]
    fn invalid_vat_code_corrected_from_percentage() {
        let invoice = sample_invoice("X", "6540", "Office supplies");
        let corrected = validate_and_correct(invoice, &sample_context());
        assert_eq!(corrected.invoice_details.vat_code, "1");
        assert_eq!(corrected.debit_prediction.account, "6540");
    }

    #[test]
    fn valid_fields_pass_through_unchanged() {
        let invoice = sample_invoice("1", "7100", "travel expenses");
        let corrected = validate_and_correct(invoice.clone(), &sample_context());
        assert_eq!(corrected, invoice);
    }

    #[test]
    fn unknown_account_corrected_from_description() {
        let invoice = sample_invoice("1", "9999", "insurance premium 2025");
        let corrected = validate_and_correct(invoice, &sample_context());
        assert_eq!(corrected.debit_prediction.account, "7500");
    }

    #[test]
    fn non_cost_account_corrected_even_if_in_chart() {
        // 2400 is a real account but not a cost account; it must be replaced.
        let invoice = sample_invoice("1", "2400", "no keywords here");
        let corrected = validate_and_correct(invoice, &sample_context());
        assert_eq!(corrected.debit_prediction.account, "6790");
    }
}
