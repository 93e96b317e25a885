//! Voucher-from-extraction conversion
//!
//! Maps a completed invoice extraction into a two-leg voucher: a debit on
//! the predicted cost account and a credit on accounts payable for the
//! negated amount, so the voucher balances by construction.

use uuid::Uuid;

use kontera_core::models::{
    decode_stored_payload, CreatePostingPayload, CreateVoucherPayload, InvoiceData,
    InvoiceExtraction, VoucherResponse,
};
use kontera_core::AppError;
use kontera_db::{DocumentRepository, ExtractionRepository};

use crate::voucher::VoucherService;

/// Credit side of every auto-created voucher.
pub const ACCOUNTS_PAYABLE_ACCOUNT: &str = "2400";

#[derive(Clone)]
pub struct VoucherConversionService {
    extractions: ExtractionRepository,
    documents: DocumentRepository,
    vouchers: VoucherService,
}

impl VoucherConversionService {
    pub fn new(
        extractions: ExtractionRepository,
        documents: DocumentRepository,
        vouchers: VoucherService,
    ) -> Self {
        Self {
            extractions,
            documents,
            vouchers,
        }
    }

    /// Create a voucher from a completed extraction, link it back, and
    /// advance the extraction to converted. Every failure surfaces to the
    /// caller; the ingestion orchestrator decides whether to swallow it.
    pub async fn create_voucher_from_extraction(
        &self,
        extraction_id: Uuid,
    ) -> Result<VoucherResponse, AppError> {
        let extraction = self
            .extractions
            .get(extraction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Extraction not found: {extraction_id}")))?;

        ensure_convertible(&extraction)?;

        let invoice = decode_stored_payload(&extraction.payload).map_err(|e| {
            AppError::InvalidInput(format!("Failed to parse extraction payload: {e}"))
        })?;

        let document = self
            .documents
            .get(extraction.document_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Reception document not found: {}",
                    extraction.document_id
                ))
            })?;

        let payload = CreateVoucherPayload {
            date: invoice.invoice_details.invoice_date,
            description: invoice.invoice_details.description.clone(),
            postings: build_postings(&invoice),
        };

        let (voucher, postings) = self
            .vouchers
            .create_voucher(document.tenant_id, &payload)
            .await?;

        let voucher = self
            .vouchers
            .repository()
            .link_extraction(voucher.id, extraction.id)
            .await?
            .unwrap_or(voucher);

        self.extractions.mark_converted(extraction.id).await?;

        tracing::info!(
            extraction_id = %extraction.id,
            voucher_id = %voucher.id,
            voucher_number = voucher.number,
            "Created voucher from extraction"
        );

        Ok(VoucherResponse::from_parts(voucher, postings))
    }
}

/// A voucher may only be built from a COMPLETED extraction; converting an
/// already-converted one must fail rather than duplicate the voucher.
pub fn ensure_convertible(extraction: &InvoiceExtraction) -> Result<(), AppError> {
    if !extraction.is_convertible() {
        return Err(AppError::InvalidState(format!(
            "Extraction is not completed. Current status: {}",
            extraction.status
        )));
    }
    Ok(())
}

/// Exactly two postings: the debit leg on the predicted account carries the
/// VAT code, the credit leg on accounts payable negates the amount.
pub fn build_postings(invoice: &InvoiceData) -> Vec<CreatePostingPayload> {
    let details = &invoice.invoice_details;
    vec![
        CreatePostingPayload {
            account_number: invoice.debit_prediction.account.clone(),
            amount: details.order_total,
            currency: details.currency.clone(),
            posting_date: details.invoice_date,
            description: details.description.clone(),
            vat_code: Some(details.vat_code.clone()),
            row_number: 0,
        },
        CreatePostingPayload {
            account_number: ACCOUNTS_PAYABLE_ACCOUNT.to_string(),
            amount: -details.order_total,
            currency: details.currency.clone(),
            posting_date: details.invoice_date,
            description: details.description.clone(),
            vat_code: None,
            row_number: 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kontera_core::models::ExtractionStatus;
    use rust_decimal::Decimal;

    fn sample_invoice() -> InvoiceData {
        serde_json::from_value(serde_json::json!({
            "debit_prediction": { "account": "6540" },
            "invoice_details": {
                "invoice_number": "INV-2025-0092",
                "invoice_date": "2025-07-15",
                "due_date": null,
                "KID_number": null,
                "account_number": null,
                "swift_bic": null,
                "company_name": "Example Supplies AS",
                "company_number": "981234567",
                "order_total": 12500.50,
                "currency": "NOK",
                "vat_percentage": 25.0,
                "vat_code": "1",
                "vat_amount": 2500.10,
                "description": "Office chairs and desks, July 2025",
                "project": null
            }
        }))
        .unwrap()
    }

    fn extraction_with_status(status: ExtractionStatus) -> InvoiceExtraction {
        InvoiceExtraction {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            payload: serde_json::json!({}),
            status,
            extraction_date: Some(Utc::now()),
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn postings_sum_to_zero() {
        let postings = build_postings(&sample_invoice());
        let total: Decimal = postings.iter().map(|p| p.amount).sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn debit_leg_carries_prediction_and_vat_code() {
        let postings = build_postings(&sample_invoice());
        assert_eq!(postings.len(), 2);

        let debit = &postings[0];
        assert_eq!(debit.account_number, "6540");
        assert_eq!(debit.amount, "12500.50".parse::<Decimal>().unwrap());
        assert_eq!(debit.vat_code.as_deref(), Some("1"));
        assert_eq!(debit.row_number, 0);
    }

    #[test]
    fn credit_leg_is_negated_accounts_payable_without_vat() {
        let postings = build_postings(&sample_invoice());

        let credit = &postings[1];
        assert_eq!(credit.account_number, ACCOUNTS_PAYABLE_ACCOUNT);
        assert_eq!(credit.amount, "-12500.50".parse::<Decimal>().unwrap());
        assert_eq!(credit.vat_code, None);
        assert_eq!(credit.row_number, 1);
    }

    #[test]
    fn both_legs_share_date_currency_and_description() {
        let invoice = sample_invoice();
        let postings = build_postings(&invoice);
        for posting in &postings {
            assert_eq!(posting.posting_date, invoice.invoice_details.invoice_date);
            assert_eq!(posting.currency, "NOK");
            assert_eq!(posting.description, invoice.invoice_details.description);
        }
    }

    #[test]
    fn only_completed_extractions_are_convertible() {
        assert!(ensure_convertible(&extraction_with_status(ExtractionStatus::Completed)).is_ok());

        for status in [
            ExtractionStatus::Pending,
            ExtractionStatus::Processing,
            ExtractionStatus::Failed,
            ExtractionStatus::ConvertedToVoucher,
        ] {
            let err = ensure_convertible(&extraction_with_status(status)).unwrap_err();
            match err {
                AppError::InvalidState(msg) => {
                    assert!(msg.contains(&status.to_string()));
                }
                other => panic!("expected InvalidState, got {other:?}"),
            }
        }
    }
}
