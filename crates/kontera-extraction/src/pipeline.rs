//! End-to-end extraction pipeline
//!
//! bytes → PDF text → prompt → completion → parse → categorization
//! correction. One attempt per document; every failure maps to an
//! `ExtractionError` whose message is stored on the extraction row.

use std::sync::Arc;

use kontera_core::models::InvoiceData;

use crate::context::CategorizationContext;
use crate::error::ExtractionError;
use crate::openai::{build_extraction_prompt, CompletionClient, SYSTEM_PROMPT};
use crate::parser::{parse_invoice_response, validate_and_correct};
use crate::pdf::extract_pdf_text;

/// Upper bound on invoice text embedded in the prompt, to stay inside the
/// model's context window. Longer texts are cut at a char boundary.
const MAX_PROMPT_TEXT_CHARS: usize = 12_000;

pub struct InvoiceExtractor {
    client: Arc<dyn CompletionClient>,
}

impl InvoiceExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Run the full pipeline on raw PDF bytes.
    pub async fn extract(
        &self,
        pdf_data: Vec<u8>,
        context: &CategorizationContext,
    ) -> Result<InvoiceData, ExtractionError> {
        // PDF parsing is blocking file I/O; keep it off the async workers.
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&pdf_data))
            .await
            .map_err(|e| ExtractionError::Internal(e.to_string()))?;

        self.extract_from_text(&text, context).await
    }

    /// Run the pipeline from already-extracted invoice text.
    pub async fn extract_from_text(
        &self,
        text: &str,
        context: &CategorizationContext,
    ) -> Result<InvoiceData, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }

        tracing::info!(text_len = text.len(), "Extracted text from invoice");

        let truncated = truncate_at_char_boundary(text, MAX_PROMPT_TEXT_CHARS);
        let prompt = build_extraction_prompt(truncated, context);

        let raw_response = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        tracing::debug!(response_len = raw_response.len(), "Completion API responded");

        let invoice = parse_invoice_response(&raw_response)?;
        Ok(validate_and_correct(invoice, context))
    }
}

fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kontera_core::models::{Account, VatCode};

    enum StubBehavior {
        Respond(String),
        MissingKey,
    }

    struct StubCompletionClient {
        behavior: StubBehavior,
    }

    impl StubCompletionClient {
        fn responding(response: impl Into<String>) -> Arc<Self> {
            Arc::new(Self {
                behavior: StubBehavior::Respond(response.into()),
            })
        }

        fn missing_key() -> Arc<Self> {
            Arc::new(Self {
                behavior: StubBehavior::MissingKey,
            })
        }
    }

    #[async_trait]
    impl CompletionClient for StubCompletionClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, ExtractionError> {
            match &self.behavior {
                StubBehavior::Respond(text) => Ok(text.clone()),
                StubBehavior::MissingKey => Err(ExtractionError::MissingApiKey),
            }
        }
    }

    fn sample_context() -> CategorizationContext {
        CategorizationContext::new(
            vec![
                VatCode {
                    code: "0".to_string(),
                    description: "No VAT".to_string(),
                    rate: "0".parse().unwrap(),
                    vat_type: "none".to_string(),
                },
                VatCode {
                    code: "1".to_string(),
                    description: "Input VAT, standard rate".to_string(),
                    rate: "25".parse().unwrap(),
                    vat_type: "input".to_string(),
                },
            ],
            vec![Account {
                number: "6540".to_string(),
                name: "Inventory".to_string(),
                description: None,
            }],
        )
    }

    fn model_json(vat_code: &str) -> String {
        serde_json::json!({
            "debit_prediction": { "account": "6540" },
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
                "description": "Office supplies",
                "project": null
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn unparseable_pdf_fails_with_no_text() {
        let extractor = InvoiceExtractor::new(StubCompletionClient::responding("{}"));
        let result = extractor
            .extract(b"this is not a pdf".to_vec(), &sample_context())
            .await;
        assert!(matches!(result, Err(ExtractionError::NoText)));
    }

    #[tokio::test]
    async fn blank_text_fails_with_no_text() {
        let extractor = InvoiceExtractor::new(StubCompletionClient::responding("{}"));
        let result = extractor
            .extract_from_text("   \n ", &sample_context())
            .await;
        assert!(matches!(result, Err(ExtractionError::NoText)));
    }

    #[tokio::test]
    async fn missing_api_key_surfaces_as_error() {
        let extractor = InvoiceExtractor::new(StubCompletionClient::missing_key());
        let result = extractor
            .extract_from_text("Faktura 12345", &sample_context())
            .await;
        assert!(matches!(result, Err(ExtractionError::MissingApiKey)));
    }

    #[tokio::test]
    async fn fenced_response_with_invalid_vat_code_is_corrected() {
        let fenced = format!("```json\n{}\n```", model_json("X"));
        let extractor = InvoiceExtractor::new(StubCompletionClient::responding(fenced));
        let invoice = extractor
            .extract_from_text("Faktura 12345", &sample_context())
            .await
            .unwrap();
        assert_eq!(invoice.invoice_details.vat_code, "1");
        assert_eq!(invoice.debit_prediction.account, "6540");
    }

    #[tokio::test]
    async fn non_json_response_is_malformed() {
        let extractor =
            InvoiceExtractor::new(StubCompletionClient::responding("I could not find an invoice"));
        let result = extractor
            .extract_from_text("Faktura 12345", &sample_context())
            .await;
        assert!(matches!(result, Err(ExtractionError::MalformedResponse(_))));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "å".repeat(100); // 2 bytes per char
        let truncated = truncate_at_char_boundary(&text, 51);
        assert_eq!(truncated.len(), 50);
        assert!(truncated.chars().all(|c| c == 'å'));

        let short = "abc";
        assert_eq!(truncate_at_char_boundary(short, 10), "abc");
    }
}
