//! Chat-completion client
//!
//! A single-attempt call to an OpenAI-compatible chat-completion API. The
//! prompt pins the response to one JSON object with a fixed schema and
//! embeds the categorization option lists. Temperature is fixed low so
//! repeated extractions of the same document stay stable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::CategorizationContext;
use crate::error::ExtractionError;

/// Fixed sampling temperature for deterministic extraction.
const EXTRACTION_TEMPERATURE: f64 = 0.1;

pub const SYSTEM_PROMPT: &str = "You are a specialized invoice extraction assistant for Norwegian accounting. Always use the provided categorization rules exactly.";

/// Build the user prompt: categorization rules, the response schema with an
/// example value for every field, and the invoice text.
pub fn build_extraction_prompt(invoice_text: &str, context: &CategorizationContext) -> String {
    let categorization = context.prompt_section();
    format!(
        r#"You are an invoice extraction assistant specialized in Norwegian accounting standards.

{categorization}

Extract the following details from this invoice text and return a JSON response in this exact format:

{{
  "debit_prediction": {{
    "account": "6540"
  }},
  "invoice_details": {{
    "invoice_number": "INV-2025-0092",
    "invoice_date": "2025-07-15",
    "due_date": "2025-08-15",
    "KID_number": "1234567890123456789012345",
    "account_number": "98765432101",
    "swift_bic": "DNBANOKKXXX",
    "company_name": "Example Supplies AS",
    "company_number": "981234567",
    "order_total": 12500.50,
    "currency": "NOK",
    "vat_percentage": 25.0,
    "vat_code": "1",
    "vat_amount": 2500.10,
    "description": "Office chairs and desks, July 2025",
    "project": "Office Upgrade Q3"
  }}
}}

CRITICAL INSTRUCTIONS:
1. For vat_code: MUST use one of the exact codes from the VAT codes list above
2. For debit_prediction.account: MUST use one of the exact account numbers from the cost accounts list above
3. For Norwegian invoices: VAT rate 25% = code "1", 12% = code "13", 0% = code "0"
4. For cost accounts: Choose the most appropriate account based on the invoice description
5. If unsure about account, prefer general accounts like 6540 (Inventory) or 6790 (Other External Services)
6. For optional fields, use null if not found:
   - due_date: Use null if no due date is specified
   - KID_number: Use null if not found (common for international invoices)
   - account_number: Use null if no bank account number is provided
   - swift_bic: Use null if no SWIFT/BIC code is provided
   - project: Use null if no specific project is mentioned
7. For dates: Use YYYY-MM-DD format
8. For amounts: Use decimal numbers (e.g., 12500.50, not 12500,50)
9. For company_number: Use only the numeric part (e.g., "981234567" not "NO 981 234 567 MVA")

Here is the invoice text:
"""
{invoice_text}
"""
"#
    )
}

/// Seam for the completion call so the pipeline can be driven by a stub in
/// tests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ExtractionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ExtractionError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ExtractionError::MissingApiKey);
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: EXTRACTION_TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Completion(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Completion(format!(
                "completion API returned {status}: {body}"
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Completion(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ExtractionError::Completion("empty response from model".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kontera_core::models::{Account, VatCode};

    fn sample_context() -> CategorizationContext {
        CategorizationContext::new(
            vec![VatCode {
                code: "1".to_string(),
                description: "Input VAT, standard rate".to_string(),
                rate: "25".parse().unwrap(),
                vat_type: "input".to_string(),
            }],
            vec![Account {
                number: "6540".to_string(),
                name: "Inventory".to_string(),
                description: Some("Office equipment and supplies".to_string()),
            }],
        )
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenAiClient::new(
            None,
            "gpt-4o".to_string(),
            "https://api.openai.com/v1".to_string(),
        );
        let result = client.complete(SYSTEM_PROMPT, "test").await;
        assert!(matches!(result, Err(ExtractionError::MissingApiKey)));
    }

    #[test]
    fn prompt_embeds_context_and_invoice_text() {
        let prompt = build_extraction_prompt("Faktura 12345 fra Example AS", &sample_context());
        assert!(prompt.contains("AVAILABLE CATEGORIZATION RULES"));
        assert!(prompt.contains("- 6540: Inventory"));
        assert!(prompt.contains("Faktura 12345 fra Example AS"));
        assert!(prompt.contains("CRITICAL INSTRUCTIONS"));
        assert!(prompt.contains("\"KID_number\""));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = OpenAiClient::new(
            Some("key".to_string()),
            "gpt-4o".to_string(),
            "https://api.openai.com/v1/".to_string(),
        );
        assert_eq!(client.base_url, "https://api.openai.com/v1");
    }
}
