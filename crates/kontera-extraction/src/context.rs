//! Categorization context
//!
//! A point-in-time snapshot of the ledger's valid VAT codes and cost
//! accounts, passed explicitly into the prompt builder and the validator.
//! The model cannot be trusted to invent valid codes, so the option lists
//! are embedded in the prompt and re-checked on the way out.

use kontera_core::models::{Account, VatCode};

/// Cost accounts are the 4XXX (cost of goods) and 6XXX-7XXX (operating
/// expenses) series.
pub const COST_ACCOUNT_PREFIXES: [char; 3] = ['4', '6', '7'];

pub fn is_cost_account(number: &str) -> bool {
    number
        .chars()
        .next()
        .is_some_and(|first| COST_ACCOUNT_PREFIXES.contains(&first))
}

#[derive(Debug, Clone)]
pub struct CategorizationContext {
    vat_codes: Vec<VatCode>,
    cost_accounts: Vec<Account>,
}

impl CategorizationContext {
    /// Build from the current ledger rows. Accounts outside the cost
    /// prefixes are dropped; both lists are ordered for stable prompts.
    pub fn new(mut vat_codes: Vec<VatCode>, accounts: Vec<Account>) -> Self {
        vat_codes.sort_by(|a, b| a.code.cmp(&b.code));
        let mut cost_accounts: Vec<Account> = accounts
            .into_iter()
            .filter(|account| is_cost_account(&account.number))
            .collect();
        cost_accounts.sort_by(|a, b| a.number.cmp(&b.number));
        Self {
            vat_codes,
            cost_accounts,
        }
    }

    pub fn vat_codes(&self) -> &[VatCode] {
        &self.vat_codes
    }

    pub fn cost_accounts(&self) -> &[Account] {
        &self.cost_accounts
    }

    pub fn vat_code_exists(&self, code: &str) -> bool {
        self.vat_codes.iter().any(|vat| vat.code == code)
    }

    pub fn is_known_cost_account(&self, number: &str) -> bool {
        is_cost_account(number) && self.cost_accounts.iter().any(|a| a.number == number)
    }

    /// Render the option lists for the extraction prompt.
    pub fn prompt_section(&self) -> String {
        let vat_codes_context = self
            .vat_codes
            .iter()
            .map(|vat| {
                format!(
                    "- Code: {}, Description: {}, Rate: {}%, Type: {}",
                    vat.code, vat.description, vat.rate, vat.vat_type
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let cost_accounts_context = self
            .cost_accounts
            .iter()
            .map(|account| {
                format!(
                    "- {}: {} ({})",
                    account.number,
                    account.name,
                    account.description.as_deref().unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "AVAILABLE CATEGORIZATION RULES:\n\n\
             VAT CODES (for vat_code field):\n{vat_codes_context}\n\n\
             COST ACCOUNTS (for debit_prediction.account field):\n{cost_accounts_context}\n\n\
             IMPORTANT RULES:\n\
             1. For vat_code: Use only the exact codes from the VAT codes list above\n\
             2. For debit_prediction.account: Use only account numbers from the cost accounts list above (4XXX, 6XXX, 7XXX series)\n\
             3. If no exact match is found, use the most appropriate code/account based on the invoice content\n\
             4. For Norwegian invoices, VAT rate 25% typically uses code \"1\", 12% uses code \"13\", 0% uses code \"0\""
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vat(code: &str, rate: &str) -> VatCode {
        VatCode {
            code: code.to_string(),
            description: format!("VAT {rate}%"),
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
            vec![vat("1", "25"), vat("0", "0"), vat("13", "12")],
            vec![
                account("6790", "Other External Services"),
                account("2400", "Accounts Payable"),
                account("6540", "Inventory"),
                account("7100", "Travel Costs"),
                account("1920", "Bank Deposits"),
            ],
        )
    }

    #[test]
    fn non_cost_accounts_are_filtered_out() {
        let context = sample_context();
        let numbers: Vec<&str> = context
            .cost_accounts()
            .iter()
            .map(|a| a.number.as_str())
            .collect();
        assert_eq!(numbers, vec!["6540", "6790", "7100"]);
    }

    #[test]
    fn vat_code_lookup() {
        let context = sample_context();
        assert!(context.vat_code_exists("1"));
        assert!(context.vat_code_exists("13"));
        assert!(!context.vat_code_exists("X"));
    }

    #[test]
    fn known_cost_account_requires_prefix_and_membership() {
        let context = sample_context();
        assert!(context.is_known_cost_account("6540"));
        // 2400 exists in the chart but is not a cost account
        assert!(!context.is_known_cost_account("2400"));
        // 6999 has a cost prefix but is not in the chart
        assert!(!context.is_known_cost_account("6999"));
    }

    #[test]
    fn is_cost_account_checks_prefix_only() {
        assert!(is_cost_account("4000"));
        assert!(is_cost_account("6999"));
        assert!(is_cost_account("7500"));
        assert!(!is_cost_account("2400"));
        assert!(!is_cost_account(""));
    }

    #[test]
    fn prompt_section_lists_codes_and_accounts() {
        let section = sample_context().prompt_section();
        assert!(section.contains("Code: 1, Description: VAT 25%"));
        assert!(section.contains("- 6540: Inventory"));
        assert!(!section.contains("2400"));
        assert!(section.contains("AVAILABLE CATEGORIZATION RULES"));
    }
}
