//! Voucher creation service
//!
//! The service layer in front of the voucher repository. Every voucher is
//! checked for a non-empty, zero-sum posting set before anything is
//! written; the double-entry invariant is enforced here, not left to
//! callers.

use uuid::Uuid;

use kontera_core::models::{CreateVoucherPayload, Posting, Voucher};
use kontera_core::AppError;
use kontera_db::VoucherRepository;

#[derive(Clone)]
pub struct VoucherService {
    repository: VoucherRepository,
}

impl VoucherService {
    pub fn new(repository: VoucherRepository) -> Self {
        Self { repository }
    }

    pub async fn create_voucher(
        &self,
        tenant_id: Uuid,
        payload: &CreateVoucherPayload,
    ) -> Result<(Voucher, Vec<Posting>), AppError> {
        if payload.postings.is_empty() {
            return Err(AppError::Ledger(
                "Voucher must have at least one posting".to_string(),
            ));
        }
        if !payload.is_balanced() {
            return Err(AppError::Ledger(format!(
                "Voucher postings must sum to zero, got {}",
                payload.postings_total()
            )));
        }

        let (voucher, postings) = self
            .repository
            .create_with_postings(tenant_id, payload)
            .await?;

        tracing::info!(
            voucher_id = %voucher.id,
            voucher_number = voucher.number,
            tenant_id = %tenant_id,
            postings = postings.len(),
            "Voucher created"
        );

        Ok((voucher, postings))
    }

    pub async fn get_voucher(
        &self,
        tenant_id: Uuid,
        voucher_id: Uuid,
    ) -> Result<Option<(Voucher, Vec<Posting>)>, AppError> {
        let Some(voucher) = self.repository.get(tenant_id, voucher_id).await? else {
            return Ok(None);
        };
        let postings = self.repository.get_postings(voucher.id).await?;
        Ok(Some((voucher, postings)))
    }

    pub(crate) fn repository(&self) -> &VoucherRepository {
        &self.repository
    }
}
