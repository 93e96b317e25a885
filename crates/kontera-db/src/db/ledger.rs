//! Ledger repositories: VAT codes, chart of accounts, vouchers

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use kontera_core::models::{Account, CreateVoucherPayload, Posting, VatCode, Voucher};

#[derive(Clone)]
pub struct VatCodeRepository {
    pool: PgPool,
}

impl VatCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<VatCode>> {
        let codes = sqlx::query_as::<Postgres, VatCode>(
            r#"
            SELECT code, description, rate, vat_type
            FROM vat_codes
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list VAT codes")?;
        Ok(codes)
    }
}

#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Account>> {
        let accounts = sqlx::query_as::<Postgres, Account>(
            r#"
            SELECT number, name, description
            FROM accounts
            ORDER BY number ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;
        Ok(accounts)
    }
}

#[derive(Clone)]
pub struct VoucherRepository {
    pool: PgPool,
}

impl VoucherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a voucher and its postings in one transaction. The voucher
    /// number is the next free number within the tenant.
    pub async fn create_with_postings(
        &self,
        tenant_id: Uuid,
        payload: &CreateVoucherPayload,
    ) -> Result<(Voucher, Vec<Posting>)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let next_number = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COALESCE(MAX(number), 0) + 1
            FROM vouchers
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to allocate voucher number")?;

        let voucher = sqlx::query_as::<Postgres, Voucher>(
            r#"
            INSERT INTO vouchers (tenant_id, number, date, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, tenant_id, number, date, description, extraction_id, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(next_number)
        .bind(payload.date)
        .bind(&payload.description)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to create voucher")?;

        let mut postings = Vec::with_capacity(payload.postings.len());
        for posting in &payload.postings {
            let row = sqlx::query_as::<Postgres, Posting>(
                r#"
                INSERT INTO postings (
                    voucher_id, account_number, amount, currency,
                    posting_date, description, vat_code, row_number
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, voucher_id, account_number, amount, currency,
                    posting_date, description, vat_code, row_number
                "#,
            )
            .bind(voucher.id)
            .bind(&posting.account_number)
            .bind(posting.amount)
            .bind(&posting.currency)
            .bind(posting.posting_date)
            .bind(&posting.description)
            .bind(posting.vat_code.as_deref())
            .bind(posting.row_number)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to create posting")?;
            postings.push(row);
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok((voucher, postings))
    }

    pub async fn get(&self, tenant_id: Uuid, voucher_id: Uuid) -> Result<Option<Voucher>> {
        let voucher = sqlx::query_as::<Postgres, Voucher>(
            r#"
            SELECT id, tenant_id, number, date, description, extraction_id, created_at
            FROM vouchers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(voucher_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get voucher")?;
        Ok(voucher)
    }

    pub async fn get_postings(&self, voucher_id: Uuid) -> Result<Vec<Posting>> {
        let postings = sqlx::query_as::<Postgres, Posting>(
            r#"
            SELECT id, voucher_id, account_number, amount, currency,
                posting_date, description, vat_code, row_number
            FROM postings
            WHERE voucher_id = $1
            ORDER BY row_number ASC
            "#,
        )
        .bind(voucher_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to get postings")?;
        Ok(postings)
    }

    /// Store the originating extraction id on the voucher.
    pub async fn link_extraction(
        &self,
        voucher_id: Uuid,
        extraction_id: Uuid,
    ) -> Result<Option<Voucher>> {
        let voucher = sqlx::query_as::<Postgres, Voucher>(
            r#"
            UPDATE vouchers
            SET extraction_id = $2
            WHERE id = $1
            RETURNING id, tenant_id, number, date, description, extraction_id, created_at
            "#,
        )
        .bind(voucher_id)
        .bind(extraction_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to link voucher to extraction")?;
        Ok(voucher)
    }
}
