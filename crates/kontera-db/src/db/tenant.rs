//! Tenant repository

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};

use kontera_core::models::Tenant;

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<Postgres, Tenant>(
            r#"
            SELECT id, slug, name, created_at
            FROM tenants
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find tenant by slug")?;
        Ok(tenant)
    }
}
