// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use sqlx::Row;
use sqlx::SqlitePool;
use tracing::debug;
use yutify_domain::{AccessToken, Catalog};

use crate::stores::CredentialStore;

/// SQLx-backed credential store, one `catalog_tokens` row per catalog.
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn get(&self, catalog: Catalog) -> Result<Option<AccessToken>> {
        debug!(target: "infrastructure", %catalog, "loading catalog token");
        let row = sqlx::query(
            "SELECT access_token, refresh_token, expires_in, requested_at FROM catalog_tokens WHERE catalog = ? LIMIT 1",
        )
        .bind(catalog.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(AccessToken {
            access_token: row.try_get("access_token")?,
            refresh_token: row.try_get("refresh_token")?,
            expires_in: row.try_get("expires_in")?,
            requested_at: row.try_get("requested_at")?,
        }))
    }

    async fn put(&self, catalog: Catalog, token: &AccessToken) -> Result<()> {
        debug!(target: "infrastructure", %catalog, "saving catalog token");
        let q = r#"
            INSERT INTO catalog_tokens (catalog, access_token, refresh_token, expires_in, requested_at, updated_at)
            VALUES (?, ?, ?, ?, ?, datetime('now'))
            ON CONFLICT(catalog) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_in = excluded.expires_in,
                requested_at = excluded.requested_at,
                updated_at = excluded.updated_at
        "#;

        sqlx::query(q)
            .bind(catalog.as_str())
            .bind(token.access_token.clone())
            .bind(token.refresh_token.clone())
            .bind(token.expires_in)
            .bind(token.requested_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
