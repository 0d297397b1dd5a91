//! Authentication token repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::AuthToken;

/// Token repository trait
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Return the user's token, creating one with the supplied key if the
    /// user has none. Concurrent callers observe the same token.
    async fn get_or_create(&self, user_id: i64, key: &str) -> Result<AuthToken>;

    /// Look up a token by its key
    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>>;
}

/// SQLx-based token repository
pub struct SqlxTokenRepository {
    pool: SqlitePool,
}

impl SqlxTokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn TokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TokenRepository for SqlxTokenRepository {
    async fn get_or_create(&self, user_id: i64, key: &str) -> Result<AuthToken> {
        // The UNIQUE(user_id) constraint makes the insert a no-op when a
        // token already exists, so the following select always sees one
        // winner regardless of interleaving.
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to insert token")?;

        let row = sqlx::query(
            "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to load token after insert")?;

        row_to_token(&row)
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<AuthToken>> {
        let row = sqlx::query("SELECT key, user_id, created_at FROM auth_tokens WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get token by key")?;

        match row {
            Some(row) => Ok(Some(row_to_token(&row)?)),
            None => Ok(None),
        }
    }
}

fn row_to_token(row: &sqlx::sqlite::SqliteRow) -> Result<AuthToken> {
    Ok(AuthToken {
        key: row.get("key"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    })
}
