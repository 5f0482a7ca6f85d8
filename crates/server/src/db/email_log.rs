//! Postgres-backed dashboard email inbox.
//!
//! Alert emails are mirrored here so the dashboard can show what went
//! out without access to the operator's mailbox.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use stockwatch_core::EmailLogId;

use crate::db::{DbError, EmailLogStore};

/// An email to be recorded in the inbox.
#[derive(Debug, Clone)]
pub struct NewEmailRecord {
    pub subject: String,
    pub recipient: String,
    pub body_html: String,
}

/// A recorded email as served to the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EmailRecord {
    pub id: EmailLogId,
    pub subject: String,
    pub recipient: String,
    pub sent_at: DateTime<Utc>,
    pub body_html: String,
    pub read: bool,
}

#[derive(Debug, Clone)]
pub struct PgEmailLogStore {
    pool: PgPool,
    shop: String,
}

impl PgEmailLogStore {
    #[must_use]
    pub fn new(pool: PgPool, shop: String) -> Self {
        Self { pool, shop }
    }
}

#[async_trait]
impl EmailLogStore for PgEmailLogStore {
    async fn append(&self, email: &NewEmailRecord) -> Result<EmailLogId, DbError> {
        let (id,): (EmailLogId,) = sqlx::query_as(
            r"
            INSERT INTO email_log (shop, subject, recipient, body_html)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&self.shop)
        .bind(&email.subject)
        .bind(&email.recipient)
        .bind(&email.body_html)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list(&self) -> Result<Vec<EmailRecord>, DbError> {
        let rows = sqlx::query_as::<_, EmailRecord>(
            r"
            SELECT id, subject, recipient, sent_at, body_html, read
            FROM email_log
            WHERE shop = $1
            ORDER BY sent_at DESC, id DESC
            ",
        )
        .bind(&self.shop)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_read(&self, id: EmailLogId) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE email_log SET read = TRUE WHERE shop = $1 AND id = $2")
            .bind(&self.shop)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, ids: &[EmailLogId]) -> Result<u64, DbError> {
        let ids: Vec<i64> = ids.iter().copied().map(i64::from).collect();
        let result = sqlx::query("DELETE FROM email_log WHERE shop = $1 AND id = ANY($2)")
            .bind(&self.shop)
            .bind(&ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
