//! PostgreSQL charge store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::ChargeStore;
use crate::types::{Charge, ChargeFields, UserId};
use crate::Result;

/// Repository for charges. `created_at` is assigned by the database default
/// and is never part of an update.
pub struct PgChargeStore {
    pool: PgPool,
}

impl PgChargeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChargeStore for PgChargeStore {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Charge>> {
        let charges = sqlx::query_as::<_, Charge>(
            r#"
            SELECT id, name, amount, category, periodical, user_id, created_at
            FROM charges
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(charges)
    }

    async fn insert(&self, owner: UserId, fields: &ChargeFields) -> Result<Charge> {
        let charge = sqlx::query_as::<_, Charge>(
            r#"
            INSERT INTO charges (name, amount, category, periodical, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, amount, category, periodical, user_id, created_at
            "#,
        )
        .bind(&fields.name)
        .bind(fields.amount)
        .bind(&fields.category)
        .bind(&fields.periodical)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        debug!(charge_id = charge.id, user_id = owner, "Inserted charge");
        Ok(charge)
    }

    async fn update_owned(&self, owner: UserId, id: i64, fields: &ChargeFields) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE charges
            SET name = $1, amount = $2, category = $3, periodical = $4
            WHERE id = $5 AND user_id = $6
            "#,
        )
        .bind(&fields.name)
        .bind(fields.amount)
        .bind(&fields.category)
        .bind(&fields.periodical)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM charges WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
