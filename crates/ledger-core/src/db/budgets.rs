//! PostgreSQL budget store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::BudgetStore;
use crate::types::{Budget, BudgetFields, UserId};
use crate::Result;

/// Repository for budgets. Every statement carries the owner predicate.
pub struct PgBudgetStore {
    pool: PgPool,
}

impl PgBudgetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BudgetStore for PgBudgetStore {
    async fn list_owned(&self, owner: UserId) -> Result<Vec<Budget>> {
        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, name, amount, category, period, user_id
            FROM budgets
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    async fn insert(&self, owner: UserId, fields: &BudgetFields) -> Result<Budget> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (name, amount, category, period, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, amount, category, period, user_id
            "#,
        )
        .bind(&fields.name)
        .bind(fields.amount)
        .bind(&fields.category)
        .bind(&fields.period)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        debug!(budget_id = budget.id, user_id = owner, "Inserted budget");
        Ok(budget)
    }

    async fn update_owned(&self, owner: UserId, id: i64, fields: &BudgetFields) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE budgets
            SET name = $1, amount = $2, category = $3, period = $4
            WHERE id = $5 AND user_id = $6
            "#,
        )
        .bind(&fields.name)
        .bind(fields.amount)
        .bind(&fields.category)
        .bind(&fields.period)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_owned(&self, owner: UserId, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
