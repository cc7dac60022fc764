//! PostgreSQL share store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::ShareStore;
use crate::types::{AccessLevel, Share, UserId};
use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
struct ShareRow {
    id: i64,
    user_id: i64,
    user_share_id: i64,
    access: String,
}

impl TryFrom<ShareRow> for Share {
    type Error = Error;

    fn try_from(row: ShareRow) -> Result<Self> {
        let access = row.access.parse::<AccessLevel>().map_err(|e| Error::Config {
            message: format!("share {} has unknown access level in store: {}", row.id, e),
        })?;
        Ok(Share {
            id: row.id,
            grantor_id: row.user_id,
            recipient_id: row.user_share_id,
            access,
        })
    }
}

/// Repository for shares. Reads and deletes are restricted to the two parties.
pub struct PgShareStore {
    pool: PgPool,
}

impl PgShareStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for PgShareStore {
    async fn list_involving(&self, user: UserId) -> Result<Vec<Share>> {
        let rows: Vec<ShareRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, user_share_id, access
            FROM shares
            WHERE user_id = $1 OR user_share_id = $1
            ORDER BY id
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Share::try_from).collect()
    }

    async fn insert(
        &self,
        grantor: UserId,
        recipient: UserId,
        access: AccessLevel,
    ) -> Result<Share> {
        let row: ShareRow = sqlx::query_as(
            r#"
            INSERT INTO shares (user_id, user_share_id, access)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, user_share_id, access
            "#,
        )
        .bind(grantor)
        .bind(recipient)
        .bind(access.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!(share_id = row.id, grantor, recipient, "Inserted share");
        row.try_into()
    }

    async fn delete_involving(&self, user: UserId, id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM shares
            WHERE id = $1
              AND (user_id = $2 OR user_share_id = $2)
            "#,
        )
        .bind(id)
        .bind(user)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
