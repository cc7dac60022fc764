//! PostgreSQL user store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::UserStore;
use crate::types::{Role, StoredUser, UserChanges, UserId, UserIdentity};
use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    role: String,
}

impl UserRow {
    fn into_identity(self) -> Result<UserIdentity> {
        let role = self.role.parse::<Role>().map_err(|e| Error::Config {
            message: format!("user {} has unknown role in store: {}", self.id, e),
        })?;
        Ok(UserIdentity {
            id: self.id,
            username: self.username,
            role,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: i64,
    username: String,
    role: String,
    password_hash: String,
}

/// Repository for user accounts.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredUser>> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r#"
            SELECT id, username, role, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<StoredUser> {
            let identity = UserRow {
                id: r.id,
                username: r.username,
                role: r.role,
            }
            .into_identity()?;
            Ok(StoredUser {
                identity,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserIdentity>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(UserRow::into_identity).transpose()
    }

    async fn list(&self) -> Result<Vec<UserIdentity>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, username, role FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(UserRow::into_identity).collect()
    }

    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<UserIdentity> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, role
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = row.id, role = %role, "Inserted user");
        row.into_identity()
    }

    async fn insert_first_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<UserIdentity>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, role)
            SELECT $1, $2, 'admin'
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE role = 'admin')
            ON CONFLICT (username) DO NOTHING
            RETURNING id, username, role
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref r) = row {
            info!(user_id = r.id, "Inserted bootstrap admin");
        }
        row.map(UserRow::into_identity).transpose()
    }

    async fn has_admin(&self) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $1,
                password_hash = COALESCE($2, password_hash),
                role = $3
            WHERE id = $4
            "#,
        )
        .bind(&changes.username)
        .bind(changes.password_hash.as_deref())
        .bind(changes.role.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: UserId) -> Result<u64> {
        // Budgets, charges and shares are removed by ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
