//! Postgres-backed credential store.
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | `RowNotFound` | | `NotFound` |
//! | anything else | | `Unavailable` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use taskmanager_auth::{Identity, IdentityStore, PasswordHash, Role, StoreError};
use taskmanager_core::UserId;

const SELECT_COLUMNS: &str =
    "id, email, password_hash, display_name, role, active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: Arc<PgPool>,
}

impl PostgresIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Identity, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?
            .ok_or(StoreError::NotFound)?;
        identity_from_row(&row)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Identity, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?
            .ok_or(StoreError::NotFound)?;
        identity_from_row(&row)
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.id), err)]
    async fn create(&self, identity: &Identity) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, role, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(identity.id.as_uuid())
        .bind(&identity.email)
        .bind(identity.password_hash.as_str())
        .bind(&identity.display_name)
        .bind(identity.role.as_str())
        .bind(identity.active)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create", e))?;
        Ok(())
    }

    #[instrument(skip(self, email), err)]
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS present")
            .bind(email)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists_by_email", e))?;
        row.try_get("present")
            .map_err(|e| map_sqlx_error("exists_by_email", e))
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity, StoreError> {
    let decode = |e| map_sqlx_error("decode user row", e);

    let role: String = row.try_get("role").map_err(decode)?;
    let role: Role = role.parse().map_err(StoreError::unavailable)?;
    let password_hash: String = row.try_get("password_hash").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;
    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;

    Ok(Identity {
        id: UserId::from_uuid(id),
        email: row.try_get("email").map_err(decode)?,
        password_hash: PasswordHash::from_stored(password_hash),
        display_name: row.try_get("display_name").map_err(decode)?,
        role,
        active: row.try_get("active").map_err(decode)?,
        created_at,
        updated_at,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict(format!("{operation}: {}", db_err.message()))
        }
        other => {
            tracing::error!(operation, error = %other, "identity store query failed");
            StoreError::unavailable(other)
        }
    }
}
