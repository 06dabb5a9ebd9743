use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{AccountDeletion, User};

const USER_COLUMNS: &str = r#"
    id, email, name, password_hash, is_verified,
    verification_token, reset_token, reset_token_expires,
    created_at, updated_at
"#;

/// Persistence for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn list_all(&self) -> Result<Vec<User>>;

    async fn count(&self) -> Result<i64>;

    /// Delete the user's activities and authored notes, unassign their tickets
    /// and delete the user. All-or-nothing.
    async fn delete_account(&self, id: Uuid) -> Result<AccountDeletion>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list users: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count users: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn delete_account(&self, id: Uuid) -> Result<AccountDeletion> {
        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        let activities_deleted = sqlx::query("DELETE FROM user_activities WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let notes_deleted = sqlx::query("DELETE FROM notes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let tickets_unassigned = sqlx::query(
            "UPDATE tickets SET assigned_user_id = NULL, updated_at = NOW() WHERE assigned_user_id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let users_deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit account deletion for {}: {:?}", id, e);
            AppError::Database(e)
        })?;

        Ok(AccountDeletion {
            activities_deleted,
            notes_deleted,
            tickets_unassigned,
            users_deleted,
        })
    }
}
