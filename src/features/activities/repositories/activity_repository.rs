use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, NewActivity, UserActivity};
use crate::shared::types::{Page, PaginationQuery};

const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_type, description, metadata, ip_address, user_agent, created_at";

/// Append-only store for audit entries
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn create(&self, activity: NewActivity) -> Result<UserActivity>;

    /// A user's entries, newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>>;

    /// Entries of one kind across all users, newest first
    async fn list_by_type(
        &self,
        activity_type: ActivityType,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>>;

    async fn recent(&self, limit: i64) -> Result<Vec<UserActivity>>;

    /// Returns the number of deleted entries
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn create(&self, activity: NewActivity) -> Result<UserActivity> {
        let sql = format!(
            r#"
            INSERT INTO user_activities
                (user_id, activity_type, description, metadata, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        );

        sqlx::query_as::<_, UserActivity>(&sql)
            .bind(activity.user_id)
            .bind(activity.activity_type)
            .bind(&activity.description)
            .bind(&activity.metadata)
            .bind(&activity.ip_address)
            .bind(&activity.user_agent)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert activity: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_activities WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count activities for user: {:?}", e);
                    AppError::Database(e)
                })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM user_activities
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            ACTIVITY_COLUMNS
        );

        let items = sqlx::query_as::<_, UserActivity>(&sql)
            .bind(user_id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list activities for user: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(Page { items, total })
    }

    async fn list_by_type(
        &self,
        activity_type: ActivityType,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_activities WHERE activity_type = $1")
                .bind(activity_type)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count activities by type: {:?}", e);
                    AppError::Database(e)
                })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM user_activities
            WHERE activity_type = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            ACTIVITY_COLUMNS
        );

        let items = sqlx::query_as::<_, UserActivity>(&sql)
            .bind(activity_type)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list activities by type: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(Page { items, total })
    }

    async fn recent(&self, limit: i64) -> Result<Vec<UserActivity>> {
        let sql = format!(
            "SELECT {} FROM user_activities ORDER BY created_at DESC LIMIT $1",
            ACTIVITY_COLUMNS
        );
        sqlx::query_as::<_, UserActivity>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list recent activities: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_activities WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clean up activities: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(result.rows_affected())
    }
}
