use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::activities::dtos::ActivityResponseDto;
use crate::features::activities::models::ActivityType;
use crate::features::activities::repositories::ActivityRepository;
use crate::shared::types::{days_before, Page, PaginationQuery};

/// Read side of the audit log plus retention cleanup
pub struct ActivityService {
    repository: Arc<dyn ActivityRepository>,
}

impl ActivityService {
    pub fn new(repository: Arc<dyn ActivityRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Page<ActivityResponseDto>> {
        let page = self.repository.list_for_user(user_id, pagination).await?;
        Ok(page.map(ActivityResponseDto::from))
    }

    pub async fn list_by_type(
        &self,
        activity_type: ActivityType,
        pagination: &PaginationQuery,
    ) -> Result<Page<ActivityResponseDto>> {
        let page = self
            .repository
            .list_by_type(activity_type, pagination)
            .await?;
        Ok(page.map(ActivityResponseDto::from))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityResponseDto>> {
        let activities = self.repository.recent(limit.max(1)).await?;
        Ok(activities.into_iter().map(ActivityResponseDto::from).collect())
    }

    /// Delete entries older than `days` days
    pub async fn cleanup_older_than(&self, days: i64) -> Result<u64> {
        let Some(cutoff) = days_before(Utc::now(), days) else {
            tracing::warn!(
                "Activity retention of {} days is out of range, skipping cleanup",
                days
            );
            return Ok(0);
        };
        let deleted = self.repository.delete_older_than(cutoff).await?;

        if deleted > 0 {
            tracing::info!("Cleaned up {} activities older than {} days", deleted, days);
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::features::activities::models::NewActivity;
    use crate::shared::test_helpers::InMemoryStore;

    #[tokio::test]
    async fn test_cleanup_removes_only_old_entries() {
        let store = InMemoryStore::new();
        let user = store.add_user("Ana", "ana@example.com", true);

        store
            .insert_activity_at(
                NewActivity::new(user.id, ActivityType::Login, "old login"),
                Utc::now() - Duration::days(120),
            )
            .await;
        store
            .insert_activity_at(
                NewActivity::new(user.id, ActivityType::Login, "fresh login"),
                Utc::now(),
            )
            .await;

        let service = ActivityService::new(store.clone());
        assert_eq!(service.cleanup_older_than(90).await.unwrap(), 1);

        let remaining = service.recent(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].description.as_deref(), Some("fresh login"));
    }

    #[tokio::test]
    async fn test_cleanup_with_huge_retention_keeps_everything() {
        let store = InMemoryStore::new();
        let user = store.add_user("Ana", "ana@example.com", true);
        store
            .insert_activity_at(
                NewActivity::new(user.id, ActivityType::Login, "old login"),
                Utc::now() - Duration::days(3650),
            )
            .await;

        let service = ActivityService::new(store.clone());
        assert_eq!(service.cleanup_older_than(i64::MAX).await.unwrap(), 0);
        assert_eq!(service.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_user_is_scoped_and_newest_first() {
        let store = InMemoryStore::new();
        let ana = store.add_user("Ana", "ana@example.com", true);
        let ben = store.add_user("Ben", "ben@example.com", true);
        let now = Utc::now();

        store
            .insert_activity_at(
                NewActivity::new(ana.id, ActivityType::CreateCustomer, "first"),
                now - Duration::minutes(5),
            )
            .await;
        store
            .insert_activity_at(
                NewActivity::new(ana.id, ActivityType::AddNote, "second"),
                now,
            )
            .await;
        store
            .insert_activity_at(NewActivity::new(ben.id, ActivityType::Login, "ben"), now)
            .await;

        let service = ActivityService::new(store.clone());
        let page = service
            .list_for_user(ana.id, &PaginationQuery::default())
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].description.as_deref(), Some("second"));
        assert_eq!(page.items[1].activity_type, ActivityType::CreateCustomer);
    }
}
