use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::features::activities::models::{ActivityType, UserActivity};
use crate::shared::types::{default_page, default_page_size, PaginationQuery};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserActivity> for ActivityResponseDto {
    fn from(a: UserActivity) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            activity_type: a.activity_type,
            description: a.description,
            metadata: a.metadata,
            ip_address: a.ip_address,
            user_agent: a.user_agent,
            created_at: a.created_at,
        }
    }
}

/// Query for `GET /api/activities`
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Restrict to one activity type (paginated); otherwise the recent feed
    pub activity_type: Option<ActivityType>,
    /// Size of the recent feed (default: 20)
    pub limit: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

impl ActivityQuery {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page, self.page_size)
    }
}
