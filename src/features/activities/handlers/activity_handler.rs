use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::core::error::Result;
use crate::features::activities::dtos::{ActivityQuery, ActivityResponseDto};
use crate::features::activities::services::ActivityService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::constants::DEFAULT_RECENT_ACTIVITY_LIMIT;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Recent activity across all users, or every entry of one type
#[utoipa::path(
    get,
    path = "/api/activities",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity entries", body = ApiResponse<Vec<ActivityResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn list_activities(
    _user: AuthenticatedUser,
    State(service): State<Arc<ActivityService>>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityResponseDto>>>> {
    match query.activity_type {
        Some(activity_type) => {
            let pagination = query.pagination();
            let page = service.list_by_type(activity_type, &pagination).await?;
            let meta = Meta::for_page(page.total, &pagination);
            Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
        }
        None => {
            let limit = query.limit.unwrap_or(DEFAULT_RECENT_ACTIVITY_LIMIT);
            let activities = service.recent(limit).await?;
            Ok(Json(ApiResponse::success(Some(activities), None, None)))
        }
    }
}

/// The caller's own activity history
#[utoipa::path(
    get,
    path = "/api/activities/me",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Caller's activity entries", body = ApiResponse<Vec<ActivityResponseDto>>),
    ),
    security(("bearer_auth" = [])),
    tag = "activities"
)]
pub async fn list_my_activities(
    user: AuthenticatedUser,
    State(service): State<Arc<ActivityService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityResponseDto>>>> {
    let page = service.list_for_user(user.user_id, &pagination).await?;
    let meta = Meta::for_page(page.total, &pagination);
    Ok(Json(ApiResponse::success(Some(page.items), None, Some(meta))))
}
