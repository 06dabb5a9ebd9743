use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::activities::handlers;
use crate::features::activities::services::ActivityService;

/// Create routes for the activity log
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<ActivityService>) -> Router {
    Router::new()
        .route("/api/activities", get(handlers::list_activities))
        .route("/api/activities/me", get(handlers::list_my_activities))
        .with_state(service)
}
