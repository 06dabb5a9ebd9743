use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::features::backups::handlers;
use crate::features::backups::services::BackupService;

/// Create routes for the backups feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<BackupService>) -> Router {
    Router::new()
        .route("/api/export/backup", post(handlers::create_backup))
        .route("/api/export/backups", get(handlers::list_backups))
        .route("/api/export/backup-stats", get(handlers::get_backup_stats))
        .route("/api/account", delete(handlers::delete_account))
        .with_state(service)
}
