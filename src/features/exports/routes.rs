use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::exports::handlers;
use crate::features::exports::services::ExportService;

/// Create routes for the exports feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<ExportService>) -> Router {
    Router::new()
        .route("/api/export/customers", get(handlers::export_customers))
        .route("/api/export/tickets", get(handlers::export_tickets))
        .route("/api/export/users", get(handlers::export_users))
        .route("/api/export/all", get(handlers::export_all))
        .route("/api/export/stats", get(handlers::get_export_stats))
        .with_state(service)
}
