use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::imports::handlers;
use crate::features::imports::services::ImportService;
use crate::shared::constants::MAX_IMPORT_FILE_SIZE;

/// Create routes for the imports feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<ImportService>) -> Router {
    Router::new()
        .route(
            "/api/customers/import",
            // multipart framing on top of the file itself
            post(handlers::import_customers)
                .layer(DefaultBodyLimit::max(MAX_IMPORT_FILE_SIZE + 1024 * 1024)),
        )
        .route("/api/customers/sample-csv", get(handlers::download_sample_csv))
        .with_state(service)
}
