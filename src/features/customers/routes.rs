use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::customers::handlers;
use crate::features::customers::services::CustomerService;

/// Create routes for the customers feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<CustomerService>) -> Router {
    Router::new()
        .route(
            "/api/customers",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route("/api/customers/search", get(handlers::search_customers))
        .route("/api/customers/stats", get(handlers::get_customer_stats))
        .route(
            "/api/customers/{id}",
            get(handlers::get_customer)
                .put(handlers::update_customer)
                .delete(handlers::delete_customer),
        )
        .with_state(service)
}
