use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::tickets::handlers;
use crate::features::tickets::services::TicketService;

/// Create routes for the tickets feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<TicketService>) -> Router {
    Router::new()
        .route(
            "/api/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route("/api/tickets/stats", get(handlers::get_ticket_stats))
        .route("/api/tickets/by-stage", get(handlers::get_stage_counts))
        .route("/api/tickets/overdue", get(handlers::get_overdue_tickets))
        .route(
            "/api/tickets/{id}",
            get(handlers::get_ticket).put(handlers::update_ticket),
        )
        .route("/api/tickets/{id}/stage", patch(handlers::move_ticket_stage))
        .route("/api/tickets/{id}/assign", patch(handlers::assign_ticket))
        .route("/api/tickets/{id}/notes", post(handlers::add_ticket_note))
        .with_state(service)
}
