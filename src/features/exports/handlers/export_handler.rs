use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::core::error::Result;
use crate::features::activities::models::Actor;
use crate::features::exports::dtos::{ExportFormat, ExportQuery, ExportStatsDto, FullExportDto};
use crate::features::exports::services::ExportService;
use crate::shared::types::ApiResponse;

fn attachment(prefix: &str, format: ExportFormat) -> String {
    format!(
        "attachment; filename=\"{}_export_{}.{}\"",
        prefix,
        Utc::now().format("%Y-%m-%d"),
        format.extension()
    )
}

fn download(prefix: &str, format: ExportFormat, content: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, attachment(prefix, format)),
        ],
        content,
    )
}

/// Export customers as CSV or JSON
#[utoipa::path(
    get,
    path = "/api/export/customers",
    params(ExportQuery),
    responses(
        (status = 200, description = "Customer export file", content_type = "text/csv", body = String),
    ),
    security(("bearer_auth" = [])),
    tag = "exports"
)]
pub async fn export_customers(
    actor: Actor,
    State(service): State<Arc<ExportService>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let options = query.into_options(ExportFormat::Csv);
    let content = service.export_customers(&options, &actor).await?;
    Ok(download("customers", options.format, content))
}

/// Export tickets as CSV or JSON
#[utoipa::path(
    get,
    path = "/api/export/tickets",
    params(ExportQuery),
    responses(
        (status = 200, description = "Ticket export file", content_type = "text/csv", body = String),
    ),
    security(("bearer_auth" = [])),
    tag = "exports"
)]
pub async fn export_tickets(
    actor: Actor,
    State(service): State<Arc<ExportService>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let options = query.into_options(ExportFormat::Csv);
    let content = service.export_tickets(&options, &actor).await?;
    Ok(download("tickets", options.format, content))
}

/// Export users as CSV or JSON
#[utoipa::path(
    get,
    path = "/api/export/users",
    params(ExportQuery),
    responses(
        (status = 200, description = "User export file", content_type = "text/csv", body = String),
    ),
    security(("bearer_auth" = [])),
    tag = "exports"
)]
pub async fn export_users(
    actor: Actor,
    State(service): State<Arc<ExportService>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let options = query.into_options(ExportFormat::Csv);
    let content = service.export_users(&options, &actor).await?;
    Ok(download("users", options.format, content))
}

/// Export every entity in one JSON document
#[utoipa::path(
    get,
    path = "/api/export/all",
    params(ExportQuery),
    responses(
        (status = 200, description = "Full export", body = FullExportDto),
        (status = 400, description = "CSV requested"),
    ),
    security(("bearer_auth" = [])),
    tag = "exports"
)]
pub async fn export_all(
    actor: Actor,
    State(service): State<Arc<ExportService>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse> {
    let options = query.into_options(ExportFormat::Json);
    let export = service.export_all(&options, &actor).await?;
    Ok((
        [(header::CONTENT_DISPOSITION, attachment("full", ExportFormat::Json))],
        Json(export),
    ))
}

/// Record counts and estimated export size
#[utoipa::path(
    get,
    path = "/api/export/stats",
    responses(
        (status = 200, description = "Export statistics", body = ApiResponse<ExportStatsDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "exports"
)]
pub async fn get_export_stats(
    State(service): State<Arc<ExportService>>,
) -> Result<Json<ApiResponse<ExportStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}
