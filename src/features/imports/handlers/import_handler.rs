use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::features::activities::models::Actor;
use crate::features::imports::dtos::{ImportResultDto, ImportUploadDto};
use crate::features::imports::services::ImportService;
use crate::shared::constants::MAX_IMPORT_FILE_SIZE;
use crate::shared::types::ApiResponse;

const CSV_CONTENT_TYPES: [&str; 2] = ["text/csv", "application/csv"];

fn is_csv_upload(file_name: &str, content_type: &str) -> bool {
    file_name.to_lowercase().ends_with(".csv")
        || CSV_CONTENT_TYPES
            .iter()
            .any(|ct| content_type.eq_ignore_ascii_case(ct))
}

/// Import customers from a CSV file
///
/// Accepts multipart/form-data with a `file` field. Columns are matched to
/// customer fields by header name; rows are validated and created one by one.
#[utoipa::path(
    post,
    path = "/api/customers/import",
    tag = "imports",
    request_body(
        content = ImportUploadDto,
        content_type = "multipart/form-data",
        description = "CSV file with a header row",
    ),
    responses(
        (status = 200, description = "Import finished; see counts and errors", body = ApiResponse<ImportResultDto>),
        (status = 400, description = "Missing, oversized or non-CSV file"),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn import_customers(
    actor: Actor,
    State(service): State<Arc<ImportService>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResultDto>>, AppError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();
        if field_name != "file" {
            debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = field.bytes().await.map_err(|e| {
            debug!("Failed to read file bytes: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        upload = Some((file_name, content_type, data.to_vec()));
    }

    let (file_name, content_type, data) =
        upload.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;

    if data.len() > MAX_IMPORT_FILE_SIZE {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} MB",
            MAX_IMPORT_FILE_SIZE / 1024 / 1024
        )));
    }

    if !is_csv_upload(&file_name, &content_type) {
        return Err(AppError::BadRequest(
            "Only CSV files are allowed".to_string(),
        ));
    }

    let result = service.import_customers(&data, &actor).await;
    let message = format!(
        "Import completed: {} imported, {} failed",
        result.imported, result.failed
    );

    Ok(Json(ApiResponse::success(Some(result), Some(message), None)))
}

/// Download an example CSV file
#[utoipa::path(
    get,
    path = "/api/customers/sample-csv",
    tag = "imports",
    responses(
        (status = 200, description = "Sample CSV", content_type = "text/csv", body = String),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_sample_csv(
    State(service): State<Arc<ImportService>>,
) -> Result<impl IntoResponse, AppError> {
    let csv = service.sample_csv()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"customer-import-sample.csv\"",
            ),
        ],
        csv,
    ))
}
