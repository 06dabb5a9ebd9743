use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::backups::dtos::{
    AccountDeletionResultDto, BackupKind, BackupMetadata, BackupStatsDto, DeleteAccountDto,
};
use crate::features::backups::services::BackupService;
use crate::shared::types::ApiResponse;

/// Create a manual backup
#[utoipa::path(
    post,
    path = "/api/export/backup",
    responses(
        (status = 200, description = "Backup created", body = ApiResponse<BackupMetadata>),
    ),
    security(("bearer_auth" = [])),
    tag = "backups"
)]
pub async fn create_backup(
    user: AuthenticatedUser,
    State(service): State<Arc<BackupService>>,
) -> Result<Json<ApiResponse<BackupMetadata>>> {
    let backup = service
        .create_backup(BackupKind::Manual, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(
        Some(backup),
        Some("Backup created successfully".to_string()),
        None,
    )))
}

/// List backups, newest first
#[utoipa::path(
    get,
    path = "/api/export/backups",
    responses(
        (status = 200, description = "Backups", body = ApiResponse<Vec<BackupMetadata>>),
    ),
    security(("bearer_auth" = [])),
    tag = "backups"
)]
pub async fn list_backups(
    State(service): State<Arc<BackupService>>,
) -> Result<Json<ApiResponse<Vec<BackupMetadata>>>> {
    let backups = service.list_backups().await?;
    Ok(Json(ApiResponse::success(Some(backups), None, None)))
}

#[utoipa::path(
    get,
    path = "/api/export/backup-stats",
    responses(
        (status = 200, description = "Backup statistics", body = ApiResponse<BackupStatsDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "backups"
)]
pub async fn get_backup_stats(
    State(service): State<Arc<BackupService>>,
) -> Result<Json<ApiResponse<BackupStatsDto>>> {
    let stats = service.stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

/// Delete the caller's account after backing up all data
#[utoipa::path(
    delete,
    path = "/api/account",
    request_body = DeleteAccountDto,
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<AccountDeletionResultDto>),
        (status = 400, description = "Confirmation missing or wrong"),
    ),
    security(("bearer_auth" = [])),
    tag = "backups"
)]
pub async fn delete_account(
    user: AuthenticatedUser,
    State(service): State<Arc<BackupService>>,
    AppJson(dto): AppJson<DeleteAccountDto>,
) -> Result<Json<ApiResponse<AccountDeletionResultDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let result = service
        .delete_own_account(user.user_id, &dto.confirm_email)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(result),
        Some("Account deleted successfully. Backup has been created.".to_string()),
        None,
    )))
}
