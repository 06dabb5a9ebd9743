use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackupKind {
    Daily,
    Manual,
    AccountDeletion,
}

impl std::fmt::Display for BackupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupKind::Daily => write!(f, "daily"),
            BackupKind::Manual => write!(f, "manual"),
            BackupKind::AccountDeletion => write!(f, "account_deletion"),
        }
    }
}

/// Contents of a backup's `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackupMetadata {
    pub id: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub kind: BackupKind,
    /// Bytes of the exported data files
    pub size: u64,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BackupStatsDto {
    pub total_backups: usize,
    /// Human readable, e.g. `1.5 MB`
    pub total_size: String,
    pub oldest_backup: Option<DateTime<Utc>>,
    pub newest_backup: Option<DateTime<Utc>>,
}

/// Request body for deleting the caller's account
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteAccountDto {
    /// Must repeat the account's email address
    #[validate(length(min = 1, message = "Email confirmation required"))]
    pub confirm_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountDeletionResultDto {
    pub backup: BackupMetadata,
    pub deleted_records: u64,
}
