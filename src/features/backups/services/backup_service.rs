use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::backups::dtos::{
    AccountDeletionResultDto, BackupKind, BackupMetadata, BackupStatsDto,
};
use crate::features::exports::dtos::{ExportFormat, ExportOptions};
use crate::features::exports::ExportService;
use crate::features::users::UserRepository;
use crate::shared::format::format_bytes;
use crate::shared::types::days_before;

const METADATA_FILE: &str = "metadata.json";

/// File-system snapshots of the CRM data, one directory per backup
pub struct BackupService {
    exports: Arc<ExportService>,
    users: Arc<dyn UserRepository>,
    backup_dir: PathBuf,
}

impl BackupService {
    pub fn new(
        exports: Arc<ExportService>,
        users: Arc<dyn UserRepository>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            exports,
            users,
            backup_dir: backup_dir.into(),
        }
    }

    /// Write `customers.json`, `tickets.json`, `users.json` and the metadata
    /// file into a new directory under the backup root
    pub async fn create_backup(&self, kind: BackupKind, user_id: Option<Uuid>) -> Result<BackupMetadata> {
        let id = backup_id(kind, user_id);
        let path = self.backup_dir.join(&id);

        fs::create_dir_all(&path)
            .await
            .map_err(|e| io_error(&format!("create backup directory {}", path.display()), e))?;

        let data = self
            .exports
            .collect_all(&ExportOptions {
                format: ExportFormat::Json,
                include_notes: true,
                range: None,
            })
            .await?;

        let mut size = 0u64;
        size += write_json(&path, "customers.json", &data.customers).await?;
        size += write_json(&path, "tickets.json", &data.tickets).await?;
        size += write_json(&path, "users.json", &data.users).await?;

        let metadata = BackupMetadata {
            id,
            user_id,
            created_at: Utc::now(),
            kind,
            size,
            files: ["customers.json", "tickets.json", "users.json", METADATA_FILE]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        };
        write_json(&path, METADATA_FILE, &metadata).await?;

        tracing::info!("Backup created: {} ({})", metadata.id, format_bytes(size));
        Ok(metadata)
    }

    /// Every readable backup, newest first. Directories without valid
    /// metadata are skipped.
    pub async fn list_backups(&self) -> Result<Vec<BackupMetadata>> {
        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("read backup directory", e)),
        };

        let mut backups = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("read backup directory", e))?
        {
            let metadata_path = entry.path().join(METADATA_FILE);
            match read_metadata(&metadata_path).await {
                Ok(metadata) => backups.push(metadata),
                Err(e) => tracing::warn!(
                    "Could not read backup metadata for {}: {}",
                    entry.file_name().to_string_lossy(),
                    e
                ),
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Remove backups created more than `retention_days` ago. Returns how many
    /// were removed; a backup that cannot be removed is logged and kept.
    pub async fn delete_old_backups(&self, retention_days: i64) -> Result<usize> {
        let Some(cutoff) = days_before(Utc::now(), retention_days) else {
            tracing::warn!(
                "Backup retention of {} days is out of range, keeping all backups",
                retention_days
            );
            return Ok(0);
        };
        let mut deleted = 0;

        for backup in self.list_backups().await? {
            if backup.created_at >= cutoff {
                continue;
            }

            let path = self.backup_dir.join(&backup.id);
            match fs::remove_dir_all(&path).await {
                Ok(()) => {
                    tracing::info!("Deleted old backup: {}", backup.id);
                    deleted += 1;
                }
                Err(e) => tracing::error!("Failed to delete backup {}: {:?}", backup.id, e),
            }
        }

        Ok(deleted)
    }

    pub async fn stats(&self) -> Result<BackupStatsDto> {
        let backups = self.list_backups().await?;
        let total_size: u64 = backups.iter().map(|b| b.size).sum();

        Ok(BackupStatsDto {
            total_backups: backups.len(),
            total_size: format_bytes(total_size),
            oldest_backup: backups.last().map(|b| b.created_at),
            newest_backup: backups.first().map(|b| b.created_at),
        })
    }

    /// Back up everything, then delete the account and its personal records
    /// in one transaction. Nothing is deleted when the backup fails.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<AccountDeletionResultDto> {
        let backup = self
            .create_backup(BackupKind::AccountDeletion, Some(user_id))
            .await?;

        let deletion = self.users.delete_account(user_id).await?;
        tracing::info!(
            "User account {} deleted, {} records affected",
            user_id,
            deletion.total()
        );

        Ok(AccountDeletionResultDto {
            backup,
            deleted_records: deletion.total(),
        })
    }

    /// `delete_account` for the caller, who must repeat their email address
    pub async fn delete_own_account(
        &self,
        user_id: Uuid,
        confirm_email: &str,
    ) -> Result<AccountDeletionResultDto> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", user_id)))?;

        if !user.email.eq_ignore_ascii_case(confirm_email.trim()) {
            return Err(AppError::BadRequest(
                "Email confirmation does not match".to_string(),
            ));
        }

        self.delete_account(user_id).await
    }
}

fn backup_id(kind: BackupKind, user_id: Option<Uuid>) -> String {
    let suffix = Uuid::now_v7().simple();
    match (kind, user_id) {
        (BackupKind::Daily, _) => format!("daily_{}_{}", Utc::now().format("%Y-%m-%d"), suffix),
        (BackupKind::AccountDeletion, Some(user_id)) => {
            format!("account_deletion_{}_{}", user_id.simple(), suffix)
        }
        (kind, _) => format!("{}_{}", kind, suffix),
    }
}

async fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<u64> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", file, e)))?;

    let path = dir.join(file);
    fs::write(&path, &content)
        .await
        .map_err(|e| io_error(&format!("write {}", path.display()), e))?;

    Ok(content.len() as u64)
}

async fn read_metadata(path: &Path) -> std::result::Result<BackupMetadata, String> {
    let content = fs::read_to_string(path).await.map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

fn io_error(action: &str, e: std::io::Error) -> AppError {
    tracing::error!("Backup I/O failure ({}): {:?}", action, e);
    AppError::Internal(format!("Failed to {}: {}", action, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::features::activities::models::{ActivityType, NewActivity};
    use crate::features::activities::services::ActivityLogger;
    use crate::features::notes::models::{NewNote, NoteTarget};
    use crate::shared::test_helpers::InMemoryStore;
    use tempfile::tempdir;

    fn service(store: &Arc<InMemoryStore>, dir: &Path) -> BackupService {
        let (logger, _rx) = ActivityLogger::channel(4);
        let exports = Arc::new(ExportService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            logger,
        ));
        BackupService::new(exports, store.clone(), dir)
    }

    #[tokio::test]
    async fn test_create_backup_writes_files_and_metadata() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        store.add_user("Ana", "ana@example.com", true);
        store.add_customer("Acme", None).await;
        let service = service(&store, dir.path());

        let backup = service.create_backup(BackupKind::Manual, None).await.unwrap();

        assert!(backup.id.starts_with("manual_"));
        let backup_path = dir.path().join(&backup.id);
        for file in &backup.files {
            assert!(backup_path.join(file).exists(), "missing {}", file);
        }

        let customers = std::fs::read_to_string(backup_path.join("customers.json")).unwrap();
        let tickets = std::fs::read_to_string(backup_path.join("tickets.json")).unwrap();
        let users = std::fs::read_to_string(backup_path.join("users.json")).unwrap();
        assert_eq!(
            backup.size,
            (customers.len() + tickets.len() + users.len()) as u64
        );
        assert!(customers.contains("Acme"));
        assert!(!users.contains("password_hash"));
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_and_sorts_newest_first() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let service = service(&store, dir.path());

        let first = service.create_backup(BackupKind::Daily, None).await.unwrap();
        let second = service.create_backup(BackupKind::Manual, None).await.unwrap();
        std::fs::create_dir(dir.path().join("junk")).unwrap();
        std::fs::write(dir.path().join("junk").join(METADATA_FILE), "not json").unwrap();

        let backups = service.list_backups().await.unwrap();

        let ids: Vec<&str> = backups.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_list_without_backup_directory() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let service = service(&store, &dir.path().join("missing"));

        assert!(service.list_backups().await.unwrap().is_empty());
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_backups, 0);
        assert_eq!(stats.total_size, "0 Bytes");
        assert!(stats.newest_backup.is_none());
    }

    #[tokio::test]
    async fn test_delete_old_backups_respects_retention() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let service = service(&store, dir.path());

        let mut old = service.create_backup(BackupKind::Daily, None).await.unwrap();
        old.created_at = Utc::now() - Duration::days(45);
        write_json(&dir.path().join(&old.id), METADATA_FILE, &old)
            .await
            .unwrap();
        let recent = service.create_backup(BackupKind::Daily, None).await.unwrap();

        let deleted = service.delete_old_backups(30).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(!dir.path().join(&old.id).exists());
        assert!(dir.path().join(&recent.id).exists());
    }

    #[tokio::test]
    async fn test_delete_old_backups_with_huge_retention_keeps_everything() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let service = service(&store, dir.path());

        let mut old = service.create_backup(BackupKind::Daily, None).await.unwrap();
        old.created_at = Utc::now() - Duration::days(3650);
        write_json(&dir.path().join(&old.id), METADATA_FILE, &old)
            .await
            .unwrap();

        assert_eq!(service.delete_old_backups(i64::MAX).await.unwrap(), 0);
        assert!(dir.path().join(&old.id).exists());
    }

    #[tokio::test]
    async fn test_delete_account_backs_up_then_removes_personal_records() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let user = store.add_user("Ana", "ana@example.com", true);
        let customer = store.add_customer("Acme", None).await;
        let mut ticket = store.add_ticket(customer.id, "Broken").await;
        ticket.assigned_user_id = Some(user.id);
        store.put_ticket(ticket.clone()).await;
        store
            .create_note(NewNote {
                content: "Looked into it".to_string(),
                target: NoteTarget::Ticket(ticket.id),
                user_id: user.id,
            })
            .await;
        store
            .insert_activity_at(
                NewActivity::new(user.id, ActivityType::Login, "in"),
                Utc::now(),
            )
            .await;
        let service = service(&store, dir.path());

        let result = service
            .delete_own_account(user.id, " ANA@example.com ")
            .await
            .unwrap();

        // one activity, one note, one unassigned ticket, the user
        assert_eq!(result.deleted_records, 4);
        assert_eq!(result.backup.kind, BackupKind::AccountDeletion);
        assert_eq!(result.backup.user_id, Some(user.id));
        let users_backup = std::fs::read_to_string(
            dir.path().join(&result.backup.id).join("users.json"),
        )
        .unwrap();
        assert!(users_backup.contains("ana@example.com"));

        assert!(store.activities().await.is_empty());
        let remaining = crate::features::tickets::TicketRepository::find_by_id(
            store.as_ref(),
            ticket.id,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(remaining.assigned_user_id, None);
        assert!(crate::features::users::UserRepository::find_by_id(store.as_ref(), user.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_account_requires_matching_email() {
        let dir = tempdir().unwrap();
        let store = InMemoryStore::new();
        let user = store.add_user("Ana", "ana@example.com", true);
        let service = service(&store, dir.path());

        let result = service.delete_own_account(user.id, "someone@else.com").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(service.list_backups().await.unwrap().is_empty());
    }
}
