use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant};

use crate::features::activities::services::ActivityService;
use crate::features::backups::dtos::BackupKind;
use crate::features::backups::services::BackupService;

/// Periodic daily backup, backup retention and activity cleanup
pub struct MaintenanceWorker {
    backups: Arc<BackupService>,
    activities: Arc<ActivityService>,
    period: Duration,
    backup_retention_days: i64,
    activity_retention_days: i64,
}

/// What one maintenance pass did; `None` marks a failed step
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub backup_id: Option<String>,
    pub backups_deleted: Option<usize>,
    pub activities_deleted: Option<u64>,
}

impl MaintenanceWorker {
    pub fn new(
        backups: Arc<BackupService>,
        activities: Arc<ActivityService>,
        period: Duration,
        backup_retention_days: i64,
        activity_retention_days: i64,
    ) -> Self {
        Self {
            backups,
            activities,
            period,
            backup_retention_days,
            activity_retention_days,
        }
    }

    /// Run a pass every `period`, starting one period after startup
    pub async fn run(self) {
        tracing::info!(
            "Starting maintenance worker (every {}s)",
            self.period.as_secs()
        );

        let mut interval = interval_at(Instant::now() + self.period, self.period);

        loop {
            interval.tick().await;
            self.run_once().await;
        }
    }

    /// One maintenance pass. A failing step is logged and does not stop the
    /// following ones.
    pub async fn run_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match self.backups.create_backup(BackupKind::Daily, None).await {
            Ok(backup) => {
                tracing::info!("Daily backup completed: {}", backup.id);
                report.backup_id = Some(backup.id);
            }
            Err(e) => tracing::error!("Scheduled backup failed: {:?}", e),
        }

        match self
            .backups
            .delete_old_backups(self.backup_retention_days)
            .await
        {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::info!("Cleaned up {} old backups", deleted);
                }
                report.backups_deleted = Some(deleted);
            }
            Err(e) => tracing::error!("Backup retention failed: {:?}", e),
        }

        match self
            .activities
            .cleanup_older_than(self.activity_retention_days)
            .await
        {
            Ok(deleted) => {
                if deleted > 0 {
                    tracing::info!("Removed {} old activity entries", deleted);
                }
                report.activities_deleted = Some(deleted);
            }
            Err(e) => tracing::error!("Activity cleanup failed: {:?}", e),
        }

        report
    }
}
