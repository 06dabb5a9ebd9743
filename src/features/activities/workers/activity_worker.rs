use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use crate::features::activities::models::NewActivity;
use crate::features::activities::repositories::ActivityRepository;

/// Background consumer writing queued audit entries to the repository
pub struct ActivityWorker {
    receiver: Receiver<NewActivity>,
    repository: Arc<dyn ActivityRepository>,
}

impl ActivityWorker {
    pub fn new(receiver: Receiver<NewActivity>, repository: Arc<dyn ActivityRepository>) -> Self {
        Self {
            receiver,
            repository,
        }
    }

    /// Drain the channel until every sender is dropped
    pub async fn run(mut self) {
        tracing::info!("Starting activity worker");

        while let Some(activity) = self.receiver.recv().await {
            let activity_type = activity.activity_type;
            let user_id = activity.user_id;

            if let Err(e) = self.repository.create(activity).await {
                tracing::error!(
                    "Failed to record {} activity for user {}: {:?}",
                    activity_type,
                    user_id,
                    e
                );
            }
        }

        tracing::info!("Activity worker stopped");
    }
}
