use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

use crate::features::activities::models::NewActivity;

/// Fire-and-forget handle for recording audit entries.
///
/// Entries go onto a bounded channel drained by [`ActivityWorker`]. Recording
/// never blocks the caller and never fails it: when the channel is full or the
/// worker is gone the entry is dropped with a warning.
///
/// [`ActivityWorker`]: crate::features::activities::workers::ActivityWorker
#[derive(Clone)]
pub struct ActivityLogger {
    sender: Sender<NewActivity>,
}

impl ActivityLogger {
    /// Create a logger and the receiving end for the worker
    pub fn channel(capacity: usize) -> (Self, Receiver<NewActivity>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn record(&self, activity: NewActivity) {
        match self.sender.try_send(activity) {
            Ok(()) => {}
            Err(TrySendError::Full(activity)) => {
                tracing::warn!(
                    "Activity channel full, dropping {} for user {}",
                    activity.activity_type,
                    activity.user_id
                );
            }
            Err(TrySendError::Closed(activity)) => {
                tracing::warn!(
                    "Activity worker stopped, dropping {} for user {}",
                    activity.activity_type,
                    activity.user_id
                );
            }
        }
    }
}
