use uuid::Uuid;

use super::activity::{ActivityType, NewActivity};

/// The authenticated caller of a mutating operation, plus the client details
/// recorded alongside its audit entries
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: Uuid,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            ip_address: None,
            user_agent: None,
        }
    }

    /// Start an audit entry attributed to this actor
    pub fn activity(&self, activity_type: ActivityType, description: impl Into<String>) -> NewActivity {
        NewActivity::new(self.user_id, activity_type, description)
            .with_client(self.ip_address.clone(), self.user_agent.clone())
    }
}
