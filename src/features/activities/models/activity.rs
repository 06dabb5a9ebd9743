use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of audited action, matching the `activity_type` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    CreateTicket,
    UpdateTicket,
    AssignTicket,
    MoveTicketStage,
    AddNote,
    ImportCustomers,
    ExportData,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityType::Login => "login",
            ActivityType::Logout => "logout",
            ActivityType::CreateCustomer => "create_customer",
            ActivityType::UpdateCustomer => "update_customer",
            ActivityType::DeleteCustomer => "delete_customer",
            ActivityType::CreateTicket => "create_ticket",
            ActivityType::UpdateTicket => "update_ticket",
            ActivityType::AssignTicket => "assign_ticket",
            ActivityType::MoveTicketStage => "move_ticket_stage",
            ActivityType::AddNote => "add_note",
            ActivityType::ImportCustomers => "import_customers",
            ActivityType::ExportData => "export_data",
        };
        write!(f, "{}", s)
    }
}

/// Database model for an audit log entry
#[derive(Debug, Clone, FromRow)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry waiting to be written
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewActivity {
    pub fn new(user_id: Uuid, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            user_id,
            activity_type,
            description: description.into(),
            metadata: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}
