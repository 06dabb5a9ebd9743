use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::types::PaginationQuery;

/// Workflow stage, matching the `ticket_stage` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "ticket_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStage {
    New,
    InProgress,
    Waiting,
    Completed,
}

impl std::fmt::Display for TicketStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStage::New => write!(f, "new"),
            TicketStage::InProgress => write!(f, "in_progress"),
            TicketStage::Waiting => write!(f, "waiting"),
            TicketStage::Completed => write!(f, "completed"),
        }
    }
}

/// Ticket priority, matching the `ticket_priority` database enum
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema,
)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
            TicketPriority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Database model for ticket
#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub assigned_user_id: Option<Uuid>,
    pub stage: TicketStage,
    pub priority: TicketPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Move to `stage`, keeping `completed_at` set exactly while completed.
    /// Returns the previous stage.
    pub fn transition_to(&mut self, stage: TicketStage, now: DateTime<Utc>) -> TicketStage {
        let previous = self.stage;

        match (previous, stage) {
            (TicketStage::Completed, TicketStage::Completed) => {}
            (_, TicketStage::Completed) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }

        self.stage = stage;
        self.updated_at = now;
        previous
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.stage != TicketStage::Completed && self.due_date.is_some_and(|due| due < now)
    }
}

/// Values for inserting a ticket. Tickets always start in `new`.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub customer_id: Uuid,
    pub assigned_user_id: Option<Uuid>,
    pub priority: TicketPriority,
    pub due_date: Option<DateTime<Utc>>,
}

/// Filters for listing tickets
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub stage: Option<TicketStage>,
    pub priority: Option<TicketPriority>,
    pub customer_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    /// Only tickets past their due date and not completed
    pub overdue: bool,
    pub pagination: PaginationQuery,
}
