use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for note
#[derive(Debug, Clone, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub ticket_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// What a note is attached to. A note belongs to at most one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTarget {
    Ticket(Uuid),
    Customer(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub content: String,
    pub target: NoteTarget,
    pub user_id: Uuid,
}

impl NewNote {
    pub fn ticket_id(&self) -> Option<Uuid> {
        match self.target {
            NoteTarget::Ticket(id) => Some(id),
            NoteTarget::Customer(_) => None,
        }
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        match self.target {
            NoteTarget::Customer(id) => Some(id),
            NoteTarget::Ticket(_) => None,
        }
    }
}
