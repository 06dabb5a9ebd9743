use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::notes::models::Note;
use crate::features::users::dtos::UserSummaryDto;

/// Note with its author
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponseDto {
    pub id: Uuid,
    pub content: String,
    pub ticket_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummaryDto>,
}

impl NoteResponseDto {
    pub fn new(note: Note, author: Option<UserSummaryDto>) -> Self {
        Self {
            id: note.id,
            content: note.content,
            ticket_id: note.ticket_id,
            customer_id: note.customer_id,
            created_at: note.created_at,
            author,
        }
    }
}
