use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a CRM user account
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rows touched by an account deletion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountDeletion {
    pub activities_deleted: u64,
    pub notes_deleted: u64,
    pub tickets_unassigned: u64,
    pub users_deleted: u64,
}

impl AccountDeletion {
    pub fn total(&self) -> u64 {
        self.activities_deleted + self.notes_deleted + self.tickets_unassigned + self.users_deleted
    }
}
