use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notes::models::{NewNote, Note};

const NOTE_COLUMNS: &str = "id, content, ticket_id, customer_id, user_id, created_at";

/// Persistence for notes
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create(&self, note: NewNote) -> Result<Note>;

    /// Notes of a ticket, oldest first
    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Note>>;

    /// Notes attached directly to a customer, oldest first
    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Note>>;
}

pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, note: NewNote) -> Result<Note> {
        let sql = format!(
            r#"
            INSERT INTO notes (content, ticket_id, customer_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );

        sqlx::query_as::<_, Note>(&sql)
            .bind(&note.content)
            .bind(note.ticket_id())
            .bind(note.customer_id())
            .bind(note.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create note: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE ticket_id = $1 ORDER BY created_at",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(ticket_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notes for ticket {}: {:?}", ticket_id, e);
                AppError::Database(e)
            })
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM notes WHERE customer_id = $1 ORDER BY created_at",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list notes for customer {}: {:?}", customer_id, e);
                AppError::Database(e)
            })
    }
}
