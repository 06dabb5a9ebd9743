use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{
    NewTicket, Ticket, TicketFilter, TicketPriority, TicketStage,
};
use crate::shared::types::{DateRange, Page};

const TICKET_COLUMNS: &str = r#"
    id, title, description, customer_id, assigned_user_id,
    stage, priority, due_date, completed_at, created_at, updated_at
"#;

/// Persistence for tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket>;

    /// Write every mutable column of `ticket`
    async fn update(&self, ticket: &Ticket) -> Result<Ticket>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Filtered page, newest first
    async fn list(&self, filter: &TicketFilter, now: DateTime<Utc>) -> Result<Page<Ticket>>;

    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>>;

    async fn count_by_customer(&self, customer_id: Uuid) -> Result<i64>;

    /// Open tickets past their due date, earliest due first
    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>>;

    /// Tickets in creation order, optionally restricted to a creation window
    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Ticket>>;

    async fn count(&self) -> Result<i64>;

    /// Stages with at least one ticket
    async fn count_by_stage(&self) -> Result<Vec<(TicketStage, i64)>>;

    /// Priorities with at least one ticket
    async fn count_by_priority(&self) -> Result<Vec<(TicketPriority, i64)>>;

    async fn count_overdue(&self, now: DateTime<Utc>) -> Result<i64>;

    async fn count_completed_since(&self, since: DateTime<Utc>) -> Result<i64>;
}

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket> {
        let sql = format!(
            r#"
            INSERT INTO tickets (title, description, customer_id, assigned_user_id, priority, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(ticket.customer_id)
            .bind(ticket.assigned_user_id)
            .bind(ticket.priority)
            .bind(ticket.due_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create ticket: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket> {
        let sql = format!(
            r#"
            UPDATE tickets
            SET title = $2, description = $3, customer_id = $4, assigned_user_id = $5,
                stage = $6, priority = $7, due_date = $8, completed_at = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, Ticket>(&sql)
            .bind(ticket.id)
            .bind(&ticket.title)
            .bind(&ticket.description)
            .bind(ticket.customer_id)
            .bind(ticket.assigned_user_id)
            .bind(ticket.stage)
            .bind(ticket.priority)
            .bind(ticket.due_date)
            .bind(ticket.completed_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update ticket {}: {:?}", ticket.id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket.id)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let sql = format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS);
        sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get ticket by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(&self, filter: &TicketFilter, now: DateTime<Utc>) -> Result<Page<Ticket>> {
        // NULL disables a filter; $5 toggles the overdue condition against $6
        let where_clause = r#"
            WHERE ($1::ticket_stage IS NULL OR stage = $1)
              AND ($2::ticket_priority IS NULL OR priority = $2)
              AND ($3::uuid IS NULL OR customer_id = $3)
              AND ($4::uuid IS NULL OR assigned_user_id = $4)
              AND (NOT $5 OR (due_date < $6 AND stage <> 'completed'))
        "#;

        let count_sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.stage)
            .bind(filter.priority)
            .bind(filter.customer_id)
            .bind(filter.assigned_user_id)
            .bind(filter.overdue)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets: {:?}", e);
                AppError::Database(e)
            })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM tickets
            {}
            ORDER BY created_at DESC
            LIMIT $7 OFFSET $8
            "#,
            TICKET_COLUMNS, where_clause
        );

        let items = sqlx::query_as::<_, Ticket>(&sql)
            .bind(filter.stage)
            .bind(filter.priority)
            .bind(filter.customer_id)
            .bind(filter.assigned_user_id)
            .bind(filter.overdue)
            .bind(now)
            .bind(filter.pagination.limit())
            .bind(filter.pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tickets: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(Page { items, total })
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>> {
        let sql = format!(
            "SELECT {} FROM tickets WHERE customer_id = $1 ORDER BY created_at DESC",
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, Ticket>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tickets for customer {}: {:?}", customer_id, e);
                AppError::Database(e)
            })
    }

    async fn count_by_customer(&self, customer_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE customer_id = $1")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets for customer {}: {:?}", customer_id, e);
                AppError::Database(e)
            })
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tickets
            WHERE due_date < $1 AND stage <> 'completed'
            ORDER BY due_date ASC
            "#,
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, Ticket>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list overdue tickets: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Ticket>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tickets
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            ORDER BY created_at
            "#,
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, Ticket>(&sql)
            .bind(range.map(|r| r.start))
            .bind(range.map(|r| r.end))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tickets for export: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count tickets: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count_by_stage(&self) -> Result<Vec<(TicketStage, i64)>> {
        sqlx::query_as::<_, (TicketStage, i64)>(
            "SELECT stage, COUNT(*) FROM tickets GROUP BY stage",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count tickets by stage: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn count_by_priority(&self) -> Result<Vec<(TicketPriority, i64)>> {
        sqlx::query_as::<_, (TicketPriority, i64)>(
            "SELECT priority, COUNT(*) FROM tickets GROUP BY priority",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count tickets by priority: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tickets WHERE due_date < $1 AND stage <> 'completed'",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count overdue tickets: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn count_completed_since(&self, since: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets WHERE completed_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count completed tickets: {:?}", e);
                AppError::Database(e)
            })
    }
}
