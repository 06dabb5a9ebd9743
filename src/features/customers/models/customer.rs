use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::shared::types::PaginationQuery;

/// Database model for customer
#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for inserting a customer
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
}

/// Filters for listing customers
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Case-insensitive substring over name, email and company
    pub search: Option<String>,
    /// Case-insensitive substring over company
    pub company: Option<String>,
    pub has_tickets: Option<bool>,
    pub pagination: PaginationQuery,
}
