use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::customers::models::{Customer, CustomerFilter};
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::tickets::dtos::TicketSummaryDto;
use crate::shared::types::{default_page, default_page_size, PaginationQuery};

/// Request DTO for creating a customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(regex(
        path = "*crate::shared::validation::EMAIL_REGEX",
        message = "Invalid email format"
    ))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "Phone must not exceed 100 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Company must not exceed 255 characters"))]
    pub company: Option<String>,

    pub notes: Option<String>,
}

/// Request DTO for updating a customer. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(regex(
        path = "*crate::shared::validation::EMAIL_REGEX",
        message = "Invalid email format"
    ))]
    pub email: Option<String>,

    #[validate(length(max = 100, message = "Phone must not exceed 100 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 255, message = "Company must not exceed 255 characters"))]
    pub company: Option<String>,

    pub notes: Option<String>,
}

/// Response DTO for customer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponseDto {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponseDto {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            company: c.company,
            notes: c.notes,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Customer with its tickets and notes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerDetailDto {
    #[serde(flatten)]
    pub customer: CustomerResponseDto,
    pub tickets: Vec<TicketSummaryDto>,
    pub customer_notes: Vec<NoteResponseDto>,
}

/// Query parameters for listing customers
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    /// Substring of name, email or company (case-insensitive)
    pub search: Option<String>,
    /// Substring of company (case-insensitive)
    pub company: Option<String>,
    pub has_tickets: Option<bool>,
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

impl From<CustomerListQuery> for CustomerFilter {
    fn from(q: CustomerListQuery) -> Self {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            search: blank_to_none(q.search),
            company: blank_to_none(q.company),
            has_tickets: q.has_tickets,
            pagination: PaginationQuery::new(q.page, q.page_size),
        }
    }
}

/// Query parameters for quick search
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CustomerSearchQuery {
    pub q: String,
    /// Maximum number of results (default: 10)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerStatsDto {
    pub total: i64,
    pub with_tickets: i64,
    pub without_tickets: i64,
    /// Created within the last 30 days
    pub recently_added: i64,
}
