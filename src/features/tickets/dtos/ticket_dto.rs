use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::customers::models::Customer;
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::tickets::models::{Ticket, TicketFilter, TicketPriority, TicketStage};
use crate::features::users::dtos::UserSummaryDto;
use crate::shared::types::{default_page, default_page_size, PaginationQuery};

/// Request DTO for creating a ticket
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub customer_id: Uuid,

    pub assigned_user_id: Option<Uuid>,

    #[serde(default)]
    pub priority: TicketPriority,

    pub due_date: Option<DateTime<Utc>>,

    /// Accepted for compatibility and ignored: new tickets always start in `new`
    #[serde(default)]
    pub stage: Option<TicketStage>,
}

/// Request DTO for updating ticket fields. The stage is changed through
/// `PATCH /api/tickets/{id}/stage` only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    pub customer_id: Option<Uuid>,

    pub assigned_user_id: Option<Uuid>,

    pub priority: Option<TicketPriority>,

    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoveStageDto {
    pub stage: TicketStage,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignTicketDto {
    pub assigned_user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddNoteDto {
    pub content: String,
}

/// Query parameters for listing tickets
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct TicketFilterQuery {
    pub stage: Option<TicketStage>,
    pub priority: Option<TicketPriority>,
    pub customer_id: Option<Uuid>,
    pub assigned_user_id: Option<Uuid>,
    /// Only open tickets past their due date
    #[serde(default)]
    pub overdue: bool,
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

impl From<TicketFilterQuery> for TicketFilter {
    fn from(q: TicketFilterQuery) -> Self {
        Self {
            stage: q.stage,
            priority: q.priority,
            customer_id: q.customer_id,
            assigned_user_id: q.assigned_user_id,
            overdue: q.overdue,
            pagination: PaginationQuery::new(q.page, q.page_size),
        }
    }
}

/// Customer fields embedded in ticket responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketCustomerDto {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub company: Option<String>,
}

impl From<&Customer> for TicketCustomerDto {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            company: c.company.clone(),
        }
    }
}

/// Response DTO for ticket
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponseDto {
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
    /// Past its due date and not completed, as of the response
    pub is_overdue: bool,
    pub customer: Option<TicketCustomerDto>,
    pub assigned_user: Option<UserSummaryDto>,
}

impl TicketResponseDto {
    pub fn new(
        t: Ticket,
        customer: Option<TicketCustomerDto>,
        assigned_user: Option<UserSummaryDto>,
    ) -> Self {
        Self {
            is_overdue: t.is_overdue(Utc::now()),
            id: t.id,
            title: t.title,
            description: t.description,
            customer_id: t.customer_id,
            assigned_user_id: t.assigned_user_id,
            stage: t.stage,
            priority: t.priority,
            due_date: t.due_date,
            completed_at: t.completed_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
            customer,
            assigned_user,
        }
    }
}

/// Ticket with its notes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketDetailDto {
    #[serde(flatten)]
    pub ticket: TicketResponseDto,
    pub notes: Vec<NoteResponseDto>,
}

/// Ticket row embedded in a customer's detail view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub stage: TicketStage,
    pub priority: TicketPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Ticket> for TicketSummaryDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            title: t.title,
            stage: t.stage,
            priority: t.priority,
            due_date: t.due_date,
            completed_at: t.completed_at,
            created_at: t.created_at,
        }
    }
}

/// Ticket count for every stage, zero-filled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageCountsDto {
    pub new: i64,
    pub in_progress: i64,
    pub waiting: i64,
    pub completed: i64,
}

impl StageCountsDto {
    pub fn from_counts(counts: &[(TicketStage, i64)]) -> Self {
        let mut dto = Self::default();
        for (stage, count) in counts {
            match stage {
                TicketStage::New => dto.new += count,
                TicketStage::InProgress => dto.in_progress += count,
                TicketStage::Waiting => dto.waiting += count,
                TicketStage::Completed => dto.completed += count,
            }
        }
        dto
    }
}

/// Ticket count for every priority, zero-filled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriorityCountsDto {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

impl PriorityCountsDto {
    pub fn from_counts(counts: &[(TicketPriority, i64)]) -> Self {
        let mut dto = Self::default();
        for (priority, count) in counts {
            match priority {
                TicketPriority::Low => dto.low += count,
                TicketPriority::Medium => dto.medium += count,
                TicketPriority::High => dto.high += count,
                TicketPriority::Urgent => dto.urgent += count,
            }
        }
        dto
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketStatsDto {
    pub total: i64,
    pub by_stage: StageCountsDto,
    pub by_priority: PriorityCountsDto,
    pub overdue: i64,
    pub completed_this_month: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_counts_are_zero_filled() {
        let dto = StageCountsDto::from_counts(&[(TicketStage::Waiting, 3)]);
        assert_eq!(
            dto,
            StageCountsDto {
                new: 0,
                in_progress: 0,
                waiting: 3,
                completed: 0
            }
        );
    }

    #[test]
    fn test_create_dto_defaults_priority_and_keeps_stage_field() {
        let dto: CreateTicketDto = serde_json::from_value(serde_json::json!({
            "title": "Cannot log in",
            "description": "Password reset loops",
            "customer_id": Uuid::nil(),
            "stage": "completed"
        }))
        .unwrap();

        assert_eq!(dto.priority, TicketPriority::Medium);
        assert_eq!(dto.stage, Some(TicketStage::Completed));
        assert!(dto.assigned_user_id.is_none());
    }
}
