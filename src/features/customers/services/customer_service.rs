use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, Actor};
use crate::features::activities::services::ActivityLogger;
use crate::features::customers::dtos::{
    CreateCustomerDto, CustomerDetailDto, CustomerResponseDto, CustomerStatsDto,
    UpdateCustomerDto,
};
use crate::features::customers::models::{Customer, CustomerFilter, NewCustomer};
use crate::features::customers::repositories::{CustomerRepository, DUPLICATE_EMAIL_MESSAGE};
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::notes::repositories::NoteRepository;
use crate::features::tickets::dtos::TicketSummaryDto;
use crate::features::tickets::repositories::TicketRepository;
use crate::features::users::dtos::UserSummaryDto;
use crate::features::users::repositories::UserRepository;
use crate::shared::constants::RECENT_CUSTOMER_DAYS;
use crate::shared::types::Page;
use crate::shared::validation::non_blank;

/// Service for customer operations
pub struct CustomerService {
    customers: Arc<dyn CustomerRepository>,
    tickets: Arc<dyn TicketRepository>,
    notes: Arc<dyn NoteRepository>,
    users: Arc<dyn UserRepository>,
    activity: ActivityLogger,
}

impl CustomerService {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        tickets: Arc<dyn TicketRepository>,
        notes: Arc<dyn NoteRepository>,
        users: Arc<dyn UserRepository>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            customers,
            tickets,
            notes,
            users,
            activity,
        }
    }

    /// Insert a customer after the duplicate-email check. No audit entry;
    /// used directly by the CSV importer.
    pub async fn insert(&self, customer: NewCustomer) -> Result<Customer> {
        if let Some(email) = &customer.email {
            if self.customers.find_by_email(email).await?.is_some() {
                return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
            }
        }

        self.customers.create(customer).await
    }

    pub async fn create(&self, dto: CreateCustomerDto, actor: &Actor) -> Result<CustomerResponseDto> {
        let name = non_blank(Some(&dto.name))
            .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;

        let customer = self
            .insert(NewCustomer {
                name,
                email: non_blank(dto.email.as_deref()),
                phone: non_blank(dto.phone.as_deref()),
                company: non_blank(dto.company.as_deref()),
                notes: non_blank(dto.notes.as_deref()),
            })
            .await?;

        tracing::info!("Customer created: id={}, name={}", customer.id, customer.name);

        self.activity.record(
            actor
                .activity(
                    ActivityType::CreateCustomer,
                    format!("Created customer: {}", customer.name),
                )
                .with_metadata(json!({ "customer_id": customer.id })),
        );

        Ok(customer.into())
    }

    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateCustomerDto,
        actor: &Actor,
    ) -> Result<CustomerResponseDto> {
        let mut customer = self.find(id).await?;

        if let Some(name) = dto.name {
            customer.name = non_blank(Some(&name))
                .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
        }

        if let Some(email) = dto.email {
            let email = non_blank(Some(&email));
            if let Some(new_email) = email.as_deref() {
                if customer.email.as_deref() != Some(new_email)
                    && self.customers.find_by_email(new_email).await?.is_some()
                {
                    return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
                }
            }
            customer.email = email;
        }

        if let Some(phone) = dto.phone {
            customer.phone = non_blank(Some(&phone));
        }
        if let Some(company) = dto.company {
            customer.company = non_blank(Some(&company));
        }
        if let Some(notes) = dto.notes {
            customer.notes = non_blank(Some(&notes));
        }

        let customer = self.customers.update(&customer).await?;

        self.activity.record(
            actor
                .activity(
                    ActivityType::UpdateCustomer,
                    format!("Updated customer: {}", customer.name),
                )
                .with_metadata(json!({ "customer_id": customer.id })),
        );

        Ok(customer.into())
    }

    /// Customer with its tickets and the notes attached to it
    pub async fn get(&self, id: Uuid) -> Result<CustomerDetailDto> {
        let customer = self.find(id).await?;

        let tickets = self
            .tickets
            .list_by_customer(id)
            .await?
            .into_iter()
            .map(TicketSummaryDto::from)
            .collect();

        let mut customer_notes = Vec::new();
        for note in self.notes.list_for_customer(id).await? {
            let author = self
                .users
                .find_by_id(note.user_id)
                .await?
                .map(|u| UserSummaryDto::from(&u));
            customer_notes.push(NoteResponseDto::new(note, author));
        }

        Ok(CustomerDetailDto {
            customer: customer.into(),
            tickets,
            customer_notes,
        })
    }

    pub async fn list(&self, filter: &CustomerFilter) -> Result<Page<CustomerResponseDto>> {
        let page = self.customers.list(filter).await?;
        Ok(page.map(CustomerResponseDto::from))
    }

    /// Refuses to delete a customer that still owns tickets
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let customer = self.find(id).await?;

        if self.tickets.count_by_customer(id).await? > 0 {
            return Err(AppError::Conflict(
                "Cannot delete customer with associated tickets".to_string(),
            ));
        }

        if !self.customers.delete(id).await? {
            return Err(AppError::NotFound(format!("Customer '{}' not found", id)));
        }

        tracing::info!("Customer deleted: id={}", id);

        self.activity.record(
            actor
                .activity(
                    ActivityType::DeleteCustomer,
                    format!("Deleted customer: {}", customer.name),
                )
                .with_metadata(json!({ "customer_id": id })),
        );

        Ok(())
    }

    pub async fn search(&self, query: &str, limit: i64) -> Result<Vec<CustomerResponseDto>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let customers = self.customers.search(query, limit.max(1)).await?;
        Ok(customers.into_iter().map(CustomerResponseDto::from).collect())
    }

    pub async fn stats(&self) -> Result<CustomerStatsDto> {
        let total = self.customers.count().await?;
        let with_tickets = self.customers.count_with_tickets().await?;
        let since = Utc::now() - Duration::days(RECENT_CUSTOMER_DAYS);
        let recently_added = self.customers.count_created_since(since).await?;

        Ok(CustomerStatsDto {
            total,
            with_tickets,
            without_tickets: total - with_tickets,
            recently_added,
        })
    }

    async fn find(&self, id: Uuid) -> Result<Customer> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer '{}' not found", id)))
    }
}
