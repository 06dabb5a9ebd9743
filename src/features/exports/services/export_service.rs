use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, Actor};
use crate::features::activities::services::ActivityLogger;
use crate::features::customers::dtos::CustomerResponseDto;
use crate::features::customers::models::Customer;
use crate::features::customers::CustomerRepository;
use crate::features::exports::dtos::{
    CustomerExportDto, ExportFormat, ExportOptions, ExportStatsDto, ExportedDataDto,
    FullExportDto, TicketExportDto,
};
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::notes::models::Note;
use crate::features::notes::NoteRepository;
use crate::features::tickets::dtos::{TicketCustomerDto, TicketResponseDto};
use crate::features::tickets::TicketRepository;
use crate::features::users::dtos::{UserExportDto, UserSummaryDto};
use crate::features::users::models::User;
use crate::features::users::UserRepository;
use crate::shared::csv_format::render_csv;
use crate::shared::format::{format_bytes, timestamp};

pub const CUSTOMER_HEADERS: [&str; 9] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Company",
    "Notes",
    "Created At",
    "Updated At",
    "Ticket Count",
];

pub const TICKET_HEADERS: [&str; 12] = [
    "ID",
    "Title",
    "Description",
    "Customer Name",
    "Customer Email",
    "Assigned User",
    "Stage",
    "Priority",
    "Due Date",
    "Completed At",
    "Created At",
    "Updated At",
];

pub const USER_HEADERS: [&str; 6] = ["ID", "Email", "Name", "Is Verified", "Created At", "Updated At"];

const NOTE_SEPARATOR: &str = " | ";

// Per-record size estimates used by `stats`
const CUSTOMER_EXPORT_BYTES: u64 = 500;
const TICKET_EXPORT_BYTES: u64 = 1000;
const USER_EXPORT_BYTES: u64 = 200;

/// CSV and JSON exports of customers, tickets and users
pub struct ExportService {
    customers: Arc<dyn CustomerRepository>,
    tickets: Arc<dyn TicketRepository>,
    notes: Arc<dyn NoteRepository>,
    users: Arc<dyn UserRepository>,
    activity: ActivityLogger,
}

impl ExportService {
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

    pub async fn export_customers(&self, options: &ExportOptions, actor: &Actor) -> Result<String> {
        let records = self.customer_records(options).await?;
        let content = match options.format {
            ExportFormat::Json => to_json(&records)?,
            ExportFormat::Csv => customers_csv(&records, options.include_notes)?,
        };

        self.record_export(actor, "Exported customers data", options);
        Ok(content)
    }

    pub async fn export_tickets(&self, options: &ExportOptions, actor: &Actor) -> Result<String> {
        let records = self.ticket_records(options).await?;
        let content = match options.format {
            ExportFormat::Json => to_json(&records)?,
            ExportFormat::Csv => tickets_csv(&records, options.include_notes)?,
        };

        self.record_export(actor, "Exported tickets data", options);
        Ok(content)
    }

    pub async fn export_users(&self, options: &ExportOptions, actor: &Actor) -> Result<String> {
        let records = self.user_records().await?;
        let content = match options.format {
            ExportFormat::Json => to_json(&records)?,
            ExportFormat::Csv => users_csv(&records)?,
        };

        self.record_export(actor, "Exported users data", options);
        Ok(content)
    }

    /// Everything in one JSON document. CSV would need one file per entity
    /// and is rejected.
    pub async fn export_all(&self, options: &ExportOptions, actor: &Actor) -> Result<FullExportDto> {
        if options.format == ExportFormat::Csv {
            return Err(AppError::BadRequest(
                "CSV format not supported for full export. Use JSON format or export individual data types."
                    .to_string(),
            ));
        }

        let data = self.collect_all(options).await?;
        self.record_export(actor, "Exported all data", options);

        Ok(FullExportDto {
            export_date: Utc::now(),
            data,
        })
    }

    /// Records of every entity, without an audit entry. Used by backups.
    pub async fn collect_all(&self, options: &ExportOptions) -> Result<ExportedDataDto> {
        Ok(ExportedDataDto {
            customers: self.customer_records(options).await?,
            tickets: self.ticket_records(options).await?,
            users: self.user_records().await?,
        })
    }

    pub async fn customer_records(&self, options: &ExportOptions) -> Result<Vec<CustomerExportDto>> {
        let customers = self.customers.list_created_between(options.range).await?;

        let mut ticket_counts: HashMap<Uuid, i64> = HashMap::new();
        for ticket in self.tickets.list_created_between(None).await? {
            *ticket_counts.entry(ticket.customer_id).or_default() += 1;
        }

        let authors = if options.include_notes {
            self.user_index().await?
        } else {
            HashMap::new()
        };

        let mut records = Vec::with_capacity(customers.len());
        for customer in customers {
            let customer_notes = if options.include_notes {
                let notes = self.notes.list_for_customer(customer.id).await?;
                Some(with_authors(notes, &authors))
            } else {
                None
            };

            records.push(CustomerExportDto {
                ticket_count: ticket_counts.get(&customer.id).copied().unwrap_or(0),
                customer: CustomerResponseDto::from(customer),
                customer_notes,
            });
        }

        Ok(records)
    }

    pub async fn ticket_records(&self, options: &ExportOptions) -> Result<Vec<TicketExportDto>> {
        let tickets = self.tickets.list_created_between(options.range).await?;
        let customers = self.customer_index().await?;
        let users = self.user_index().await?;

        let mut records = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let notes = if options.include_notes {
                let notes = self.notes.list_for_ticket(ticket.id).await?;
                Some(with_authors(notes, &users))
            } else {
                None
            };

            let customer = customers.get(&ticket.customer_id).map(TicketCustomerDto::from);
            let assigned_user = ticket
                .assigned_user_id
                .and_then(|id| users.get(&id))
                .map(UserSummaryDto::from);

            records.push(TicketExportDto {
                ticket: TicketResponseDto::new(ticket, customer, assigned_user),
                notes,
            });
        }

        Ok(records)
    }

    /// Users are always exported in full; the date window does not apply
    pub async fn user_records(&self) -> Result<Vec<UserExportDto>> {
        let users = self.users.list_all().await?;
        Ok(users.into_iter().map(UserExportDto::from).collect())
    }

    pub async fn stats(&self) -> Result<ExportStatsDto> {
        let total_customers = self.customers.count().await?;
        let total_tickets = self.tickets.count().await?;
        let total_users = self.users.count().await?;

        let estimated = total_customers as u64 * CUSTOMER_EXPORT_BYTES
            + total_tickets as u64 * TICKET_EXPORT_BYTES
            + total_users as u64 * USER_EXPORT_BYTES;

        Ok(ExportStatsDto {
            total_customers,
            total_tickets,
            total_users,
            estimated_export_size: format_bytes(estimated),
        })
    }

    fn record_export(&self, actor: &Actor, description: &str, options: &ExportOptions) {
        self.activity.record(
            actor
                .activity(ActivityType::ExportData, description)
                .with_metadata(json!({
                    "format": options.format,
                    "include_notes": options.include_notes,
                    "date_range": options.range,
                })),
        );
    }

    async fn customer_index(&self) -> Result<HashMap<Uuid, Customer>> {
        let customers = self.customers.list_created_between(None).await?;
        Ok(customers.into_iter().map(|c| (c.id, c)).collect())
    }

    async fn user_index(&self) -> Result<HashMap<Uuid, User>> {
        let users = self.users.list_all().await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

fn with_authors(notes: Vec<Note>, users: &HashMap<Uuid, User>) -> Vec<NoteResponseDto> {
    notes
        .into_iter()
        .map(|note| {
            let author = users.get(&note.user_id).map(UserSummaryDto::from);
            NoteResponseDto::new(note, author)
        })
        .collect()
}

fn to_json<T: Serialize>(records: &T) -> Result<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| AppError::Internal(format!("Failed to serialize export: {}", e)))
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn customers_csv(records: &[CustomerExportDto], include_notes: bool) -> Result<String> {
    let mut headers = CUSTOMER_HEADERS.to_vec();
    if include_notes {
        headers.push("Customer Notes");
    }

    let rows = records.iter().map(|record| {
        let c = &record.customer;
        let mut row = vec![
            c.id.to_string(),
            c.name.clone(),
            opt(&c.email),
            opt(&c.phone),
            opt(&c.company),
            opt(&c.notes),
            timestamp(c.created_at),
            timestamp(c.updated_at),
            record.ticket_count.to_string(),
        ];

        if include_notes {
            let notes = record.customer_notes.as_deref().unwrap_or_default();
            row.push(
                notes
                    .iter()
                    .map(|n| format!("{}: {}", timestamp(n.created_at), n.content))
                    .collect::<Vec<_>>()
                    .join(NOTE_SEPARATOR),
            );
        }

        row
    });

    render_csv(&headers, rows)
}

fn tickets_csv(records: &[TicketExportDto], include_notes: bool) -> Result<String> {
    let mut headers = TICKET_HEADERS.to_vec();
    if include_notes {
        headers.push("Notes");
    }

    let rows = records.iter().map(|record| {
        let t = &record.ticket;
        let mut row = vec![
            t.id.to_string(),
            t.title.clone(),
            t.description.clone(),
            t.customer.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            t.customer.as_ref().and_then(|c| c.email.clone()).unwrap_or_default(),
            t.assigned_user.as_ref().map(|u| u.name.clone()).unwrap_or_default(),
            t.stage.to_string(),
            t.priority.to_string(),
            t.due_date.map(timestamp).unwrap_or_default(),
            t.completed_at.map(timestamp).unwrap_or_default(),
            timestamp(t.created_at),
            timestamp(t.updated_at),
        ];

        if include_notes {
            let notes = record.notes.as_deref().unwrap_or_default();
            row.push(
                notes
                    .iter()
                    .map(|n| {
                        let author = n.author.as_ref().map(|a| a.name.as_str()).unwrap_or("Unknown");
                        format!("{} ({}): {}", timestamp(n.created_at), author, n.content)
                    })
                    .collect::<Vec<_>>()
                    .join(NOTE_SEPARATOR),
            );
        }

        row
    });

    render_csv(&headers, rows)
}

fn users_csv(records: &[UserExportDto]) -> Result<String> {
    let rows = records.iter().map(|u| {
        vec![
            u.id.to_string(),
            u.email.clone(),
            u.name.clone(),
            u.is_verified.to_string(),
            timestamp(u.created_at),
            timestamp(u.updated_at),
        ]
    });

    render_csv(&USER_HEADERS, rows)
}
