use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, Actor};
use crate::features::activities::services::ActivityLogger;
use crate::features::customers::models::Customer;
use crate::features::customers::repositories::CustomerRepository;
use crate::features::notes::dtos::NoteResponseDto;
use crate::features::notes::models::{NewNote, NoteTarget};
use crate::features::notes::repositories::NoteRepository;
use crate::features::notifications::NotificationService;
use crate::features::tickets::dtos::{
    CreateTicketDto, PriorityCountsDto, StageCountsDto, TicketCustomerDto, TicketDetailDto,
    TicketResponseDto, TicketStatsDto, UpdateTicketDto,
};
use crate::features::tickets::models::{NewTicket, Ticket, TicketFilter, TicketStage};
use crate::features::tickets::repositories::TicketRepository;
use crate::features::users::dtos::UserSummaryDto;
use crate::features::users::models::User;
use crate::features::users::repositories::UserRepository;
use crate::shared::types::Page;
use crate::shared::validation::non_blank;

/// Ticket lifecycle: creation, stage moves, assignment and notes
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    customers: Arc<dyn CustomerRepository>,
    users: Arc<dyn UserRepository>,
    notes: Arc<dyn NoteRepository>,
    activity: ActivityLogger,
    notifications: Arc<NotificationService>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        customers: Arc<dyn CustomerRepository>,
        users: Arc<dyn UserRepository>,
        notes: Arc<dyn NoteRepository>,
        activity: ActivityLogger,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            tickets,
            customers,
            users,
            notes,
            activity,
            notifications,
        }
    }

    /// Create a ticket in the `new` stage. Any stage in the request is ignored.
    pub async fn create(&self, dto: CreateTicketDto, actor: &Actor) -> Result<TicketResponseDto> {
        let title = non_blank(Some(&dto.title))
            .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
        let customer = self.find_customer(dto.customer_id).await?;
        let assignee = match dto.assigned_user_id {
            Some(user_id) => Some(self.find_user(user_id).await?),
            None => None,
        };

        if let Some(stage) = dto.stage.filter(|s| *s != TicketStage::New) {
            tracing::debug!("Ignoring requested stage {} on ticket creation", stage);
        }

        let ticket = self
            .tickets
            .create(NewTicket {
                title,
                description: dto.description,
                customer_id: customer.id,
                assigned_user_id: assignee.as_ref().map(|u| u.id),
                priority: dto.priority,
                due_date: dto.due_date,
            })
            .await?;

        tracing::info!("Ticket created: id={}, customer={}", ticket.id, customer.id);

        self.activity.record(
            actor
                .activity(
                    ActivityType::CreateTicket,
                    format!("Created ticket: {}", ticket.title),
                )
                .with_metadata(json!({
                    "ticket_id": ticket.id,
                    "customer_id": ticket.customer_id,
                })),
        );

        Ok(TicketResponseDto::new(
            ticket,
            Some(TicketCustomerDto::from(&customer)),
            assignee.as_ref().map(UserSummaryDto::from),
        ))
    }

    /// Partial update of everything but the stage
    pub async fn update(
        &self,
        id: Uuid,
        dto: UpdateTicketDto,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        let mut ticket = self.find_ticket(id).await?;

        if let Some(customer_id) = dto.customer_id {
            if customer_id != ticket.customer_id {
                self.find_customer(customer_id).await?;
                ticket.customer_id = customer_id;
            }
        }
        if let Some(user_id) = dto.assigned_user_id {
            if Some(user_id) != ticket.assigned_user_id {
                self.find_user(user_id).await?;
                ticket.assigned_user_id = Some(user_id);
            }
        }
        if let Some(title) = dto.title {
            ticket.title = non_blank(Some(&title))
                .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
        }
        if let Some(description) = dto.description {
            ticket.description = description;
        }
        if let Some(priority) = dto.priority {
            ticket.priority = priority;
        }
        if dto.due_date.is_some() {
            ticket.due_date = dto.due_date;
        }

        let ticket = self.tickets.update(&ticket).await?;

        self.activity.record(
            actor
                .activity(
                    ActivityType::UpdateTicket,
                    format!("Updated ticket: {}", ticket.title),
                )
                .with_metadata(json!({ "ticket_id": ticket.id })),
        );

        self.to_response(ticket).await
    }

    /// Ticket with customer, assignee and notes
    pub async fn get(&self, id: Uuid) -> Result<TicketDetailDto> {
        let ticket = self.find_ticket(id).await?;

        let mut notes = Vec::new();
        for note in self.notes.list_for_ticket(id).await? {
            let author = self.user_summary(Some(note.user_id)).await?;
            notes.push(NoteResponseDto::new(note, author));
        }

        Ok(TicketDetailDto {
            ticket: self.to_response(ticket).await?,
            notes,
        })
    }

    pub async fn move_stage(
        &self,
        id: Uuid,
        stage: TicketStage,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        let mut ticket = self.find_ticket(id).await?;
        let old_stage = ticket.transition_to(stage, Utc::now());

        let ticket = self.tickets.update(&ticket).await?;

        tracing::info!("Ticket {} moved from {} to {}", ticket.id, old_stage, stage);

        self.activity.record(
            actor
                .activity(
                    ActivityType::MoveTicketStage,
                    format!(
                        "Moved ticket \"{}\" from {} to {}",
                        ticket.title, old_stage, stage
                    ),
                )
                .with_metadata(json!({
                    "ticket_id": ticket.id,
                    "old_stage": old_stage,
                    "new_stage": stage,
                    "completed_at": ticket.completed_at,
                })),
        );

        self.to_response(ticket).await
    }

    /// Assign the ticket and email the assignee. The email is best-effort.
    pub async fn assign(
        &self,
        id: Uuid,
        assigned_user_id: Uuid,
        actor: &Actor,
    ) -> Result<TicketResponseDto> {
        let mut ticket = self.find_ticket(id).await?;
        let assignee = self.find_user(assigned_user_id).await?;

        let old_assigned_user_id = ticket.assigned_user_id;
        ticket.assigned_user_id = Some(assignee.id);
        let ticket = self.tickets.update(&ticket).await?;

        self.activity.record(
            actor
                .activity(
                    ActivityType::AssignTicket,
                    format!("Assigned ticket \"{}\" to {}", ticket.title, assignee.name),
                )
                .with_metadata(json!({
                    "ticket_id": ticket.id,
                    "old_assigned_user_id": old_assigned_user_id,
                    "new_assigned_user_id": assignee.id,
                })),
        );

        // The assignment is stored; a failed read below only costs the email
        let customer = match self.customers.find_by_id(ticket.customer_id).await {
            Ok(customer) => customer,
            Err(e) => {
                tracing::warn!(
                    "Skipping assignment email for ticket {}: customer lookup failed: {}",
                    ticket.id,
                    e
                );
                None
            }
        };
        match &customer {
            Some(customer) => {
                let assigned_by = self.users.find_by_id(actor.user_id).await.ok().flatten();
                self.notifications
                    .send_ticket_assignment(&assignee, &ticket, customer, assigned_by.as_ref())
                    .await;
            }
            None => tracing::warn!(
                "Skipping assignment email for ticket {}: customer missing",
                ticket.id
            ),
        }

        Ok(TicketResponseDto::new(
            ticket,
            customer.as_ref().map(TicketCustomerDto::from),
            Some(UserSummaryDto::from(&assignee)),
        ))
    }

    pub async fn add_note(&self, id: Uuid, content: &str, actor: &Actor) -> Result<NoteResponseDto> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Note content is required".to_string()));
        }

        let ticket = self.find_ticket(id).await?;

        let note = self
            .notes
            .create(NewNote {
                content: content.to_string(),
                target: NoteTarget::Ticket(ticket.id),
                user_id: actor.user_id,
            })
            .await?;

        self.activity.record(
            actor
                .activity(
                    ActivityType::AddNote,
                    format!("Added note to ticket: {}", ticket.title),
                )
                .with_metadata(json!({ "ticket_id": ticket.id, "note_id": note.id })),
        );

        let author = self.user_summary(Some(note.user_id)).await?;
        Ok(NoteResponseDto::new(note, author))
    }

    pub async fn list(&self, filter: &TicketFilter) -> Result<Page<TicketResponseDto>> {
        let page = self.tickets.list(filter, Utc::now()).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for ticket in page.items {
            items.push(self.to_response(ticket).await?);
        }

        Ok(Page {
            items,
            total: page.total,
        })
    }

    pub async fn stage_counts(&self) -> Result<StageCountsDto> {
        let counts = self.tickets.count_by_stage().await?;
        Ok(StageCountsDto::from_counts(&counts))
    }

    /// Open tickets past their due date, earliest due first
    pub async fn overdue(&self) -> Result<Vec<TicketResponseDto>> {
        let tickets = self.tickets.list_overdue(Utc::now()).await?;

        let mut items = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            items.push(self.to_response(ticket).await?);
        }
        Ok(items)
    }

    pub async fn stats(&self) -> Result<TicketStatsDto> {
        let now = Utc::now();

        let total = self.tickets.count().await?;
        let by_stage = StageCountsDto::from_counts(&self.tickets.count_by_stage().await?);
        let by_priority = PriorityCountsDto::from_counts(&self.tickets.count_by_priority().await?);
        let overdue = self.tickets.count_overdue(now).await?;
        let completed_this_month = self
            .tickets
            .count_completed_since(start_of_month(now))
            .await?;

        Ok(TicketStatsDto {
            total,
            by_stage,
            by_priority,
            overdue,
            completed_this_month,
        })
    }

    async fn to_response(&self, ticket: Ticket) -> Result<TicketResponseDto> {
        let customer = self
            .customers
            .find_by_id(ticket.customer_id)
            .await?
            .map(|c| TicketCustomerDto::from(&c));
        let assignee = self.user_summary(ticket.assigned_user_id).await?;

        Ok(TicketResponseDto::new(ticket, customer, assignee))
    }

    async fn user_summary(&self, user_id: Option<Uuid>) -> Result<Option<UserSummaryDto>> {
        match user_id {
            Some(id) => Ok(self
                .users
                .find_by_id(id)
                .await?
                .map(|u| UserSummaryDto::from(&u))),
            None => Ok(None),
        }
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Ticket> {
        self.tickets
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", id)))
    }

    async fn find_customer(&self, id: Uuid) -> Result<Customer> {
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Customer '{}' not found", id)))
    }

    async fn find_user(&self, id: Uuid) -> Result<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }
}

/// First instant of the UTC month containing `now`
fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(i64::from(now.day0()));
    first_day.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::features::activities::models::NewActivity;
    use crate::features::tickets::models::TicketPriority;
    use crate::shared::test_helpers::{actor, InMemoryStore, RecordingMailer};
    use crate::shared::types::PaginationQuery;

    struct Fixture {
        store: Arc<InMemoryStore>,
        mailer: Arc<RecordingMailer>,
        service: TicketService,
        activities: tokio::sync::mpsc::Receiver<NewActivity>,
        actor: Actor,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let notifications = Arc::new(
            NotificationService::new(mailer.clone(), "noreply@grip-crm.com".to_string()).unwrap(),
        );
        let (logger, activities) = ActivityLogger::channel(32);
        let user = store.add_user("Ana", "ana@example.com", true);

        let service = TicketService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            logger,
            notifications,
        );

        Fixture {
            store,
            mailer,
            service,
            activities,
            actor: actor(&user),
        }
    }

    fn create_dto(customer_id: Uuid) -> CreateTicketDto {
        CreateTicketDto {
            title: "Cannot log in".to_string(),
            description: "Password reset loops".to_string(),
            customer_id,
            assigned_user_id: None,
            priority: TicketPriority::High,
            due_date: None,
            stage: None,
        }
    }

    #[tokio::test]
    async fn test_create_always_starts_new() {
        let mut f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let mut dto = create_dto(customer.id);
        dto.stage = Some(TicketStage::Completed);

        let ticket = f.service.create(dto, &f.actor).await.unwrap();

        assert_eq!(ticket.stage, TicketStage::New);
        assert!(ticket.completed_at.is_none());
        assert_eq!(ticket.customer.as_ref().unwrap().name, "Acme");

        let activity = f.activities.recv().await.unwrap();
        assert_eq!(activity.activity_type, ActivityType::CreateTicket);
    }

    #[tokio::test]
    async fn test_create_requires_existing_customer_and_assignee() {
        let f = fixture();

        let err = f
            .service
            .create(create_dto(Uuid::new_v4()), &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let customer = f.store.add_customer("Acme", None).await;
        let mut dto = create_dto(customer.id);
        dto.assigned_user_id = Some(Uuid::new_v4());
        let err = f.service.create(dto, &f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(f.store.ticket_count().await, 0);
    }

    #[tokio::test]
    async fn test_move_stage_maintains_completed_at() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;

        let completed = f
            .service
            .move_stage(ticket.id, TicketStage::Completed, &f.actor)
            .await
            .unwrap();
        let stamped = completed.completed_at.expect("completed_at set");

        let again = f
            .service
            .move_stage(ticket.id, TicketStage::Completed, &f.actor)
            .await
            .unwrap();
        assert_eq!(again.completed_at, Some(stamped));

        let reopened = f
            .service
            .move_stage(ticket.id, TicketStage::InProgress, &f.actor)
            .await
            .unwrap();
        assert_eq!(reopened.stage, TicketStage::InProgress);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_move_stage_logs_old_and_new_stage() {
        let mut f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;

        f.service
            .move_stage(ticket.id, TicketStage::Waiting, &f.actor)
            .await
            .unwrap();

        let activity = f.activities.recv().await.unwrap();
        assert_eq!(activity.activity_type, ActivityType::MoveTicketStage);
        let metadata = activity.metadata.unwrap();
        assert_eq!(metadata["old_stage"], "new");
        assert_eq!(metadata["new_stage"], "waiting");
    }

    #[tokio::test]
    async fn test_move_stage_missing_ticket_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .move_stage(Uuid::new_v4(), TicketStage::Waiting, &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assign_sends_email_to_assignee() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;
        let ben = f.store.add_user("Ben", "ben@example.com", true);

        let assigned = f.service.assign(ticket.id, ben.id, &f.actor).await.unwrap();

        assert_eq!(assigned.assigned_user_id, Some(ben.id));
        assert_eq!(assigned.assigned_user.unwrap().name, "Ben");
        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ben@example.com");
    }

    #[tokio::test]
    async fn test_assign_succeeds_when_email_fails() {
        let f = fixture();
        f.mailer.fail_next_sends();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;
        let ben = f.store.add_user("Ben", "ben@example.com", true);

        let assigned = f.service.assign(ticket.id, ben.id, &f.actor).await.unwrap();

        assert_eq!(assigned.assigned_user_id, Some(ben.id));
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_assign_kept_when_customer_read_fails_afterwards() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;
        let ben = f.store.add_user("Ben", "ben@example.com", true);
        f.store.fail_customer_reads();

        let assigned = f.service.assign(ticket.id, ben.id, &f.actor).await.unwrap();

        assert_eq!(assigned.assigned_user_id, Some(ben.id));
        assert_eq!(assigned.assigned_user.unwrap().name, "Ben");
        assert!(assigned.customer.is_none());
        assert!(f.mailer.sent().is_empty());

        let stored = TicketRepository::find_by_id(f.store.as_ref(), ticket.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.assigned_user_id, Some(ben.id));
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;

        let mut dto = create_dto(customer.id);
        dto.title = "   ".to_string();
        let err = f.service.create(dto, &f.actor).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.store.ticket_count().await, 0);

        let ticket = f.store.add_ticket(customer.id, "Broken").await;
        let err = f
            .service
            .update(
                ticket.id,
                UpdateTicketDto {
                    title: Some("  ".to_string()),
                    ..Default::default()
                },
                &f.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = f
            .service
            .create(create_dto(customer.id), &f.actor)
            .await
            .unwrap();
        assert_eq!(created.title, "Cannot log in");
    }

    #[tokio::test]
    async fn test_assign_unknown_user_is_not_found() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;

        let err = f
            .service
            .assign(ticket.id, Uuid::new_v4(), &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_note_trims_and_rejects_blank() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;

        let err = f
            .service
            .add_note(ticket.id, "   ", &f.actor)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let note = f
            .service
            .add_note(ticket.id, "  Called the customer  ", &f.actor)
            .await
            .unwrap();
        assert_eq!(note.content, "Called the customer");
        assert_eq!(note.ticket_id, Some(ticket.id));
        assert_eq!(note.author.unwrap().email, "ana@example.com");

        let detail = f.service.get(ticket.id).await.unwrap();
        assert_eq!(detail.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_update_cannot_touch_stage_and_checks_customer() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let ticket = f.store.add_ticket(customer.id, "Broken").await;

        let updated = f
            .service
            .update(
                ticket.id,
                UpdateTicketDto {
                    title: Some("Broken badly".to_string()),
                    priority: Some(TicketPriority::Urgent),
                    ..Default::default()
                },
                &f.actor,
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Broken badly");
        assert_eq!(updated.priority, TicketPriority::Urgent);
        assert_eq!(updated.stage, TicketStage::New);

        let err = f
            .service
            .update(
                ticket.id,
                UpdateTicketDto {
                    customer_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
                &f.actor,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_and_stage_counts() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let a = f.store.add_ticket(customer.id, "A").await;
        f.store.add_ticket(customer.id, "B").await;
        f.service
            .move_stage(a.id, TicketStage::Waiting, &f.actor)
            .await
            .unwrap();

        let page = f
            .service
            .list(&TicketFilter {
                stage: Some(TicketStage::Waiting),
                pagination: PaginationQuery::default(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "A");

        let counts = f.service.stage_counts().await.unwrap();
        assert_eq!(
            counts,
            StageCountsDto {
                new: 1,
                in_progress: 0,
                waiting: 1,
                completed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_overdue_excludes_completed_and_sorts_by_due_date() {
        let f = fixture();
        let customer = f.store.add_customer("Acme", None).await;
        let now = Utc::now();

        let mut later = f.store.add_ticket(customer.id, "Later").await;
        later.due_date = Some(now - Duration::days(1));
        f.store.put_ticket(later).await;

        let mut earlier = f.store.add_ticket(customer.id, "Earlier").await;
        earlier.due_date = Some(now - Duration::days(3));
        f.store.put_ticket(earlier).await;

        let mut done = f.store.add_ticket(customer.id, "Done").await;
        done.due_date = Some(now - Duration::days(5));
        done.transition_to(TicketStage::Completed, now);
        f.store.put_ticket(done).await;

        let overdue = f.service.overdue().await.unwrap();
        let titles: Vec<_> = overdue.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);

        let stats = f.service.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.overdue, 2);
        assert_eq!(stats.completed_this_month, 1);
        assert_eq!(stats.by_priority.medium, 3);
    }

    #[test]
    fn test_start_of_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 15, 4, 5).unwrap();
        assert_eq!(
            start_of_month(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }
}
