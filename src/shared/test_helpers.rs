//! In-memory repositories and an authenticated test server.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::Password;
use fake::Fake;
use tempfile::TempDir;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::activities::models::{ActivityType, Actor, NewActivity, UserActivity};
use crate::features::activities::{
    routes as activity_routes, ActivityLogger, ActivityRepository, ActivityService,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::backups::{routes as backup_routes, BackupService};
use crate::features::customers::models::{Customer, CustomerFilter, NewCustomer};
use crate::features::customers::repositories::DUPLICATE_EMAIL_MESSAGE;
use crate::features::customers::{routes as customer_routes, CustomerRepository, CustomerService};
use crate::features::exports::{routes as export_routes, ExportService};
use crate::features::imports::{routes as import_routes, ImportService};
use crate::features::notes::models::{NewNote, Note};
use crate::features::notes::NoteRepository;
use crate::features::notifications::services::EmailMessage;
use crate::features::notifications::{Mailer, NotificationService};
use crate::features::tickets::models::{
    NewTicket, Ticket, TicketFilter, TicketPriority, TicketStage,
};
use crate::features::tickets::{routes as ticket_routes, TicketRepository, TicketService};
use crate::features::users::models::{AccountDeletion, User};
use crate::features::users::UserRepository;
use crate::shared::types::{DateRange, Page, PaginationQuery};

#[derive(Default)]
struct State {
    customers: Vec<Customer>,
    tickets: Vec<Ticket>,
    notes: Vec<Note>,
    users: Vec<User>,
    activities: Vec<UserActivity>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing so "newest first" never ties
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn email_taken(&self, email: &Option<String>, except: Option<Uuid>) -> bool {
        let Some(email) = email else {
            return false;
        };
        self.customers
            .iter()
            .any(|c| Some(c.id) != except && c.email.as_deref() == Some(email.as_str()))
    }
}

fn paginate<T: Clone>(items: Vec<T>, pagination: &PaginationQuery) -> Page<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .collect();
    Page { items, total }
}

fn in_range(range: Option<DateRange>, ts: DateTime<Utc>) -> bool {
    range.is_none_or(|r| r.contains(ts))
}

/// ILIKE '%query%' over name, email and company
fn customer_matches(customer: &Customer, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    let contains = |v: &Option<String>| {
        v.as_deref()
            .is_some_and(|s| s.to_lowercase().contains(&query))
    };
    customer.name.to_lowercase().contains(&query)
        || contains(&customer.email)
        || contains(&customer.company)
}

fn ticket_matches(filter: &TicketFilter, ticket: &Ticket, now: DateTime<Utc>) -> bool {
    filter.stage.is_none_or(|s| ticket.stage == s)
        && filter.priority.is_none_or(|p| ticket.priority == p)
        && filter.customer_id.is_none_or(|c| ticket.customer_id == c)
        && filter
            .assigned_user_id
            .is_none_or(|u| ticket.assigned_user_id == Some(u))
        && (!filter.overdue || ticket.is_overdue(now))
}

/// GROUP BY over a key, omitting absent values
fn group_counts<K: Copy + Eq>(keys: impl Iterator<Item = K>) -> Vec<(K, i64)> {
    let mut counts: Vec<(K, i64)> = Vec::new();
    for key in keys {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

/// Every repository trait over one mutex-guarded state
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    failing_customer_reads: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Every later `CustomerRepository::find_by_id` fails like a dropped connection
    pub fn fail_customer_reads(&self) {
        self.failing_customer_reads.store(true, Ordering::SeqCst);
    }

    pub fn add_user(&self, name: &str, email: &str, verified: bool) -> User {
        let mut state = self.lock();
        let now = state.now();
        let user = User {
            created_at: now,
            updated_at: now,
            is_verified: verified,
            ..sample_user(name, email)
        };
        state.users.push(user.clone());
        user
    }

    pub async fn add_customer(&self, name: &str, email: Option<&str>) -> Customer {
        CustomerRepository::create(
            self,
            NewCustomer {
                name: name.to_string(),
                email: email.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    pub async fn add_ticket(&self, customer_id: Uuid, title: &str) -> Ticket {
        TicketRepository::create(
            self,
            NewTicket {
                title: title.to_string(),
                description: format!("{} details", title),
                customer_id,
                assigned_user_id: None,
                priority: TicketPriority::Medium,
                due_date: None,
            },
        )
        .await
        .unwrap()
    }

    pub async fn create_note(&self, note: NewNote) -> Note {
        NoteRepository::create(self, note).await.unwrap()
    }

    /// Overwrite a stored customer verbatim, timestamps included
    pub async fn put_customer(&self, customer: Customer) {
        let mut state = self.lock();
        if let Some(slot) = state.customers.iter_mut().find(|c| c.id == customer.id) {
            *slot = customer;
        }
    }

    /// Overwrite a stored ticket verbatim, timestamps included
    pub async fn put_ticket(&self, ticket: Ticket) {
        let mut state = self.lock();
        if let Some(slot) = state.tickets.iter_mut().find(|t| t.id == ticket.id) {
            *slot = ticket;
        }
    }

    pub async fn customer_count(&self) -> usize {
        self.lock().customers.len()
    }

    pub async fn ticket_count(&self) -> usize {
        self.lock().tickets.len()
    }

    pub async fn insert_activity_at(
        &self,
        activity: NewActivity,
        created_at: DateTime<Utc>,
    ) -> UserActivity {
        let stored = UserActivity {
            id: Uuid::new_v4(),
            user_id: activity.user_id,
            activity_type: activity.activity_type,
            description: Some(activity.description),
            metadata: activity.metadata,
            ip_address: activity.ip_address,
            user_agent: activity.user_agent,
            created_at,
        };
        self.lock().activities.push(stored.clone());
        stored
    }

    /// Stored activities in insertion order
    pub async fn activities(&self) -> Vec<UserActivity> {
        self.lock().activities.clone()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn create(&self, customer: NewCustomer) -> Result<Customer> {
        let mut state = self.lock();
        if state.email_taken(&customer.email, None) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }
        let now = state.now();
        let customer = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            company: customer.company,
            notes: customer.notes,
            created_at: now,
            updated_at: now,
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update(&self, customer: &Customer) -> Result<Customer> {
        let mut state = self.lock();
        if state.email_taken(&customer.email, Some(customer.id)) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }
        let now = state.now();
        let slot = state
            .customers
            .iter_mut()
            .find(|c| c.id == customer.id)
            .ok_or_else(|| AppError::NotFound(format!("Customer '{}' not found", customer.id)))?;
        *slot = Customer {
            updated_at: now,
            ..customer.clone()
        };
        Ok(slot.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        if self.failing_customer_reads.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.lock().customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        Ok(self
            .lock()
            .customers
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn list(&self, filter: &CustomerFilter) -> Result<Page<Customer>> {
        let state = self.lock();
        let with_tickets: HashSet<Uuid> = state.tickets.iter().map(|t| t.customer_id).collect();
        let company = filter.company.as_ref().map(|c| c.trim().to_lowercase());

        let mut items: Vec<Customer> = state
            .customers
            .iter()
            .filter(|c| {
                filter
                    .search
                    .as_ref()
                    .is_none_or(|q| customer_matches(c, q))
            })
            .filter(|c| {
                company.as_ref().is_none_or(|q| {
                    c.company
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(q))
                })
            })
            .filter(|c| {
                filter
                    .has_tickets
                    .is_none_or(|has| with_tickets.contains(&c.id) == has)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(paginate(items, &filter.pagination))
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Customer>> {
        let mut found: Vec<Customer> = self
            .lock()
            .customers
            .iter()
            .filter(|c| customer_matches(c, query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Customer>> {
        let mut items: Vec<Customer> = self
            .lock()
            .customers
            .iter()
            .filter(|c| in_range(range, c.created_at))
            .cloned()
            .collect();
        items.sort_by_key(|c| c.created_at);
        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.lock();
        if state.tickets.iter().any(|t| t.customer_id == id) {
            return Err(AppError::Conflict(
                "Cannot delete customer with associated tickets".to_string(),
            ));
        }
        let before = state.customers.len();
        state.customers.retain(|c| c.id != id);
        state.notes.retain(|n| n.customer_id != Some(id));
        Ok(state.customers.len() < before)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock().customers.len() as i64)
    }

    async fn count_with_tickets(&self) -> Result<i64> {
        let state = self.lock();
        let distinct: HashSet<Uuid> = state.tickets.iter().map(|t| t.customer_id).collect();
        Ok(distinct.len() as i64)
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .lock()
            .customers
            .iter()
            .filter(|c| c.created_at >= since)
            .count() as i64)
    }
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn create(&self, ticket: NewTicket) -> Result<Ticket> {
        let mut state = self.lock();
        let now = state.now();
        let ticket = Ticket {
            id: Uuid::new_v4(),
            title: ticket.title,
            description: ticket.description,
            customer_id: ticket.customer_id,
            assigned_user_id: ticket.assigned_user_id,
            stage: TicketStage::New,
            priority: ticket.priority,
            due_date: ticket.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket> {
        let mut state = self.lock();
        let now = state.now();
        let slot = state
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id)
            .ok_or_else(|| AppError::NotFound(format!("Ticket '{}' not found", ticket.id)))?;
        *slot = Ticket {
            updated_at: now,
            ..ticket.clone()
        };
        Ok(slot.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.lock().tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, filter: &TicketFilter, now: DateTime<Utc>) -> Result<Page<Ticket>> {
        let mut items: Vec<Ticket> = self
            .lock()
            .tickets
            .iter()
            .filter(|t| ticket_matches(filter, t, now))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, &filter.pagination))
    }

    async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<Ticket>> {
        let mut items: Vec<Ticket> = self
            .lock()
            .tickets
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn count_by_customer(&self, customer_id: Uuid) -> Result<i64> {
        Ok(self
            .lock()
            .tickets
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .count() as i64)
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>> {
        let mut items: Vec<Ticket> = self
            .lock()
            .tickets
            .iter()
            .filter(|t| t.is_overdue(now))
            .cloned()
            .collect();
        items.sort_by_key(|t| t.due_date);
        Ok(items)
    }

    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Ticket>> {
        let mut items: Vec<Ticket> = self
            .lock()
            .tickets
            .iter()
            .filter(|t| in_range(range, t.created_at))
            .cloned()
            .collect();
        items.sort_by_key(|t| t.created_at);
        Ok(items)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock().tickets.len() as i64)
    }

    async fn count_by_stage(&self) -> Result<Vec<(TicketStage, i64)>> {
        Ok(group_counts(self.lock().tickets.iter().map(|t| t.stage)))
    }

    async fn count_by_priority(&self) -> Result<Vec<(TicketPriority, i64)>> {
        Ok(group_counts(self.lock().tickets.iter().map(|t| t.priority)))
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> Result<i64> {
        Ok(self.lock().tickets.iter().filter(|t| t.is_overdue(now)).count() as i64)
    }

    async fn count_completed_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .lock()
            .tickets
            .iter()
            .filter(|t| t.completed_at.is_some_and(|at| at >= since))
            .count() as i64)
    }
}

#[async_trait]
impl NoteRepository for InMemoryStore {
    async fn create(&self, note: NewNote) -> Result<Note> {
        let mut state = self.lock();
        let created_at = state.now();
        let note = Note {
            id: Uuid::new_v4(),
            ticket_id: note.ticket_id(),
            customer_id: note.customer_id(),
            content: note.content,
            user_id: note.user_id,
            created_at,
        };
        state.notes.push(note.clone());
        Ok(note)
    }

    async fn list_for_ticket(&self, ticket_id: Uuid) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .lock()
            .notes
            .iter()
            .filter(|n| n.ticket_id == Some(ticket_id))
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .lock()
            .notes
            .iter()
            .filter(|n| n.customer_id == Some(customer_id))
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let mut users = self.lock().users.clone();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock().users.len() as i64)
    }

    async fn delete_account(&self, id: Uuid) -> Result<AccountDeletion> {
        let mut state = self.lock();

        let before = state.activities.len();
        state.activities.retain(|a| a.user_id != id);
        let activities_deleted = (before - state.activities.len()) as u64;

        let before = state.notes.len();
        state.notes.retain(|n| n.user_id != id);
        let notes_deleted = (before - state.notes.len()) as u64;

        let mut tickets_unassigned = 0;
        for ticket in state.tickets.iter_mut() {
            if ticket.assigned_user_id == Some(id) {
                ticket.assigned_user_id = None;
                tickets_unassigned += 1;
            }
        }

        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        let users_deleted = (before - state.users.len()) as u64;

        Ok(AccountDeletion {
            activities_deleted,
            notes_deleted,
            tickets_unassigned,
            users_deleted,
        })
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn create(&self, activity: NewActivity) -> Result<UserActivity> {
        let created_at = self.lock().now();
        Ok(self.insert_activity_at(activity, created_at).await)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>> {
        let mut items: Vec<UserActivity> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, pagination))
    }

    async fn list_by_type(
        &self,
        activity_type: ActivityType,
        pagination: &PaginationQuery,
    ) -> Result<Page<UserActivity>> {
        let mut items: Vec<UserActivity> = self
            .lock()
            .activities
            .iter()
            .filter(|a| a.activity_type == activity_type)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, pagination))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<UserActivity>> {
        let mut items = self.lock().activities.clone();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit.max(0) as usize);
        Ok(items)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.lock();
        let before = state.activities.len();
        state.activities.retain(|a| a.created_at >= cutoff);
        Ok((before - state.activities.len()) as u64)
    }
}

pub fn actor(user: &User) -> Actor {
    Actor::new(user.id, user.email.clone())
}

/// An unsaved, verified user
pub fn sample_user(name: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: name.to_string(),
        password_hash: Password(16..24).fake(),
        is_verified: true,
        verification_token: None,
        reset_token: None,
        reset_token_expires: None,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved customer with only a name
pub fn sample_customer(name: &str) -> Customer {
    let now = Utc::now();
    Customer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: None,
        phone: None,
        company: None,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// An unsaved new, medium-priority ticket
pub fn sample_ticket(customer_id: Uuid) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::new_v4(),
        title: "Sample ticket".to_string(),
        description: "Something needs attention".to_string(),
        customer_id,
        assigned_user_id: None,
        stage: TicketStage::New,
        priority: TicketPriority::Medium,
        due_date: None,
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Mailer that keeps every delivered message
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Every later send returns an error and records nothing
    pub fn fail_next_sends(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalServiceError(
                "mail relay unavailable".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Every feature router behind an already-authenticated, verified user
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub user: User,
    _backup_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let user = store.add_user("Test User", "tester@example.com", true);
        let backup_dir = tempfile::tempdir().unwrap();

        // entries are queued but never persisted
        let (logger, _activities) = ActivityLogger::channel(64);
        let notifications = Arc::new(
            NotificationService::new(
                Arc::new(RecordingMailer::default()),
                "noreply@example.com".to_string(),
            )
            .unwrap(),
        );

        let customers = Arc::new(CustomerService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            logger.clone(),
        ));
        let tickets = Arc::new(TicketService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            logger.clone(),
            notifications,
        ));
        let activities = Arc::new(ActivityService::new(store.clone()));
        let imports = Arc::new(ImportService::new(customers.clone(), logger.clone()));
        let exports = Arc::new(ExportService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            logger,
        ));
        let backups = Arc::new(BackupService::new(
            exports.clone(),
            store.clone(),
            backup_dir.path(),
        ));

        let authenticated = AuthenticatedUser {
            user_id: user.id,
            email: user.email.clone(),
        };
        let app = Router::new()
            .merge(import_routes::routes(imports))
            .merge(customer_routes::routes(customers))
            .merge(ticket_routes::routes(tickets))
            .merge(activity_routes::routes(activities))
            .merge(backup_routes::routes(backups))
            .merge(export_routes::routes(exports))
            .layer(axum::middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let authenticated = authenticated.clone();
                    async move {
                        request.extensions_mut().insert(authenticated);
                        next.run(request).await
                    }
                },
            ));

        Self {
            server: TestServer::new(app).unwrap(),
            store,
            user,
            _backup_dir: backup_dir,
        }
    }
}
