use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::customers::models::{Customer, CustomerFilter, NewCustomer};
use crate::shared::types::{DateRange, Page};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, company, notes, created_at, updated_at";

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Customer with this email already exists";

/// Persistence for customers
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a customer. A taken email yields `AppError::Conflict`.
    async fn create(&self, customer: NewCustomer) -> Result<Customer>;

    async fn update(&self, customer: &Customer) -> Result<Customer>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>>;

    /// Filtered page, newest first
    async fn list(&self, filter: &CustomerFilter) -> Result<Page<Customer>>;

    /// Name/email/company substring search ordered by name
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Customer>>;

    /// Customers in creation order, optionally restricted to a creation window
    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Customer>>;

    /// Returns false when no row was deleted
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn count(&self) -> Result<i64>;

    async fn count_with_tickets(&self) -> Result<i64>;

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64>;
}

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn like_pattern(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| format!("%{}%", v.trim()))
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: NewCustomer) -> Result<Customer> {
        let sql = format!(
            r#"
            INSERT INTO customers (name, email, phone, company, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.company)
            .bind(&customer.notes)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create customer: {:?}", e);
                AppError::from_constraint(e, DUPLICATE_EMAIL_MESSAGE)
            })
    }

    async fn update(&self, customer: &Customer) -> Result<Customer> {
        let sql = format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, phone = $4, company = $5, notes = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(customer.id)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.company)
            .bind(&customer.notes)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update customer {}: {:?}", customer.id, e);
                AppError::from_constraint(e, DUPLICATE_EMAIL_MESSAGE)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Customer '{}' not found", customer.id)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get customer by ID: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers WHERE email = $1",
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get customer by email: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(&self, filter: &CustomerFilter) -> Result<Page<Customer>> {
        // $1 search, $2 company, $3 has_tickets; NULL disables a filter
        let where_clause = r#"
            WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1 OR company ILIKE $1)
              AND ($2::text IS NULL OR company ILIKE $2)
              AND ($3::boolean IS NULL
                   OR EXISTS (SELECT 1 FROM tickets t WHERE t.customer_id = customers.id) = $3)
        "#;

        let search = like_pattern(&filter.search);
        let company = like_pattern(&filter.company);

        let count_sql = format!("SELECT COUNT(*) FROM customers {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&search)
            .bind(&company)
            .bind(filter.has_tickets)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count customers: {:?}", e);
                AppError::Database(e)
            })?;

        let sql = format!(
            r#"
            SELECT {}
            FROM customers
            {}
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            CUSTOMER_COLUMNS, where_clause
        );

        let items = sqlx::query_as::<_, Customer>(&sql)
            .bind(&search)
            .bind(&company)
            .bind(filter.has_tickets)
            .bind(filter.pagination.limit())
            .bind(filter.pagination.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list customers: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(Page { items, total })
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Customer>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM customers
            WHERE name ILIKE $1 OR email ILIKE $1 OR company ILIKE $1
            ORDER BY name
            LIMIT $2
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(format!("%{}%", query.trim()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to search customers: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list_created_between(&self, range: Option<DateRange>) -> Result<Vec<Customer>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM customers
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at <= $2)
            ORDER BY created_at
            "#,
            CUSTOMER_COLUMNS
        );

        sqlx::query_as::<_, Customer>(&sql)
            .bind(range.map(|r| r.start))
            .bind(range.map(|r| r.end))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list customers for export: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete customer {}: {:?}", id, e);
                AppError::from_constraint(e, "Cannot delete customer with associated tickets")
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count customers: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count_with_tickets(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT customer_id) FROM tickets")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count customers with tickets: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count recent customers: {:?}", e);
                AppError::Database(e)
            })
    }
}
