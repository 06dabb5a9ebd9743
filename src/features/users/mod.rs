//! CRM user accounts.
//!
//! Accounts are created and authenticated elsewhere; this service reads them to
//! resolve ticket assignees and note authors, exports them, and deletes them on
//! request (see `backups`).

pub mod dtos;
pub mod models;
pub mod repositories;

pub use repositories::{PgUserRepository, UserRepository};
