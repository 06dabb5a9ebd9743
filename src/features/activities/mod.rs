//! Audit log of user actions.
//!
//! Writes are fire-and-forget through [`ActivityLogger`] and land in the
//! database via [`ActivityWorker`]; reads go through [`ActivityService`].

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod workers;

pub use repositories::{ActivityRepository, PgActivityRepository};
pub use services::{ActivityLogger, ActivityService};
pub use workers::ActivityWorker;
