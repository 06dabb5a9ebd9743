//! Backups of the CRM data on the local file system, scheduled maintenance
//! and account deletion.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod workers;

pub use services::BackupService;
pub use workers::MaintenanceWorker;
