pub mod activities;
pub mod auth;
pub mod backups;
pub mod customers;
pub mod exports;
pub mod imports;
pub mod notes;
pub mod notifications;
pub mod tickets;
pub mod users;
