//! CSV and JSON exports of the CRM data.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::ExportService;
