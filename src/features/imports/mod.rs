//! Bulk customer import from CSV files.
//!
//! The pipeline has three stages run in order: parsing the raw bytes,
//! matching header names to customer fields, then validating and creating
//! each row independently.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::ImportService;
