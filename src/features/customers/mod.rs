//! Customer records: CRUD, search and counts.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::{CustomerRepository, PgCustomerRepository};
pub use services::CustomerService;
