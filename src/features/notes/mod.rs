//! Free-text notes attached to a ticket or a customer.
//!
//! Notes have no endpoints of their own; tickets, customers and exports read
//! and write them through [`NoteRepository`].

pub mod dtos;
pub mod models;
pub mod repositories;

pub use repositories::{NoteRepository, PgNoteRepository};
