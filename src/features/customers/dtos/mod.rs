mod customer_dto;

pub use customer_dto::*;
