mod csv_parser;
mod field_mapping;
mod import_service;
mod row_validation;

pub use csv_parser::*;
pub use field_mapping::*;
pub use import_service::*;
pub use row_validation::*;
