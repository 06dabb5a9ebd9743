mod activity_logger;
mod activity_service;

pub use activity_logger::*;
pub use activity_service::*;
