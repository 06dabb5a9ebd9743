mod backup_handler;

pub use backup_handler::*;
