mod mailer;
mod notification_service;

pub use mailer::*;
pub use notification_service::*;
