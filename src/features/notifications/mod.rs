//! Outbound email. Sending is best-effort: failures are logged and never
//! propagate to the operation that triggered them.

pub mod services;

pub use services::{HttpMailer, LogMailer, Mailer, NotificationService};
