mod activity;
mod actor;

pub use activity::*;
pub use actor::*;
