mod activity_worker;

pub use activity_worker::*;
