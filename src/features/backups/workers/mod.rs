mod maintenance_worker;

pub use maintenance_worker::*;
