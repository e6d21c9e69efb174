pub mod controller;
pub mod loop_worker;
pub mod offset;

pub use controller::SchedulerController;
pub use offset::{next_fire_after, plan_next_fire, SummaryOffset};
