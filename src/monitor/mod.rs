mod controller;
mod loop_worker;

pub use controller::MonitorController;
pub use loop_worker::{perform_refresh, RefreshOutcome};
