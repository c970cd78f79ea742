//! Application use cases. Orchestrate domain logic via ports.

pub mod deletion;
pub mod history;
pub mod sweep_service;

pub use deletion::{DeletionPlan, DeletionStats, DeletionStrategist};
pub use history::HistoryPaginator;
pub use sweep_service::{CHANNEL_PAUSE, SweepReport, SweepService};
