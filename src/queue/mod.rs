pub mod manager;

pub use manager::{BatchSummary, QueueManager, TaskResult, TaskStatus};
