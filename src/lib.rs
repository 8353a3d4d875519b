pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod report;
pub mod results;
pub mod voting;

pub use error::{Result, TallyError};
pub use voting::{aggregate, aggregate_event, percentage, ChartRow, PollResult};
