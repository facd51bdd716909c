//! Core engine: the fetch → compare → persist → notify pipeline and the
//! interval loop that drives it.

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{Pipeline, RunOutcome};
pub use scheduler::{run_schedule, ScheduleReport};
