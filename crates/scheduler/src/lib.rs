//! # CPA Report Scheduler
//!
//! Binds the `mailer::Dispatcher` to time: one weekly all-users trigger in the
//! process-local time zone, plus on-demand runs for a single user or for
//! everyone. `ReportScheduler` is an owned value with an explicit
//! `start`/`stop` lifecycle.

pub mod error;
pub mod runner;
pub mod schedule;

pub use error::SchedulerError;
pub use runner::{Clock, ReportScheduler};
pub use schedule::WeeklySchedule;
