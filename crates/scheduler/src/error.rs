use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Invalid trigger time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}
