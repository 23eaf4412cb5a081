use crate::model::Ms;

/// Errors at the construction and registration boundaries. Booking itself
/// never fails with an error: an unavailable slot is an ordinary `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    InvalidSlot { start: Ms, duration: Ms },
    InvalidCalendarDate,
    InvalidResource(&'static str),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidSlot { start, duration } => {
                write!(f, "invalid slot: start {start}, duration {duration}ms (must be positive)")
            }
            SchedulerError::InvalidCalendarDate => write!(f, "invalid calendar date or time of day"),
            SchedulerError::InvalidResource(msg) => write!(f, "invalid resource: {msg}"),
            SchedulerError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for SchedulerError {}
