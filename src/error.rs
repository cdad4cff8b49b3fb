//! # Scheduler Errors
//!
//! Every failure in the scheduler is local and recoverable: the caller gets
//! an error value back and the table is left as it was.

use core::fmt;

use crate::task::TaskId;

/// Reason a table management call did not take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerError {
    /// Every slot already holds an active task.
    TableFull,
    /// An active task already uses this id.
    DuplicateId(TaskId),
    /// No record carries this id.
    NotFound(TaskId),
    /// The tick source cannot fire at this rate (Hz).
    InvalidTickRate(u32),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "task table full"),
            Self::DuplicateId(id) => write!(f, "task id {} already active", id),
            Self::NotFound(id) => write!(f, "task id {} not found", id),
            Self::InvalidTickRate(hz) => write!(f, "tick rate {} Hz not supported", hz),
        }
    }
}
