//! # Architecture Abstraction Layer
//!
//! Provides the hardware boundary for the scheduler: the tick source and
//! the idle hook. Currently implements the Cortex-M4 port; extensible to
//! other architectures by adding sibling modules.

use crate::error::SchedulerError;

pub mod cortex_m4;

/// Periodic interrupt that drives `Scheduler::tick()`.
///
/// Implementations must fire at a fixed cadence of `tick_hz`, call the
/// scheduler's tick handler on every firing and re-arm themselves.
pub trait TickSource {
    /// Arm the source. Fails with `InvalidTickRate` if it cannot fire at
    /// `tick_hz`, in which case it stays stopped.
    fn start(&mut self, tick_hz: u32) -> Result<(), SchedulerError>;
}
