//! # Task Record
//!
//! Defines the task model: one record per table slot, holding the callback
//! to invoke, its fixed period and the delay left until it next runs.
//!
//! Tasks are plain run-to-completion callbacks. They take no arguments,
//! return nothing, and own whatever state they keep (a toggle flag, a
//! counter); the scheduler only borrows the callback long enough to call it.

use core::fmt;

/// Externally assigned task identifier. Every value is usable; a free slot
/// carries no id at all.
pub type TaskId = u8;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Lifecycle state of a table slot.
///
/// ```text
///             add_task()              dispatch
///  ┌─────────┐ ──────────► ┌──────────┐ ──────► ┌─────────┐
///  │ Stopped │             │ Runnable │         │ Running │
///  └─────────┘ ◄────────── └──────────┘ ◄────── └─────────┘
///       ▲      delete_task()     │     callback returned
///       │                        │ fault_task()
///       │   delete_task()   ┌─────────┐
///       └────────────────── │  Error  │
///                           └─────────┘
/// ```
///
/// `delete_task()` returns a slot to `Stopped` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskStatus {
    /// Counting down; invoked once the delay reaches zero.
    Runnable,
    /// Callback is executing. Only held for the length of one invocation.
    Running,
    /// Slot is free, or the task was deleted.
    Stopped,
    /// Task was faulted through `fault_task()`; it is neither counted down
    /// nor dispatched until deleted.
    Error,
}

// ---------------------------------------------------------------------------
// Callback capability
// ---------------------------------------------------------------------------

/// A periodic job. Must return promptly: the dispatcher does not preempt it.
///
/// Implemented for every `Fn() + Sync`, so `fn` items and closures that keep
/// their state in atomics can be registered directly.
pub trait Task: Sync {
    fn run(&self);
}

impl<F> Task for F
where
    F: Fn() + Sync,
{
    #[inline]
    fn run(&self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Task record
// ---------------------------------------------------------------------------

/// Bookkeeping entry for one slot of the task table.
#[derive(Clone, Copy)]
pub struct TaskRecord {
    /// Id of the task that last claimed this slot. `None` until first use.
    pub id: Option<TaskId>,

    /// Callback to invoke. Borrowed, never owned.
    pub task: Option<&'static dyn Task>,

    /// Ticks left until the next invocation.
    pub delay: u16,

    /// Ticks between invocations. Fixed when the task is added.
    pub period: u16,

    /// Current lifecycle state.
    pub status: TaskStatus,

    /// Completed invocations since the task was added.
    pub runs: u32,

    /// Ticks that arrived while the task was already due. Non-zero means
    /// the dispatcher fell behind the tick source.
    pub missed_ticks: u16,
}

impl TaskRecord {
    /// A free slot. Used to initialize the table.
    pub const EMPTY: Self = Self {
        id: None,
        task: None,
        delay: 0,
        period: 0,
        status: TaskStatus::Stopped,
        runs: 0,
        missed_ticks: 0,
    };

    /// Claim this slot for a new task. The first run is one full period away.
    pub fn init(&mut self, id: TaskId, task: &'static dyn Task, period: u16) {
        *self = Self {
            id: Some(id),
            task: Some(task),
            delay: period,
            period,
            status: TaskStatus::Runnable,
            runs: 0,
            missed_ticks: 0,
        };
    }

    /// Slot can be claimed by `add_task`.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.status == TaskStatus::Stopped
    }

    /// Slot holds a task that has not been deleted.
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_free()
    }

    /// Runnable with no delay left.
    #[inline]
    pub fn is_due(&self) -> bool {
        self.status == TaskStatus::Runnable && self.delay == 0
    }

    /// Account for one elapsed tick. Only Runnable records count down; the
    /// delay is clamped at zero and the surplus tick recorded as missed.
    ///
    /// A period-0 task is due on every pass by definition, so ticks never
    /// count as missed for it.
    pub fn tick(&mut self) {
        if self.status != TaskStatus::Runnable {
            return;
        }
        if self.delay == 0 {
            if self.period != 0 {
                self.missed_ticks = self.missed_ticks.saturating_add(1);
            }
        } else {
            self.delay -= 1;
        }
    }

    /// Move a due record to Running and hand out its callback.
    pub fn begin_run(&mut self) -> Option<&'static dyn Task> {
        if !self.is_due() {
            return None;
        }
        let task = self.task?;
        self.status = TaskStatus::Running;
        Some(task)
    }

    /// Callback returned: rearm for the next period.
    ///
    /// A record that left Running while its callback executed (deleted or
    /// faulted itself) keeps the state it was put in.
    pub fn finish_run(&mut self) {
        if self.status != TaskStatus::Running {
            return;
        }
        self.delay = self.period;
        self.runs = self.runs.wrapping_add(1);
        self.status = TaskStatus::Runnable;
    }

    /// Snapshot of this record for callers outside the scheduler.
    pub fn info(&self, slot: usize) -> Option<TaskInfo> {
        Some(TaskInfo {
            id: self.id?,
            slot,
            status: self.status,
            delay: self.delay,
            period: self.period,
            runs: self.runs,
            missed_ticks: self.missed_ticks,
        })
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("period", &self.period)
            .field("status", &self.status)
            .field("runs", &self.runs)
            .field("missed_ticks", &self.missed_ticks)
            .finish_non_exhaustive()
    }
}

/// Copy of a task record, as returned by `Scheduler::task_info()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskInfo {
    pub id: TaskId,
    pub slot: usize,
    pub status: TaskStatus,
    pub delay: u16,
    pub period: u16,
    pub runs: u32,
    pub missed_ticks: u16,
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
