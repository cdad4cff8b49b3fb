//! # Kernel
//!
//! The process-wide scheduler instance and the API the startup code and
//! the main loop use to drive it.
//!
//! ## Startup Sequence
//!
//! ```text
//! reset_handler (cortex-m-rt)
//!   └─► main()
//!         ├─► kernel::init()      ← Reset task table, start SysTick
//!         ├─► kernel::add_task()  ← Register tasks (×N)
//!         └─► kernel::run()       ← Dispatch loop (no return)
//!
//! SysTick ──► SCHEDULER.tick()    ← Every 1 / TICK_HZ seconds
//! ```

use cortex_m::peripheral::SYST;

use crate::arch::cortex_m4;
use crate::error::SchedulerError;
use crate::scheduler::Scheduler;
use crate::task::{Task, TaskId, TaskStatus};

/// Global scheduler instance.
///
/// Shared by the SysTick handler and the main loop. It guards its own
/// table, so no `static mut` or raw pointer is needed.
pub static SCHEDULER: Scheduler = Scheduler::new();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Reset the task table and start SysTick at `TICK_HZ`.
///
/// Must be called before any other kernel function, from the main thread.
pub fn init(syst: &mut SYST) -> Result<(), SchedulerError> {
    SCHEDULER.init(syst)
}

/// Register a periodic task. See `Scheduler::add_task`.
///
/// # Example
/// ```ignore
/// fn blink() { /* toggle an LED */ }
/// kernel::add_task(1, &blink, 2)?; // every 2 ticks
/// ```
pub fn add_task(
    id: TaskId,
    task: &'static dyn Task,
    period: u16,
) -> Result<usize, SchedulerError> {
    SCHEDULER.add_task(id, task, period)
}

pub fn delete_task(id: TaskId) -> Result<(), SchedulerError> {
    SCHEDULER.delete_task(id)
}

pub fn task_status(id: TaskId) -> Result<TaskStatus, SchedulerError> {
    SCHEDULER.task_status(id)
}

/// Run one dispatch pass. Returns the number of tasks invoked.
pub fn dispatch_tasks() -> usize {
    SCHEDULER.dispatch()
}

/// Dispatch forever. **Does not return.**
///
/// Between passes the core sleeps until the next interrupt whenever no
/// task is due; a task with period 0 keeps it awake.
pub fn run() -> ! {
    loop {
        if dispatch_tasks() == 0 {
            cortex_m4::wait_for_tick(|| SCHEDULER.has_due());
        }
    }
}
