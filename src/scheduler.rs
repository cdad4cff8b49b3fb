//! # Scheduler
//!
//! Cooperative, fixed-slot periodic scheduler. Tasks are zero-argument
//! callbacks invoked every `period` ticks and run to completion; nothing is
//! preempted and nothing is allocated.
//!
//! ## Execution Contexts
//!
//! ```text
//!  Tick source (ISR)          Main loop
//!  ─────────────────          ─────────────────────────────────────
//!  tick()                     dispatch()
//!   └ delay -= 1 for           └ per slot, in table order:
//!     Runnable tasks              1. claim   Runnable ∧ delay 0 → Running
//!                                 2. run     callback, outside the lock
//!                                 3. rearm   delay = period, → Runnable
//!                             add_task() / delete_task() / task_status()
//! ```
//!
//! The task table is the only state shared between the two contexts. Every
//! access goes through a critical section; the callback itself runs with
//! interrupts enabled, so ticks keep being counted while it executes and it
//! may call back into the scheduler (for example to delete itself).

use core::cell::RefCell;

use critical_section::Mutex;

use crate::arch::TickSource;
use crate::config::{MAX_TASKS, TICK_HZ};
use crate::error::SchedulerError;
use crate::sync::{self, Shared};
use crate::table::TaskTable;
use crate::task::{Task, TaskId, TaskInfo, TaskStatus};

/// Interrupt-safe owner of the task table.
///
/// All methods take `&self`, so a single instance can live in a `static`
/// and be reached from both the tick interrupt and the main loop.
pub struct Scheduler<const N: usize = MAX_TASKS> {
    table: Shared<TaskTable<N>>,
}

impl<const N: usize> Scheduler<N> {
    /// Scheduler with every slot Stopped.
    pub const fn new() -> Self {
        Self {
            table: Mutex::new(RefCell::new(TaskTable::new())),
        }
    }

    #[inline]
    fn with_table<R>(&self, f: impl FnOnce(&mut TaskTable<N>) -> R) -> R {
        sync::critical_section(|cs| f(&mut self.table.borrow_ref_mut(cs)))
    }

    // -----------------------------------------------------------------------
    // Table management API (main loop only)
    // -----------------------------------------------------------------------

    /// Reset every slot to Stopped, then start the tick source at `TICK_HZ`.
    ///
    /// Call once at startup, before adding tasks. Calling it again wipes the
    /// table. The table is reset even if the tick source refuses to start.
    pub fn init<S>(&self, source: &mut S) -> Result<(), SchedulerError>
    where
        S: TickSource + ?Sized,
    {
        self.with_table(|table| table.reset());
        if let Err(e) = source.start(TICK_HZ) {
            log_error!("tick source not started: {}", e);
            return Err(e);
        }
        log_info!("scheduler: {} slots, {} Hz tick", N, TICK_HZ);
        Ok(())
    }

    /// Register `task` to run every `period` ticks, first run one full
    /// period from now. A `period` of 0 runs the task on every dispatch
    /// pass.
    ///
    /// # Returns
    /// - `Ok(slot)` — table slot the task landed in
    /// - `Err(TableFull)` — every slot is in use
    /// - `Err(DuplicateId)` — an active task already has this id
    pub fn add_task(
        &self,
        id: TaskId,
        task: &'static dyn Task,
        period: u16,
    ) -> Result<usize, SchedulerError> {
        let result = self.with_table(|table| table.add(id, task, period));
        match result {
            Ok(slot) => log_info!("task {} added to slot {}, period {}", id, slot, period),
            Err(e) => log_warn!("task {} rejected: {}", id, e),
        }
        result
    }

    /// Stop the task with this id, whatever its state. The callback is not
    /// touched; a task deleting itself finishes its current run.
    pub fn delete_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        let slot = self.with_table(|table| table.remove(id))?;
        log_info!("task {} deleted from slot {}", id, slot);
        Ok(())
    }

    /// Move an active task to `Error`. It is no longer counted down or
    /// dispatched until deleted.
    pub fn fault_task(&self, id: TaskId) -> Result<(), SchedulerError> {
        let slot = self.with_table(|table| table.fault(id))?;
        log_warn!("task {} in slot {} faulted", id, slot);
        Ok(())
    }

    /// Status of the task with this id.
    ///
    /// `Err(NotFound)` means no record carries the id; `Ok(Error)` means
    /// the task exists and was faulted.
    pub fn task_status(&self, id: TaskId) -> Result<TaskStatus, SchedulerError> {
        self.with_table(|table| table.status(id))
    }

    pub fn task_info(&self, id: TaskId) -> Result<TaskInfo, SchedulerError> {
        self.with_table(|table| table.info(id))
    }

    pub fn active_count(&self) -> usize {
        self.with_table(|table| table.active_count())
    }

    /// Ticks delivered since `init`. Wraps.
    pub fn ticks(&self) -> u32 {
        self.with_table(|table| table.ticks())
    }

    /// Some task is waiting to be dispatched.
    pub fn has_due(&self) -> bool {
        self.with_table(|table| table.has_due())
    }

    // -----------------------------------------------------------------------
    // Tick handler (interrupt context)
    // -----------------------------------------------------------------------

    /// One tick elapsed. Counts down every Runnable task; Stopped, Running
    /// and faulted tasks keep their delay.
    pub fn tick(&self) {
        self.with_table(|table| table.tick());
    }

    // -----------------------------------------------------------------------
    // Dispatcher (main loop only)
    // -----------------------------------------------------------------------

    /// One dispatch pass: run every due task, in table order.
    ///
    /// Each callback completes before the next slot is checked. Returns the
    /// number of callbacks invoked.
    pub fn dispatch(&self) -> usize {
        let mut dispatched = 0;
        for slot in 0..N {
            let Some(task) = self.with_table(|table| table.begin_run(slot)) else {
                continue;
            };
            log_trace!("slot {} dispatched", slot);
            task.run();
            self.with_table(|table| table.finish_run(slot));
            dispatched += 1;
        }
        dispatched
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Callback that appends `tag` to `log` when run.
    fn recorder(log: &'static StdMutex<Vec<u8>>, tag: u8) -> &'static dyn Task {
        Box::leak(Box::new(move || log.lock().unwrap().push(tag)))
    }

    fn new_log() -> &'static StdMutex<Vec<u8>> {
        Box::leak(Box::new(StdMutex::new(Vec::new())))
    }

    fn noop() {}

    #[derive(Default)]
    struct MockTickSource {
        started_hz: Option<u32>,
    }

    impl TickSource for MockTickSource {
        fn start(&mut self, tick_hz: u32) -> Result<(), SchedulerError> {
            self.started_hz = Some(tick_hz);
            Ok(())
        }
    }

    fn started<const N: usize>() -> Scheduler<N> {
        let sched = Scheduler::new();
        sched.init(&mut MockTickSource::default()).unwrap();
        sched
    }

    #[test]
    fn test_init_resets_table_and_starts_tick_source() {
        let sched: Scheduler = Scheduler::new();
        sched.add_task(1, &noop, 1).unwrap();
        sched.tick();

        let mut source = MockTickSource::default();
        sched.init(&mut source).unwrap();

        assert_eq!(source.started_hz, Some(TICK_HZ));
        assert_eq!(sched.active_count(), 0);
        assert_eq!(sched.ticks(), 0);
        assert_eq!(sched.task_status(1), Err(SchedulerError::NotFound(1)));
    }

    struct DeadTickSource;

    impl TickSource for DeadTickSource {
        fn start(&mut self, tick_hz: u32) -> Result<(), SchedulerError> {
            Err(SchedulerError::InvalidTickRate(tick_hz))
        }
    }

    #[test]
    fn test_init_reports_tick_source_failure() {
        let sched: Scheduler = Scheduler::new();
        sched.add_task(1, &noop, 1).unwrap();

        assert_eq!(
            sched.init(&mut DeadTickSource),
            Err(SchedulerError::InvalidTickRate(TICK_HZ))
        );
        assert_eq!(sched.active_count(), 0);
    }

    #[test]
    fn test_added_tasks_are_runnable() {
        let sched = started::<MAX_TASKS>();
        for id in 1..=3 {
            sched.add_task(id, &noop, id as u16).unwrap();
            assert_eq!(sched.task_status(id), Ok(TaskStatus::Runnable));
        }
    }

    #[test]
    fn test_steady_state_periodicity() {
        let sched = started::<MAX_TASKS>();
        let log = new_log();
        sched.add_task(1, recorder(log, 1), 3).unwrap();

        for cycle in 1..=4 {
            for _ in 0..3 {
                assert_eq!(sched.dispatch(), 0);
                sched.tick();
            }
            assert_eq!(sched.dispatch(), 1);
            assert_eq!(log.lock().unwrap().len(), cycle);

            let info = sched.task_info(1).unwrap();
            assert_eq!(info.delay, info.period);
            assert_eq!(info.runs, cycle as u32);
            assert_eq!(info.status, TaskStatus::Runnable);
        }
    }

    #[test]
    fn test_capacity_limit() {
        let sched = started::<MAX_TASKS>();
        for id in 0..MAX_TASKS as TaskId {
            sched.add_task(id, &noop, 1).unwrap();
        }
        let extra = MAX_TASKS as TaskId;
        assert_eq!(sched.add_task(extra, &noop, 1), Err(SchedulerError::TableFull));
        assert_eq!(sched.active_count(), MAX_TASKS);
        assert_eq!(sched.task_status(extra), Err(SchedulerError::NotFound(extra)));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let sched = started::<3>();
        sched.add_task(1, &noop, 2).unwrap();
        sched.tick();
        let before = sched.task_info(1).unwrap();

        assert_eq!(sched.delete_task(7), Err(SchedulerError::NotFound(7)));
        assert_eq!(sched.task_info(1), Ok(before));
        assert_eq!(sched.active_count(), 1);
    }

    #[test]
    fn test_simultaneous_tasks_dispatch_in_slot_order() {
        let sched = started::<4>();
        let log = new_log();
        sched.add_task(30, recorder(log, 30), 2).unwrap();
        sched.add_task(10, recorder(log, 10), 2).unwrap();
        sched.add_task(20, recorder(log, 20), 1).unwrap();

        sched.tick();
        sched.tick();
        // Task 20 has missed one tick but still runs once per pass
        assert_eq!(sched.dispatch(), 3);
        assert_eq!(*log.lock().unwrap(), vec![30, 10, 20]);
    }

    #[test]
    fn test_period_one_and_two_scenario() {
        let sched = started::<MAX_TASKS>();
        let log = new_log();
        sched.add_task(b'A', recorder(log, b'A'), 1).unwrap();
        sched.add_task(b'B', recorder(log, b'B'), 2).unwrap();

        sched.tick();
        sched.dispatch();
        assert_eq!(*log.lock().unwrap(), vec![b'A']);

        sched.tick();
        sched.dispatch();
        assert_eq!(*log.lock().unwrap(), vec![b'A', b'A', b'B']);
    }

    #[test]
    fn test_unknown_id_is_distinct_from_error_status() {
        let sched = started::<MAX_TASKS>();
        sched.add_task(1, &noop, 1).unwrap();
        sched.fault_task(1).unwrap();

        assert_eq!(sched.task_status(1), Ok(TaskStatus::Error));
        assert_eq!(sched.task_status(2), Err(SchedulerError::NotFound(2)));
        assert_ne!(sched.task_status(1), sched.task_status(2));
    }

    #[test]
    fn test_stopped_task_is_not_counted_down() {
        let sched = started::<MAX_TASKS>();
        sched.add_task(1, &noop, 3).unwrap();
        sched.delete_task(1).unwrap();

        sched.tick();
        sched.tick();
        let info = sched.task_info(1).unwrap();
        assert_eq!(info.status, TaskStatus::Stopped);
        assert_eq!(info.delay, 3);
        assert_eq!(sched.dispatch(), 0);
    }

    #[test]
    fn test_running_task_is_not_counted_down() {
        static SCHED: Scheduler<2> = Scheduler::new();
        static OBSERVED: StdMutex<Option<TaskInfo>> = StdMutex::new(None);

        fn ticking_task() {
            // Tick interrupt arriving mid-callback
            SCHED.tick();
            *OBSERVED.lock().unwrap() = SCHED.task_info(1).ok();
        }

        SCHED.init(&mut MockTickSource::default()).unwrap();
        SCHED.add_task(1, &ticking_task, 0).unwrap();
        SCHED.add_task(2, &noop, 5).unwrap();

        assert_eq!(SCHED.dispatch(), 1);

        let seen = OBSERVED.lock().unwrap().unwrap();
        assert_eq!(seen.status, TaskStatus::Running);
        assert_eq!(seen.delay, 0);
        assert_eq!(seen.missed_ticks, 0);
        // The other task did see the tick
        assert_eq!(SCHED.task_info(2).unwrap().delay, 4);
        assert_eq!(SCHED.task_status(1), Ok(TaskStatus::Runnable));
    }

    #[test]
    fn test_task_can_delete_itself() {
        static SCHED: Scheduler<2> = Scheduler::new();
        static RUNS: AtomicU32 = AtomicU32::new(0);

        fn one_shot() {
            RUNS.fetch_add(1, Ordering::Relaxed);
            SCHED.delete_task(4).unwrap();
        }

        SCHED.init(&mut MockTickSource::default()).unwrap();
        SCHED.add_task(4, &one_shot, 0).unwrap();

        assert_eq!(SCHED.dispatch(), 1);
        assert_eq!(SCHED.dispatch(), 0);
        assert_eq!(RUNS.load(Ordering::Relaxed), 1);
        assert_eq!(SCHED.task_status(4), Ok(TaskStatus::Stopped));
        assert_eq!(SCHED.task_info(4).unwrap().runs, 0);
    }

    #[test]
    fn test_task_can_fault_itself() {
        static SCHED: Scheduler<2> = Scheduler::new();

        fn failing() {
            SCHED.fault_task(6).unwrap();
        }

        SCHED.init(&mut MockTickSource::default()).unwrap();
        SCHED.add_task(6, &failing, 0).unwrap();

        assert_eq!(SCHED.dispatch(), 1);
        assert_eq!(SCHED.task_status(6), Ok(TaskStatus::Error));
        SCHED.tick();
        assert_eq!(SCHED.dispatch(), 0);

        SCHED.delete_task(6).unwrap();
        assert_eq!(SCHED.task_status(6), Ok(TaskStatus::Stopped));
    }

    #[test]
    fn test_zero_period_runs_every_pass() {
        let sched = started::<2>();
        let counter: &'static AtomicU32 = Box::leak(Box::new(AtomicU32::new(0)));
        let task: &'static dyn Task = Box::leak(Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        sched.add_task(1, task, 0).unwrap();

        for _ in 0..5 {
            assert_eq!(sched.dispatch(), 1);
        }
        assert_eq!(counter.load(Ordering::Relaxed), 5);
        assert!(sched.has_due());
    }

    #[test]
    fn test_zero_period_task_keeping_pace_misses_nothing() {
        let sched = started::<2>();
        sched.add_task(1, &noop, 0).unwrap();

        for _ in 0..10 {
            assert_eq!(sched.dispatch(), 1);
            sched.tick();
        }
        assert_eq!(sched.dispatch(), 1);

        let info = sched.task_info(1).unwrap();
        assert_eq!(info.runs, 11);
        assert_eq!(info.missed_ticks, 0);
    }

    #[test]
    fn test_late_dispatch_clamps_and_counts_missed_ticks() {
        let sched = started::<2>();
        let log = new_log();
        sched.add_task(1, recorder(log, 1), 2).unwrap();

        for _ in 0..5 {
            sched.tick();
        }
        let info = sched.task_info(1).unwrap();
        assert_eq!(info.delay, 0);
        assert_eq!(info.missed_ticks, 3);

        // Late ticks are not replayed
        assert_eq!(sched.dispatch(), 1);
        assert_eq!(sched.dispatch(), 0);
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(sched.ticks(), 5);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let sched = started::<3>();
        sched.add_task(1, &noop, 1).unwrap();
        assert_eq!(sched.add_task(1, &noop, 5), Err(SchedulerError::DuplicateId(1)));
        assert_eq!(sched.task_info(1).unwrap().period, 1);
    }

    #[test]
    fn test_deleted_slot_is_reused() {
        let sched = started::<2>();
        let log = new_log();
        sched.add_task(1, recorder(log, 1), 1).unwrap();
        sched.add_task(2, recorder(log, 2), 1).unwrap();
        sched.delete_task(1).unwrap();
        assert_eq!(sched.add_task(3, recorder(log, 3), 1), Ok(0));

        sched.tick();
        sched.dispatch();
        assert_eq!(*log.lock().unwrap(), vec![3, 2]);
        assert_eq!(sched.task_status(1), Err(SchedulerError::NotFound(1)));
    }
}
