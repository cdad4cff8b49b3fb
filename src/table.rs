//! # Task Table
//!
//! Fixed-capacity array of task records. Slots are claimed first-free in
//! table order, so table order is also insertion order and dispatch order.
//!
//! The table itself does no locking; `Scheduler` owns it behind a critical
//! section mutex.

use crate::config::MAX_TASKS;
use crate::error::SchedulerError;
use crate::task::{Task, TaskId, TaskInfo, TaskRecord, TaskStatus};

pub struct TaskTable<const N: usize = MAX_TASKS> {
    slots: [TaskRecord; N],

    /// Ticks delivered since the last reset. Wraps.
    ticks: u32,
}

impl<const N: usize> TaskTable<N> {
    /// Table with every slot Stopped.
    pub const fn new() -> Self {
        Self {
            slots: [TaskRecord::EMPTY; N],
            ticks: 0,
        }
    }

    /// Return every slot to Stopped and zero the tick counter.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of slots.
    #[cfg(test)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// All slots in table order.
    #[cfg(test)]
    pub fn records(&self) -> &[TaskRecord] {
        &self.slots
    }

    #[inline]
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Number of slots holding a task that has not been deleted.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|r| r.is_active()).count()
    }

    /// Any task waiting for dispatch.
    pub fn has_due(&self) -> bool {
        self.slots.iter().any(TaskRecord::is_due)
    }

    // -----------------------------------------------------------------------
    // Table management
    // -----------------------------------------------------------------------

    /// Claim the first Stopped slot for a new task.
    ///
    /// # Returns
    /// - `Ok(slot)` — index of the claimed slot
    /// - `Err(DuplicateId)` — an active task already uses `id`
    /// - `Err(TableFull)` — no Stopped slot left
    pub fn add(
        &mut self,
        id: TaskId,
        task: &'static dyn Task,
        period: u16,
    ) -> Result<usize, SchedulerError> {
        if self.find_active(id).is_some() {
            return Err(SchedulerError::DuplicateId(id));
        }
        let slot = self
            .slots
            .iter()
            .position(TaskRecord::is_free)
            .ok_or(SchedulerError::TableFull)?;

        self.slots[slot].init(id, task, period);
        Ok(slot)
    }

    /// Stop the task with this id. Deleting an already deleted task is
    /// accepted and changes nothing.
    pub fn remove(&mut self, id: TaskId) -> Result<usize, SchedulerError> {
        let slot = self.find(id).ok_or(SchedulerError::NotFound(id))?;
        self.slots[slot].status = TaskStatus::Stopped;
        Ok(slot)
    }

    /// Park an active task in Error. It stays there until removed.
    pub fn fault(&mut self, id: TaskId) -> Result<usize, SchedulerError> {
        let slot = self.find_active(id).ok_or(SchedulerError::NotFound(id))?;
        self.slots[slot].status = TaskStatus::Error;
        Ok(slot)
    }

    pub fn status(&self, id: TaskId) -> Result<TaskStatus, SchedulerError> {
        self.find(id)
            .map(|slot| self.slots[slot].status)
            .ok_or(SchedulerError::NotFound(id))
    }

    pub fn info(&self, id: TaskId) -> Result<TaskInfo, SchedulerError> {
        self.find(id)
            .and_then(|slot| self.slots[slot].info(slot))
            .ok_or(SchedulerError::NotFound(id))
    }

    /// Slot of the record carrying `id`. Active records win over deleted
    /// ones that still remember the same id.
    pub fn find(&self, id: TaskId) -> Option<usize> {
        self.find_active(id)
            .or_else(|| self.slots.iter().position(|r| r.id == Some(id)))
    }

    fn find_active(&self, id: TaskId) -> Option<usize> {
        self.slots
            .iter()
            .position(|r| r.is_active() && r.id == Some(id))
    }

    // -----------------------------------------------------------------------
    // Tick and dispatch steps
    // -----------------------------------------------------------------------

    /// One tick elapsed: count down every Runnable record.
    pub fn tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        for record in self.slots.iter_mut() {
            record.tick();
        }
    }

    /// Mark the slot Running if it is due and hand out its callback.
    pub fn begin_run(&mut self, slot: usize) -> Option<&'static dyn Task> {
        self.slots.get_mut(slot)?.begin_run()
    }

    /// Rearm the slot after its callback returned.
    pub fn finish_run(&mut self, slot: usize) {
        if let Some(record) = self.slots.get_mut(slot) {
            record.finish_run();
        }
    }
}

impl<const N: usize> Default for TaskTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
