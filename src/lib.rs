#![cfg_attr(not(test), no_std)]

//! # cosched — Cooperative Periodic Scheduler
//!
//! A fixed-slot, run-to-completion task scheduler for ARM Cortex-M4
//! microcontrollers. A small static set of zero-argument callbacks is
//! invoked at independent periods, counted in ticks of a hardware timer.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Application Tasks                    │
//! ├────────────────────────────────────────────────────────┤
//! │                 Kernel API (kernel.rs)                  │
//! │   init() · add_task() · delete_task() · run()          │
//! ├──────────────────────────────┬─────────────────────────┤
//! │  Scheduler (scheduler.rs)    │  Sync Primitives        │
//! │  ─ tick()      (ISR)         │  sync.rs                │
//! │  ─ dispatch()  (main loop)   │  ─ critical_section     │
//! ├──────────────────────────────┴─────────────────────────┤
//! │        Task Table (table.rs) · Task Record (task.rs)    │
//! ├────────────────────────────────────────────────────────┤
//! │            Arch Port (arch/cortex_m4.rs)                │
//! │        SysTick tick source · SysTick handler · idle     │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling Model
//!
//! - Every task has a `period` and a `delay`. Each tick decrements the
//!   delay of every Runnable task; the main loop runs each task whose delay
//!   reached zero and rearms it to its period.
//! - Due tasks run in table-slot order, one after another. There are no
//!   priorities and no preemption.
//! - Table management reports failures (`TableFull`, `DuplicateId`,
//!   `NotFound`) instead of dropping requests.
//!
//! ## Memory Model
//!
//! - **No heap**: the task table is `[TaskRecord; MAX_TASKS]`
//! - **No `alloc`**: pure `core`
//! - **Critical sections**: `critical_section::Mutex` guards the table
//!   against the tick interrupt

#[macro_use]
mod log;

pub mod config;
pub mod error;
pub mod task;
pub mod table;
pub mod scheduler;
pub mod arch;
pub mod kernel;
pub mod sync;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use task::{Task, TaskId, TaskInfo, TaskStatus};
