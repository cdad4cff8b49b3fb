//! # Scheduler Configuration
//!
//! Compile-time constants governing the scheduler and the tick source.
//! All limits are fixed at compile time — no dynamic allocation.

/// Number of slots in the task table. Each slot holds at most one task;
/// `add_task` fails with `TableFull` once every slot is in use.
pub const MAX_TASKS: usize = 5;

/// Tick frequency in Hz. One tick is the unit every task period and
/// delay is measured in. The default of 1 Hz gives one-second ticks.
pub const TICK_HZ: u32 = 1;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
/// SysTick runs from this clock.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;

/// Largest value the 24-bit SysTick reload register can hold.
pub const SYST_RELOAD_MAX: u32 = 0x00FF_FFFF;

// The configured tick must be reachable with a single SysTick reload.
const _: () = assert!(SYSTEM_CLOCK_HZ / TICK_HZ - 1 <= SYST_RELOAD_MAX);
const _: () = assert!(SYSTEM_CLOCK_HZ / TICK_HZ >= 2);
const _: () = assert!(MAX_TASKS > 0);
