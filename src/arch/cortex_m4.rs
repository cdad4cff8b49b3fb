//! # Cortex-M4 Port Layer
//!
//! Hardware-specific code for the ARM Cortex-M4. SysTick is the tick
//! source; its exception handler is the scheduler's interrupt context.
//!
//! ## Interrupt Priorities
//!
//! SysTick keeps its reset priority. The handler only touches the task
//! table inside a critical section, so it may be preempted by, or preempt,
//! any other handler that leaves the scheduler alone.

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::arch::TickSource;
use crate::config::{SYSTEM_CLOCK_HZ, SYST_RELOAD_MAX};
use crate::error::SchedulerError;

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Reload value giving `tick_hz` interrupts per second from the core clock.
///
/// `None` when the rate is zero, too slow for the 24-bit counter, or so fast
/// the reload would be 0 (which leaves SysTick stopped).
pub const fn systick_reload(tick_hz: u32) -> Option<u32> {
    if tick_hz == 0 {
        return None;
    }
    let cycles = SYSTEM_CLOCK_HZ / tick_hz;
    if cycles < 2 || cycles - 1 > SYST_RELOAD_MAX {
        return None;
    }
    Some(cycles - 1)
}

/// SysTick fires at `tick_hz` using the processor clock. The counter
/// reloads itself, so the tick re-arms without software help.
impl TickSource for SYST {
    fn start(&mut self, tick_hz: u32) -> Result<(), SchedulerError> {
        let reload = systick_reload(tick_hz).ok_or(SchedulerError::InvalidTickRate(tick_hz))?;
        self.disable_counter();
        self.set_clock_source(SystClkSource::Core);
        self.set_reload(reload);
        self.clear_current();
        self.enable_interrupt();
        self.enable_counter();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

/// Sleep until the next interrupt unless `ready` reports pending work.
///
/// Interrupts are masked across the check and the `wfi`, so a tick that
/// lands in between is not slept through: a pending interrupt still wakes
/// the core and is taken as soon as the mask is lifted.
pub fn wait_for_tick<F>(ready: F)
where
    F: FnOnce() -> bool,
{
    cortex_m::interrupt::disable();
    if !ready() {
        cortex_m::asm::wfi();
    }
    // Safety: only reached from the main loop, which always runs with
    // interrupts enabled.
    unsafe { cortex_m::interrupt::enable() };
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler — scheduler tick entry point.
///
/// Called at `TICK_HZ` frequency. Counts down every Runnable task; the
/// dispatch itself happens in the main loop.
#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn SysTick() {
    crate::kernel::SCHEDULER.tick();
}
