//! # cosched Demo Firmware
//!
//! Four LED blinkers at independent rates, one tick per second:
//!
//! | Task | Id | Period | Output |
//! |------|----|--------|--------|
//! | `red_task`    | 1 | 1 s | bit 2 |
//! | `green_task`  | 2 | 2 s | bit 3 |
//! | `yellow_task` | 3 | 3 s | bit 4 |
//! | `blue_task`   | 4 | 6 s | bit 5 |
//!
//! Each task flips its bit of the output image and returns. The image is
//! reported on the debug log (defmt over RTT with the `defmt` feature).

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU8, Ordering};

use cortex_m_rt::entry;
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

use cosched::{kernel, log_debug, log_error, log_info, Task, TaskId};

const RED_LED: u8 = 1 << 2;
const GREEN_LED: u8 = 1 << 3;
const YELLOW_LED: u8 = 1 << 4;
const BLUE_LED: u8 = 1 << 5;

/// Output image, one bit per LED.
static LED_PORT: AtomicU8 = AtomicU8::new(0);

fn toggle(mask: u8) {
    let port = LED_PORT.fetch_xor(mask, Ordering::Relaxed) ^ mask;
    log_debug!("leds {}", port);
}

// ---------------------------------------------------------------------------
// Task entry points
// ---------------------------------------------------------------------------

fn red_task() {
    toggle(RED_LED);
}

fn green_task() {
    toggle(GREEN_LED);
}

fn yellow_task() {
    toggle(YELLOW_LED);
}

fn blue_task() {
    toggle(BLUE_LED);
}

/// (id, task, period in ticks)
const TASKS: [(TaskId, &dyn Task, u16); 4] = [
    (1, &red_task, 1),
    (2, &green_task, 2),
    (3, &yellow_task, 3),
    (4, &blue_task, 6),
];

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Firmware entry point. Initializes the scheduler, registers the blinkers
/// and enters the dispatch loop. Does not return.
#[entry]
fn main() -> ! {
    // Take ownership of core peripherals
    let mut cp = cortex_m::Peripherals::take().unwrap();

    kernel::init(&mut cp.SYST).expect("SysTick cannot run at TICK_HZ");

    for (id, task, period) in TASKS {
        if let Err(e) = kernel::add_task(id, task, period) {
            log_error!("task {} not started: {}", id, e);
        }
    }
    log_info!("dispatching");

    kernel::run()
}
