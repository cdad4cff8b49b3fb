//! # Synchronization Primitives
//!
//! Interrupt-safe critical section abstractions shared by the tick
//! interrupt and the main loop. All shared scheduler state must be accessed
//! within a critical section to prevent data races between the two.
//!
//! On Cortex-M the implementation comes from `cortex-m`'s
//! `critical-section-single-core` feature (interrupts masked). Host tests
//! link the `std` implementation instead.

use core::cell::RefCell;

pub use critical_section::CriticalSection;
use critical_section::Mutex;

/// State touched from both interrupt and thread context.
pub type Shared<T> = Mutex<RefCell<T>>;

/// Execute a closure within a critical section (interrupts disabled).
///
/// This is the primary mechanism for safely accessing shared mutable state.
/// Interrupts are disabled on entry and restored on exit, so nested calls
/// are allowed.
///
/// # Usage
/// ```ignore
/// sync::critical_section(|cs| {
///     // Access shared state safely
/// });
/// ```
///
/// Keep critical sections short: a tick that arrives while one is held is
/// only serviced after it ends.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(CriticalSection<'_>) -> R,
{
    critical_section::with(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_sections() {
        let shared: Shared<u32> = Mutex::new(RefCell::new(1));
        let value = critical_section(|outer| {
            *shared.borrow_ref_mut(outer) += 1;
            critical_section(|inner| *shared.borrow_ref(inner))
        });
        assert_eq!(value, 2);
    }
}
