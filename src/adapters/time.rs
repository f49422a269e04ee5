//! Monotonic clock adapter.
//!
//! - **`espidf` feature** wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic since boot).
//! - **host** uses `std::time::Instant` taken at construction.

use crate::app::ports::Clock;

pub struct MonotonicClock {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(feature = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions once the
        // scheduler is running.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction.
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}
