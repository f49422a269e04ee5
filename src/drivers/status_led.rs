//! Heartbeat LED.
//!
//! [`StatusLed`] drives a single GPIO through `embedded_hal::digital::OutputPin`
//! and implements the [`Indicator`] port.  [`Heartbeat`] decides when to
//! toggle it: a fast blink while a logging session is active, a slow one
//! otherwise.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: wraps an `esp_idf_hal` `PinDriver` in output mode.
//! On host/test: any `OutputPin` mock, or [`MemoryLed`] which only records
//! the level.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::Indicator;

pub struct StatusLed<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, on: false }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl<P: OutputPin> Indicator for StatusLed<P> {
    fn set(&mut self, on: bool) {
        let res = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match res {
            Ok(()) => self.on = on,
            Err(_) => warn!("LED: pin write failed"),
        }
    }
}

/// LED stand-in for hosts without a GPIO.
#[derive(Debug, Default)]
pub struct MemoryLed {
    pub on: bool,
    pub toggles: u32,
}

impl Indicator for MemoryLed {
    fn set(&mut self, on: bool) {
        if on != self.on {
            self.toggles += 1;
        }
        self.on = on;
    }
}

/// Square-wave timing for the heartbeat.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    fast_ms: u32,
    slow_ms: u32,
    level: bool,
    last_toggle: u64,
}

impl Heartbeat {
    pub fn new(fast_ms: u32, slow_ms: u32) -> Self {
        Self {
            fast_ms,
            slow_ms,
            level: false,
            last_toggle: 0,
        }
    }

    /// Force a level (boot sets the LED on once ready).
    pub fn set(&mut self, led: &mut impl Indicator, on: bool, now_ms: u64) {
        self.level = on;
        self.last_toggle = now_ms;
        led.set(on);
    }

    /// Toggle the LED if the current half-period has elapsed.
    ///
    /// Returns `true` when the level changed.
    pub fn update(&mut self, led: &mut impl Indicator, logging: bool, now_ms: u64) -> bool {
        let period = if logging { self.fast_ms } else { self.slow_ms };
        if now_ms.saturating_sub(self.last_toggle) < u64::from(period) {
            return false;
        }
        self.level = !self.level;
        self.last_toggle = now_ms;
        led.set(self.level);
        true
    }

    pub fn level(&self) -> bool {
        self.level
    }
}
