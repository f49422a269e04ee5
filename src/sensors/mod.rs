//! Sensor subsystem: the two acquisition state machines.
//!
//! Each poller owns its last-known-good values and rate-limits itself, so
//! the scheduler can call them every iteration.  Hardware is reached only
//! through the [`ThermometerBus`](crate::app::ports::ThermometerBus) and
//! [`ThermalImager`](crate::app::ports::ThermalImager) ports.

pub mod address;
pub mod thermal;
pub mod thermometer;

pub use thermal::{ThermalArrayReader, ThermalStats};
pub use thermometer::{DigitalThermometerPoller, ThermometerReading};
