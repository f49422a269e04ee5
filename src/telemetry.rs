//! Telemetry aggregation.
//!
//! The thermometers and the imager run on independent schedules.  The
//! aggregator copies the latest output of both into one immutable
//! [`TelemetrySnapshot`] so the logger, the history buffer, and the request
//! interface all see the same, torn-free values.

use crate::sensors::thermal::{ThermalArrayReader, ThermalStats};
use crate::sensors::thermometer::{DigitalThermometerPoller, ThermometerReading};

/// A point-in-time view of every sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    /// Slot 1 thermometer (°C), or the no-reading sentinel.
    pub t1: f32,
    /// Slot 2 thermometer (°C), or the no-reading sentinel.
    pub t2: f32,
    /// CRC-valid thermometers found by the last discovery.
    pub ds_count: usize,
    pub thermal_connected: bool,
    pub thermal: ThermalStats,
    /// Milliseconds since boot at aggregation time.
    pub timestamp: u64,
}

/// Pure combination step over the current sensor outputs.
pub fn aggregate(
    readings: &[ThermometerReading; 2],
    ds_count: usize,
    thermal_connected: bool,
    thermal: ThermalStats,
    now_ms: u64,
) -> TelemetrySnapshot {
    TelemetrySnapshot {
        t1: readings[0].celsius,
        t2: readings[1].celsius,
        ds_count,
        thermal_connected,
        thermal,
        timestamp: now_ms,
    }
}

/// Convenience wrapper reading straight from the two pollers.
pub fn snapshot_of(
    thermometers: &DigitalThermometerPoller,
    thermal: &ThermalArrayReader,
    now_ms: u64,
) -> TelemetrySnapshot {
    aggregate(
        &thermometers.readings(),
        thermometers.thermometer_count(),
        thermal.is_connected(),
        thermal.stats(),
        now_ms,
    )
}
