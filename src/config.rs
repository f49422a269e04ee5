//! System configuration parameters
//!
//! All tunable parameters for the ThermHub system.
//! Values can be overridden from a JSON file through [`ConfigPort`].
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pins;
use crate::sensors::address::Resolution;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    // --- Thermal imager ---
    /// Minimum spacing between successful frame captures (milliseconds)
    pub thermal_min_interval_ms: u32,

    // --- Digital thermometers ---
    /// Conversion resolution written to every thermometer at discovery
    pub thermometer_resolution: Resolution,
    /// Conservative floor on the conversion wait (milliseconds).  The
    /// effective wait is the larger of this and the resolution's datasheet
    /// conversion time.
    pub conversion_guard_ms: u32,
    /// How often a new broadcast conversion is requested (milliseconds)
    pub conversion_request_interval_ms: u32,
    /// 1-Wire data pin
    pub one_wire_gpio: i32,
    /// Pins counted during a rescan; empty disables the probe
    pub probe_gpios: Vec<i32>,

    // --- Aggregation / history ---
    /// Snapshot cadence (milliseconds); every snapshot feeds the history
    pub snapshot_interval_ms: u32,
    /// Oldest history point retained (milliseconds)
    pub history_max_age_ms: u64,
    /// Upper bound on retained history points
    pub history_max_points: usize,

    // --- Logging ---
    /// Minimum spacing between log rows (milliseconds)
    pub log_interval_ms: u32,
    /// Session auto-stops once the stored log exceeds this many bytes
    pub log_size_ceiling_bytes: u64,
    /// Path of the CSV log on the host file-store backend
    pub log_path: String,
    /// Capacity reported for the log partition (bytes)
    pub storage_capacity_bytes: u64,

    // --- Scheduler ---
    /// Idle delay at the end of every loop iteration (milliseconds)
    pub idle_delay_ms: u32,
    /// Requests serviced per service slot; the rest wait for the next slot
    pub max_requests_per_slot: usize,
    /// Heartbeat half-period while logging (milliseconds)
    pub heartbeat_fast_ms: u32,
    /// Heartbeat half-period while idle (milliseconds)
    pub heartbeat_slow_ms: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            // Thermal imager: 4 Hz refresh, read every other frame
            thermal_min_interval_ms: 500,

            // Thermometers
            thermometer_resolution: Resolution::Bits12,
            conversion_guard_ms: 800, // 12-bit needs 750 ms
            conversion_request_interval_ms: 2000,
            one_wire_gpio: pins::ONE_WIRE_GPIO,
            probe_gpios: pins::ONE_WIRE_PROBE_GPIOS.to_vec(),

            // Aggregation / history
            snapshot_interval_ms: 1000,
            history_max_age_ms: 24 * 60 * 60 * 1000, // 24 h
            history_max_points: 3600,

            // Logging
            log_interval_ms: 1000,
            log_size_ceiling_bytes: 1_000_000,
            log_path: "data/templog.csv".into(),
            storage_capacity_bytes: 1_441_792, // 1.375 MiB SPIFFS partition

            // Scheduler
            idle_delay_ms: 2,
            max_requests_per_slot: 4,
            heartbeat_fast_ms: 200,
            heartbeat_slow_ms: 1000,
        }
    }
}

impl HubConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=60_000).contains(&self.thermal_min_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "thermal_min_interval_ms must be 100–60000",
            ));
        }
        if self.conversion_guard_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "conversion_guard_ms must be at most 10000",
            ));
        }
        if self.conversion_request_interval_ms < self.conversion_wait_ms() {
            return Err(ConfigError::ValidationFailed(
                "conversion_request_interval_ms must cover the conversion wait",
            ));
        }
        if self.snapshot_interval_ms == 0 || self.log_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "snapshot and log intervals must be non-zero",
            ));
        }
        if self.history_max_points < 2 {
            return Err(ConfigError::ValidationFailed(
                "history_max_points must be at least 2",
            ));
        }
        if self.history_max_age_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_max_age_ms must be non-zero",
            ));
        }
        if self.log_size_ceiling_bytes == 0
            || self.log_size_ceiling_bytes > self.storage_capacity_bytes
        {
            return Err(ConfigError::ValidationFailed(
                "log_size_ceiling_bytes must be within the storage capacity",
            ));
        }
        if self.max_requests_per_slot == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_requests_per_slot must be at least 1",
            ));
        }
        if self.heartbeat_fast_ms == 0 || self.heartbeat_fast_ms >= self.heartbeat_slow_ms {
            return Err(ConfigError::ValidationFailed(
                "heartbeat_fast_ms must be non-zero and below heartbeat_slow_ms",
            ));
        }
        if self.idle_delay_ms > 100 {
            return Err(ConfigError::ValidationFailed(
                "idle_delay_ms must be at most 100",
            ));
        }
        Ok(())
    }

    /// Effective wait between a conversion request and the first read.
    pub fn conversion_wait_ms(&self) -> u32 {
        self.conversion_guard_ms
            .max(self.thermometer_resolution.conversion_time_ms())
    }
}
