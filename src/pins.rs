//! GPIO / peripheral pin assignments for the ESP32 LyraT sensor hub.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// 1-Wire bus (both DS18B20 thermometers share it)
// ---------------------------------------------------------------------------

/// DS18B20 data line.  Needs an external 4.7 kOhm pull-up to 3V3.
pub const ONE_WIRE_GPIO: i32 = 13;

/// Candidate data pins probed by a rescan when the sensors are not found
/// where expected (miswired harness, alternate header).
pub const ONE_WIRE_PROBE_GPIOS: [i32; 8] = [13, 4, 2, 27, 32, 33, 19, 12];

// ---------------------------------------------------------------------------
// Thermal imager (MLX90640 on the second I2C controller)
// ---------------------------------------------------------------------------

pub const THERMAL_I2C_SDA_GPIO: i32 = 15;
pub const THERMAL_I2C_SCL_GPIO: i32 = 14;

/// Fast-mode I2C.
pub const THERMAL_I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Blue on-board LED, driven as the liveness heartbeat.
pub const HEARTBEAT_LED_GPIO: i32 = 22;
