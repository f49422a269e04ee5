//! Unified error types for the ThermHub firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path and the binary boundary uniform.  All variants are `Copy` so
//! they can be passed through the sensor pollers without allocation.
//!
//! Errors never cross component boundaries at runtime: the pollers and the
//! logger absorb them into flags and last-known-good values.  Only boot
//! (config load, storage mount) surfaces them to the caller.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor transaction failed or returned implausible data.
    Sensor(SensorError),
    /// The log store could not be mounted, written, or read.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No device answered the bus reset with a presence pulse.
    NoPresence,
    /// GPIO or I²C transaction failed at the electrical level.
    BusFault,
    /// A ROM code or scratchpad failed its CRC-8 check.
    CrcMismatch,
    /// The device is not (or no longer) detected on the bus.
    NotDetected,
    /// A subpage transfer or frame checksum failed mid-capture.
    FrameTransfer,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "no presence pulse"),
            Self::BusFault => write!(f, "bus fault"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::NotDetected => write!(f, "device not detected"),
            Self::FrameTransfer => write!(f, "frame transfer failed"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
