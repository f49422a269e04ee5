//! Port traits — the hexagonal boundary between the acquisition core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Scheduler / HubContext (domain)
//! ```
//!
//! Driven adapters (1-Wire bus, thermal imager, log store, indicator, request
//! transport, event sinks) implement these traits.  The core consumes them
//! via generics, so it never touches hardware directly and every timing path
//! can be driven from a host test with a virtual clock.

use crate::config::HubConfig;
use crate::error::SensorError;
use crate::history::PeerReading;
use crate::sensors::address::{DeviceAddress, Resolution};
use crate::sensors::thermal::THERMAL_PIXELS;

/// Upper bound on devices a single bus search will report.
pub const MAX_BUS_DEVICES: usize = 8;

// ───────────────────────────────────────────────────────────────
// Thermometer bus (driven adapter: 1-Wire ↔ domain)
// ───────────────────────────────────────────────────────────────

/// A shared single-wire bus carrying one or more digital thermometers.
pub trait ThermometerBus {
    /// Broadcast Convert T to every device on the bus.  Returns at once;
    /// results are valid only after the resolution's conversion time.
    fn request_conversion(&mut self) -> Result<(), SensorError>;

    /// True once the devices have released the bus after a conversion.
    /// Parasite-powered buses cannot report this and always return `true`.
    fn is_ready(&mut self) -> bool;

    /// Read the last converted temperature of the device at `address`.
    fn read_celsius(&mut self, address: DeviceAddress) -> Result<f32, SensorError>;

    /// Enumerate every ROM on the bus, CRC-valid or not, in search order.
    fn search(&mut self) -> heapless::Vec<DeviceAddress, MAX_BUS_DEVICES>;

    /// Write the conversion resolution to every device on the bus.
    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), SensorError>;

    /// GPIO number of the data line.
    fn pin(&self) -> i32;

    /// Idle level of the data line (`true` = pulled high, as it must be).
    fn idle_level_high(&mut self) -> bool;

    /// Count the devices answering on another candidate pin.  `None` when
    /// the backend cannot re-target its data line.
    fn probe_pin(&mut self, _gpio: i32) -> Option<usize> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Thermal imager (driven adapter: I²C ↔ domain)
// ───────────────────────────────────────────────────────────────

/// A 32×24 infrared thermal-array imager.
pub trait ThermalImager {
    /// Detect and configure the device (chess mode, 18-bit ADC, 4 Hz).
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Stream both subpages of one frame into `out` (°C per pixel).
    /// On error `out` may hold partial data; callers must discard it.
    fn capture_frame(&mut self, out: &mut [f32; THERMAL_PIXELS]) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Log store (driven adapter: domain ↔ flash filesystem)
// ───────────────────────────────────────────────────────────────

/// Partition usage as reported by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageCapacity {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl StorageCapacity {
    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }
}

/// The single append-only record store backing the data log.
pub trait LogStore {
    /// Mount the backing filesystem.  Failure disables logging for the
    /// process lifetime.
    fn mount(&mut self) -> Result<(), StorageError>;

    /// Create the store, or empty it if it already exists.
    fn truncate(&mut self) -> Result<(), StorageError>;

    /// Append `data` at the end of the store.
    fn append(&mut self, data: &[u8]) -> Result<(), StorageError>;

    /// Current stored size in bytes; `0` when absent.
    fn size(&self) -> u64;

    fn exists(&self) -> bool;

    /// Whole contents of the store.
    fn read_all(&self) -> Result<Vec<u8>, StorageError>;

    /// Delete the store.  Returns `Ok(())` even if it did not exist.
    fn remove(&mut self) -> Result<(), StorageError>;

    /// Partition usage, `None` when not mounted.
    fn capacity(&self) -> Option<StorageCapacity>;
}

// ───────────────────────────────────────────────────────────────
// Indicator, peer, requests, events
// ───────────────────────────────────────────────────────────────

/// A single on/off liveness indicator (the heartbeat LED).
pub trait Indicator {
    fn set(&mut self, on: bool);
}

/// Latest reading of the independently polled power-monitor peer.
/// Implementations must return immediately; `None` means unreachable.
pub trait PeerSource {
    fn latest(&mut self) -> Option<PeerReading>;
}

/// Request/response transport.  The core pulls one path at a time and
/// answers it before pulling the next.
pub trait RequestPort {
    /// Next pending request path (e.g. `/status`), if any.  Never blocks.
    fn poll(&mut self) -> Option<String>;

    /// Deliver the response to the request last returned by [`poll`].
    ///
    /// [`poll`]: RequestPort::poll
    fn respond(&mut self, response: crate::app::commands::Response);
}

/// The core emits structured [`HubEvent`](super::events::HubEvent)s through
/// this port.  Adapters decide where they go (serial log, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::HubEvent);
}

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`HubConfig::default()`] if none is
    /// stored.
    fn load(&self) -> Result<HubConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &HubConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`LogStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The filesystem is not mounted.
    NotMounted,
    /// The store does not exist.
    NotFound,
    /// Partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotMounted => write!(f, "filesystem not mounted"),
            Self::NotFound => write!(f, "log not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for StorageError {}
