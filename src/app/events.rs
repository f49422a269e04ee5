//! Outbound hub events.
//!
//! The core emits these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, record them in a test, push them to a dashboard.

use crate::telemetry::TelemetrySnapshot;

/// Why a logging session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `/stoplog`.
    Requested,
    /// `/deletelog` while a session was active.
    Deleted,
    /// Stored size exceeded the configured ceiling.
    CeilingReached,
    /// The backing store reported it is full.
    StorageFull,
}

/// Structured events emitted by the hub core.
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// Boot finished.
    Started {
        thermometers: usize,
        thermal_connected: bool,
        storage_available: bool,
    },

    /// A discovery pass completed.
    DiscoveryCompleted { raw_found: usize, thermometers: usize },

    /// A new logging session began.
    LogStarted,

    /// The logging session ended.
    LogStopped {
        reason: StopReason,
        bytes_written: u64,
    },

    /// The stored log was removed.
    LogDeleted,

    /// Periodic snapshot.
    Telemetry(TelemetrySnapshot),
}
