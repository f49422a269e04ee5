//! Persistent CSV data log with a size ceiling.
//!
//! Exactly one session exists at a time.  `start()` truncates the store and
//! writes the header; `append()` adds one row per logging interval while the
//! session is active.  Before every write the stored size is checked: once it
//! exceeds the ceiling the session stops for good (until the next explicit
//! `start()`).
//!
//! ```text
//!            start()                    size > ceiling
//!   Inactive ────────▶ Active ──────────────────────────▶ Inactive
//!      ▲                 │ stop() / delete()                (no resume)
//!      └─────────────────┘
//! ```

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::events::{HubEvent, StopReason};
use crate::app::ports::{EventSink, LogStore, StorageCapacity, StorageError};
use crate::telemetry::TelemetrySnapshot;

/// First line of every log.
pub const LOG_HEADER: &str = "timestamp,t1,t2,mlx_max,mlx_avg\n";

/// Bookkeeping of the current (or last) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogSession {
    pub active: bool,
    pub started_at: u64,
    pub last_write_at: u64,
    pub bytes_written: u64,
    pub size_ceiling: u64,
}

/// Values reported by `/loginfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogInfo {
    pub logging: bool,
    pub size: u64,
    pub capacity: StorageCapacity,
}

/// Result of a control command (start / stop / delete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAck {
    pub ok: bool,
    pub msg: &'static str,
}

impl LogAck {
    fn ok(msg: &'static str) -> Self {
        Self { ok: true, msg }
    }

    fn failed(msg: &'static str) -> Self {
        Self { ok: false, msg }
    }
}

pub struct PersistentLogger {
    session: LogSession,
    interval_ms: u32,
    size_ceiling: u64,
    /// `false` after a failed mount; logging stays off for the process.
    available: bool,
    rows_written: u64,
    failed_appends: u32,
    line: String,
}

impl PersistentLogger {
    pub fn new(interval_ms: u32, size_ceiling: u64) -> Self {
        Self {
            session: LogSession {
                size_ceiling,
                ..LogSession::default()
            },
            interval_ms,
            size_ceiling,
            available: false,
            rows_written: 0,
            failed_appends: 0,
            line: String::with_capacity(48),
        }
    }

    /// Mount the store once at boot.  A failure disables logging.
    pub fn mount(&mut self, store: &mut impl LogStore) -> bool {
        match store.mount() {
            Ok(()) => {
                self.available = true;
                info!("Logger: store mounted");
            }
            Err(e) => {
                self.available = false;
                warn!("Logger: mount failed ({}), logging disabled", e);
            }
        }
        self.available
    }

    /// Begin a new session: truncate, write the header, reset counters.
    pub fn start(
        &mut self,
        store: &mut impl LogStore,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> LogAck {
        if !self.available {
            return LogAck::failed("Storage unavailable");
        }
        let opened = store
            .truncate()
            .and_then(|()| store.append(LOG_HEADER.as_bytes()));
        if let Err(e) = opened {
            warn!("Logger: cannot open log ({})", e);
            self.session.active = false;
            return LogAck::failed("Failed to open log file");
        }

        self.session = LogSession {
            active: true,
            started_at: now_ms,
            last_write_at: now_ms,
            bytes_written: LOG_HEADER.len() as u64,
            size_ceiling: self.size_ceiling,
        };
        self.rows_written = 0;
        sink.emit(&HubEvent::LogStarted);
        LogAck::ok("Logging started")
    }

    /// Stop the session.  Idempotent.
    pub fn stop(&mut self, sink: &mut impl EventSink) -> LogAck {
        self.end_session(StopReason::Requested, sink);
        LogAck::ok("Logging stopped")
    }

    /// Stop any active session, then remove the stored log.
    pub fn delete(&mut self, store: &mut impl LogStore, sink: &mut impl EventSink) -> LogAck {
        self.end_session(StopReason::Deleted, sink);
        if !self.available {
            return LogAck::failed("Storage unavailable");
        }
        if !store.exists() {
            return LogAck::ok("No log file");
        }
        match store.remove() {
            Ok(()) => {
                sink.emit(&HubEvent::LogDeleted);
                LogAck::ok("Log deleted")
            }
            Err(e) => {
                warn!("Logger: delete failed ({})", e);
                LogAck::failed("Delete failed")
            }
        }
    }

    /// Write one row if a session is active and the interval has elapsed.
    ///
    /// Returns `true` if a row was written.
    pub fn append(
        &mut self,
        store: &mut impl LogStore,
        snapshot: &TelemetrySnapshot,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> bool {
        if !self.session.active {
            return false;
        }
        if now_ms.saturating_sub(self.session.last_write_at) < u64::from(self.interval_ms) {
            return false;
        }

        if store.size() > self.size_ceiling {
            self.end_session(StopReason::CeilingReached, sink);
            return false;
        }

        self.format_row(snapshot, now_ms);
        match store.append(self.line.as_bytes()) {
            Ok(()) => {
                self.session.last_write_at = now_ms;
                self.session.bytes_written += self.line.len() as u64;
                self.rows_written += 1;
                true
            }
            Err(StorageError::Full) => {
                self.end_session(StopReason::StorageFull, sink);
                false
            }
            Err(e) => {
                // Transient: the row is skipped and the next one is due a
                // full interval later.
                self.session.last_write_at = now_ms;
                self.failed_appends += 1;
                warn!("Logger: append failed ({}), row skipped", e);
                false
            }
        }
    }

    fn format_row(&mut self, s: &TelemetrySnapshot, now_ms: u64) {
        let elapsed_secs = now_ms.saturating_sub(self.session.started_at) / 1000;
        self.line.clear();
        let _ = writeln!(
            self.line,
            "{},{:.2},{:.2},{:.1},{:.1}",
            elapsed_secs, s.t1, s.t2, s.thermal.max, s.thermal.avg
        );
    }

    fn end_session(&mut self, reason: StopReason, sink: &mut impl EventSink) {
        if !self.session.active {
            return;
        }
        self.session.active = false;
        sink.emit(&HubEvent::LogStopped {
            reason,
            bytes_written: self.session.bytes_written,
        });
    }

    /// Raw log contents for download; `None` when there is no log.
    pub fn download(&self, store: &impl LogStore) -> Option<Vec<u8>> {
        if !self.available || !store.exists() {
            return None;
        }
        match store.read_all() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Logger: read failed ({})", e);
                None
            }
        }
    }

    /// Session state plus partition usage (zeros when unavailable).
    pub fn info(&self, store: &impl LogStore) -> LogInfo {
        if !self.available {
            return LogInfo::default();
        }
        LogInfo {
            logging: self.session.active,
            size: store.size(),
            capacity: store.capacity().unwrap_or_default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.active
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn session(&self) -> LogSession {
        self.session
    }

    /// Data rows written in the current (or last) session.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Rows dropped on transient store errors since boot.
    pub fn failed_appends(&self) -> u32 {
        self.failed_appends
    }
}
