//! Bounded, decimated time-series history for the dashboard charts.
//!
//! Every snapshot appends one [`HistoryPoint`].  Two bounds keep the buffer
//! finite:
//!
//! 1. **Age**: points older than `max_age_ms` (relative to the newest
//!    point) are evicted from the front.
//! 2. **Count**: if more than `max_points` remain, the buffer is decimated
//!    with stride `N = ceil(len / (max_points / 2))`, keeping every N-th
//!    point plus the newest one.  Resolution halves, span is preserved.
//!
//! Eviction always runs before decimation.  Because decimation repeats on
//! every overflow, old history gets progressively sparser over a long run.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::Serialize;

use crate::telemetry::TelemetrySnapshot;

/// Latest values from the independently polled power-monitor peer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PeerReading {
    pub voltage: Option<f32>,
    pub current: Option<f32>,
    pub power: Option<f32>,
}

/// One retained sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    #[serde(rename = "ts")]
    pub timestamp: u64,
    pub t1: f32,
    pub t2: f32,
    #[serde(rename = "mlxMax")]
    pub thermal_max: f32,
    #[serde(rename = "mlxAvg")]
    pub thermal_avg: f32,
    #[serde(rename = "voltage")]
    pub external_voltage: Option<f32>,
    #[serde(rename = "current")]
    pub external_current: Option<f32>,
    #[serde(rename = "power")]
    pub external_power: Option<f32>,
}

impl HistoryPoint {
    /// Merge a snapshot with whatever the peer last reported (`None` when
    /// the peer is unreachable).
    pub fn from_snapshot(snapshot: &TelemetrySnapshot, peer: Option<PeerReading>) -> Self {
        let peer = peer.unwrap_or_default();
        Self {
            timestamp: snapshot.timestamp,
            t1: snapshot.t1,
            t2: snapshot.t2,
            thermal_max: snapshot.thermal.max,
            thermal_avg: snapshot.thermal.avg,
            external_voltage: peer.voltage,
            external_current: peer.current,
            external_power: peer.power,
        }
    }
}

/// Trailing window applied at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayWindow {
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    SixHours,
    OneDay,
    All,
}

impl DisplayWindow {
    /// Parse the `window=` query value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "5m" => Some(Self::FiveMinutes),
            "15m" => Some(Self::FifteenMinutes),
            "1h" => Some(Self::OneHour),
            "6h" => Some(Self::SixHours),
            "24h" => Some(Self::OneDay),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Window length in milliseconds; `None` = unbounded.
    pub fn duration_ms(self) -> Option<u64> {
        const MIN: u64 = 60_000;
        match self {
            Self::FiveMinutes => Some(5 * MIN),
            Self::FifteenMinutes => Some(15 * MIN),
            Self::OneHour => Some(60 * MIN),
            Self::SixHours => Some(6 * 60 * MIN),
            Self::OneDay => Some(24 * 60 * MIN),
            Self::All => None,
        }
    }
}

/// The retention buffer.  Lives for the process lifetime.
pub struct TimeSeriesHistory {
    points: VecDeque<HistoryPoint>,
    max_age_ms: u64,
    max_points: usize,
    decimations: u32,
}

impl TimeSeriesHistory {
    /// `max_points` below 2 is raised to 2 so a decimation pass can always
    /// keep the oldest and the newest point.
    pub fn new(max_age_ms: u64, max_points: usize) -> Self {
        let max_points = max_points.max(2);
        Self {
            points: VecDeque::with_capacity(max_points + 1),
            max_age_ms,
            max_points,
            decimations: 0,
        }
    }

    /// Append, evict by age, then decimate by count.
    ///
    /// A point older than the newest retained one is dropped so the
    /// buffer stays ordered; returns `false` in that case.
    pub fn ingest(&mut self, point: HistoryPoint) -> bool {
        if let Some(last) = self.points.back() {
            if point.timestamp < last.timestamp {
                warn!(
                    "History: dropped out-of-order point ({} < {})",
                    point.timestamp, last.timestamp
                );
                return false;
            }
        }
        self.points.push_back(point);
        self.evict_expired(point.timestamp);
        if self.points.len() > self.max_points {
            self.decimate();
        }
        true
    }

    fn evict_expired(&mut self, newest: u64) {
        let cutoff = newest.saturating_sub(self.max_age_ms);
        while self.points.front().is_some_and(|p| p.timestamp < cutoff) {
            self.points.pop_front();
        }
    }

    fn decimate(&mut self) {
        let len = self.points.len();
        let half = self.max_points / 2;
        let stride = len.div_ceil(half);
        let last = len - 1;

        let mut index = 0usize;
        self.points.retain(|_| {
            let keep = index % stride == 0 || index == last;
            index += 1;
            keep
        });
        self.decimations = self.decimations.saturating_add(1);
        debug!(
            "History: decimated {} → {} points (stride {})",
            len,
            self.points.len(),
            stride
        );
    }

    /// Points inside the trailing `window`, oldest first.  Never mutates.
    pub fn window(&self, window: DisplayWindow) -> impl Iterator<Item = &HistoryPoint> {
        let newest = self.points.back().map_or(0, |p| p.timestamp);
        let cutoff = window
            .duration_ms()
            .map_or(0, |d| newest.saturating_sub(d));
        self.points.iter().filter(move |p| p.timestamp >= cutoff)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&HistoryPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Decimation passes run since boot.
    pub fn decimations(&self) -> u32 {
        self.decimations
    }
}
