//! Fuzz target: `TimeSeriesHistory::ingest`
//!
//! Interprets the input as a stream of timestamp deltas (some of them
//! negative) and checks the retention bounds after every point.
//!
//! cargo fuzz run fuzz_history_ingest

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermhub::history::{DisplayWindow, HistoryPoint, TimeSeriesHistory};

fuzz_target!(|data: &[u8]| {
    let Some((&budget, deltas)) = data.split_first() else {
        return;
    };
    let max_points = usize::from(budget).max(2);
    let max_age_ms = 60_000;
    let mut history = TimeSeriesHistory::new(max_age_ms, max_points);

    let mut ts: u64 = 1_000_000;
    for chunk in deltas.chunks(2) {
        let delta = i16::from_le_bytes([chunk[0], *chunk.get(1).unwrap_or(&0)]);
        ts = ts.saturating_add_signed(i64::from(delta) * 10);
        let point = HistoryPoint {
            timestamp: ts,
            t1: f32::from(delta),
            t2: -127.0,
            thermal_max: -40.0,
            thermal_avg: 0.0,
            external_voltage: None,
            external_current: None,
            external_power: None,
        };
        let newest = history.last().map(|p| p.timestamp);
        let accepted = history.ingest(point);
        assert_eq!(accepted, newest.is_none_or(|n| ts >= n));

        assert!(history.len() <= max_points);
        let newest = history.last().map_or(0, |p| p.timestamp);
        let mut prev = 0;
        for p in history.window(DisplayWindow::All) {
            assert!(p.timestamp >= prev, "out of order");
            assert!(newest - p.timestamp <= max_age_ms, "expired point kept");
            prev = p.timestamp;
        }
    }
});
