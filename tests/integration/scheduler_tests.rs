//! Scheduler pipeline on mock hardware: boot, conversion timing, capture
//! rate gating, snapshot cadence, request batching and the heartbeat.

use thermhub::app::events::HubEvent;
use thermhub::config::HubConfig;
use thermhub::sensors::address::Resolution;
use thermhub::sensors::thermometer::NO_READING_C;

use crate::mock_hw::{Harness, MockImager, mock_hw};

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_discovers_and_requests_first_conversion() {
    let h = Harness::with_defaults(&[23.45, 19.0], MockImager::uniform(30.0));

    assert_eq!(h.hw.bus.conversions, 1, "boot issues one conversion");
    assert_eq!(h.hw.bus.resolution, Some(Resolution::Bits12));
    assert_eq!(h.hw.led.levels, vec![true], "heartbeat starts lit");
    assert!(matches!(
        h.sink.events.last(),
        Some(HubEvent::Started {
            thermometers: 2,
            thermal_connected: true,
            storage_available: true,
        })
    ));
}

#[test]
fn empty_bus_boots_with_sentinels() {
    let mut h = Harness::with_defaults(&[], MockImager::absent());
    h.run_until(3000, 100);

    assert_eq!(h.ctx.latest.ds_count, 0);
    assert_eq!(h.ctx.latest.t1, NO_READING_C);
    assert_eq!(h.ctx.latest.t2, NO_READING_C);
    assert!(!h.ctx.latest.thermal_connected);
    assert_eq!(h.hw.imager.captures, 0, "absent imager is never polled");
}

// ── Thermometers ──────────────────────────────────────────────

#[test]
fn reading_appears_after_conversion_window() {
    let mut h = Harness::with_defaults(&[23.45, 19.0], MockImager::absent());

    h.now = 799;
    assert!(!h.tick().thermometers_read);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, NO_READING_C);

    h.now = 800;
    assert!(h.tick().thermometers_read);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 23.45);
    assert_eq!(h.ctx.thermometers.reading(1).celsius, 19.0);
}

#[test]
fn snapshot_picks_up_collected_readings() {
    let mut h = Harness::with_defaults(&[23.45, 19.0], MockImager::absent());
    h.run_until(1000, 100);

    assert_eq!(h.ctx.latest.timestamp, 1000);
    assert_eq!(h.ctx.latest.t1, 23.45);
    assert_eq!(h.ctx.latest.ds_count, 2);
}

#[test]
fn conversions_follow_request_interval() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    let reports = h.run_until(10_000, 100);

    // Boot plus one every 2 s.
    assert_eq!(h.hw.bus.conversions, 6);
    assert_eq!(reports.iter().filter(|r| r.conversion_requested).count(), 5);
}

#[test]
fn busy_bus_defers_collection() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    h.hw.bus.ready = false;
    h.run_until(1500, 100);
    assert_eq!(h.hw.bus.reads, 0);

    h.hw.bus.ready = true;
    h.now = 1600;
    assert!(h.tick().thermometers_read);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 21.0);
}

#[test]
fn implausible_sample_keeps_previous_value() {
    let mut h = Harness::with_defaults(&[21.0, 22.0], MockImager::absent());
    h.run_until(1000, 100);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 21.0);

    // Power-on-reset value on the next conversion.
    h.hw.bus.set_temp(0, 85.0);
    h.now = 1100;
    h.run_until(3000, 100);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 21.0);
    assert!(h.ctx.thermometers.rejected_samples() > 0);
}

// ── Thermal imager ────────────────────────────────────────────

#[test]
fn captures_are_rate_gated() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::uniform(30.0));
    h.run_until(2000, 100);

    // 0, 500, 1000, 1500, 2000
    assert_eq!(h.hw.imager.captures, 5);
    let stats = h.ctx.thermal.stats();
    assert_eq!(stats.max, 40.0);
    assert_eq!(stats.min, 30.0);
}

#[test]
fn failed_capture_keeps_last_stats_and_retries() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::uniform(30.0));
    h.tick();
    let before = h.ctx.thermal.stats();

    h.hw.imager.fail = true;
    h.hw.imager.value = 50.0;
    h.now = 500;
    assert!(!h.tick().frame_captured);
    h.now = 600;
    assert!(!h.tick().frame_captured, "failure leaves the gate open");
    assert_eq!(h.ctx.thermal.stats(), before);
    assert_eq!(h.ctx.thermal.failed_captures(), 2);

    h.hw.imager.fail = false;
    h.now = 700;
    assert!(h.tick().frame_captured);
    assert_eq!(h.ctx.thermal.stats().max, 60.0);
}

// ── History ───────────────────────────────────────────────────

#[test]
fn one_history_point_per_snapshot() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    h.run_until(10_000, 100);

    assert_eq!(h.ctx.history.len(), 11);
    assert_eq!(h.ctx.history.first().map(|p| p.timestamp), Some(0));
    assert_eq!(h.ctx.history.last().map(|p| p.timestamp), Some(10_000));
}

#[test]
fn small_history_stays_bounded_over_long_run() {
    let cfg = HubConfig {
        history_max_points: 20,
        ..HubConfig::default()
    };
    let mut h = Harness::boot(cfg, mock_hw(&[21.0], MockImager::absent()));
    h.run_until(120_000, 250);

    assert!(h.ctx.history.len() <= 20);
    assert_eq!(h.ctx.history.first().map(|p| p.timestamp), Some(0));
    assert_eq!(h.ctx.history.last().map(|p| p.timestamp), Some(120_000));
}

// ── Requests ──────────────────────────────────────────────────

#[test]
fn requests_are_serviced_in_bounded_batches() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    for _ in 0..10 {
        h.requests.push("/status");
    }
    assert_eq!(h.tick().requests_served, 4);
    assert_eq!(h.tick().requests_served, 4);
    assert_eq!(h.tick().requests_served, 2);
    assert_eq!(h.requests.responses.len(), 10);
}

#[test]
fn capture_is_bracketed_by_request_slots() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::uniform(30.0));
    for _ in 0..10 {
        h.requests.push("/status");
    }
    let report = h.tick();
    assert!(report.frame_captured);
    assert_eq!(report.requests_served, 8);
    assert_eq!(h.sched.service().served(), 8);
}

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn heartbeat_is_slow_when_idle() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    h.run_until(2000, 100);
    assert_eq!(h.hw.led.levels, vec![true, false, true]);
}

#[test]
fn heartbeat_is_fast_while_logging() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    h.requests.push("/startlog");
    let reports = h.run_until(2000, 100);
    assert_eq!(reports.iter().filter(|r| r.led_toggled).count(), 10);
}
