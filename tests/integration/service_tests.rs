//! Request/response surface: JSON shapes, rounding, rescan reporting and
//! history windows, all driven through the scheduler's request slots.

use serde_json::json;
use thermhub::adapters::hardware::Hardware;
use thermhub::adapters::memory_store::MemoryLogStore;
use thermhub::app::commands::Response;
use thermhub::config::HubConfig;
use thermhub::history::PeerReading;
use thermhub::sensors::address::DeviceAddress;

use crate::mock_hw::{Harness, MockBus, MockImager, MockLed, MockPeer, rom};

// ── /status ───────────────────────────────────────────────────

#[test]
fn status_reports_rounded_readings() {
    let mut h = Harness::with_defaults(&[23.456], MockImager::uniform(30.0));
    h.run_until(1000, 100);

    let v = h.request_json("/status");
    assert_eq!(v["t1"], 23.46);
    assert_eq!(v["t2"], -127.0, "unbound slot reports the sentinel");
    assert_eq!(v["dsCount"], 1);
    assert_eq!(v["mlxOk"], true);
    assert_eq!(v["mlxMax"], 40.0);
    assert_eq!(v["mlxMin"], 30.0);
    assert_eq!(v["mlxAvg"], 30.0);
}

#[test]
fn status_before_first_conversion_uses_sentinels() {
    let mut h = Harness::with_defaults(&[20.0, 21.0], MockImager::absent());
    let v = h.request_json("/status");
    assert_eq!(v["t1"], -127.0);
    assert_eq!(v["t2"], -127.0);
    assert_eq!(v["dsCount"], 2);
    assert_eq!(v["mlxOk"], false);
}

#[test]
fn status_follows_the_aggregated_snapshot() {
    let mut h = Harness::with_defaults(&[21.0], MockImager::absent());
    h.run_until(1000, 100);
    h.hw.bus.set_temp(0, 25.0);

    // The 2000 ms conversion is collected at 2800; the next snapshot is due
    // at 3000.
    h.now = 1100;
    h.run_until(2900, 100);
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 25.0);
    assert_eq!(h.request_json("/status")["t1"], 21.0);
    assert_eq!(h.ctx.history.last().map(|p| p.t1), Some(21.0));

    h.now = 3000;
    h.tick();
    assert_eq!(h.request_json("/status")["t1"], 25.0);
    assert_eq!(h.ctx.history.last().map(|p| p.t1), Some(25.0));
}

#[test]
fn rescan_refreshes_status_count() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    assert_eq!(h.request_json("/status")["dsCount"], 1);
    h.hw.bus.devices.push((rom(2), 21.0));
    h.request_json("/rescan");
    assert_eq!(h.request_json("/status")["dsCount"], 2);
}

// ── /thermaldata ──────────────────────────────────────────────

#[test]
fn thermal_data_without_imager_is_not_ok() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    assert_eq!(h.request_json("/thermaldata"), json!({ "ok": false }));
}

#[test]
fn thermal_data_carries_full_frame() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::uniform(25.04));
    h.tick();

    let v = h.request_json("/thermaldata");
    assert_eq!(v["ok"], true);
    assert_eq!(v["min"], 25.0);
    assert_eq!(v["max"], 35.0);
    let pixels = v["pixels"].as_array().expect("pixel array");
    assert_eq!(pixels.len(), 768);
    assert_eq!(pixels[0], 35.0);
    assert_eq!(pixels[767], 25.0);
}

// ── /rescan ───────────────────────────────────────────────────

#[test]
fn rescan_lists_every_rom_and_probes_pins() {
    let mut h = Harness::with_defaults(&[20.0, 21.0], MockImager::absent());
    let mut corrupt = *rom(9).bytes();
    corrupt[7] ^= 0xFF;
    h.hw.bus.devices.push((DeviceAddress::new(corrupt), 22.0));

    let v = h.request_json("/rescan");
    assert_eq!(v["rawFound"], 3);
    assert_eq!(v["dsCount"], 2, "CRC failures are listed but not counted");
    assert_eq!(v["pin"], 13);
    assert_eq!(v["pinState"], "HIGH");
    assert_eq!(v["addresses"][0], rom(1).to_string());
    assert_eq!(v["addresses"].as_array().map(Vec::len), Some(3));

    let probes = v["probes"].as_array().expect("probe list");
    assert_eq!(probes.len(), HubConfig::default().probe_gpios.len());
    assert_eq!(probes[0], json!({ "pin": 13, "count": 3 }));
    assert_eq!(probes[1]["count"], 0);
}

#[test]
fn rescan_reports_floating_low_line() {
    let mut h = Harness::with_defaults(&[], MockImager::absent());
    h.hw.bus.pin_high = false;
    let v = h.request_json("/rescan");
    assert_eq!(v["pinState"], "LOW");
    assert_eq!(v["rawFound"], 0);
    assert!(h.ctx.last_discovery.is_some());
}

#[test]
fn rescan_keeps_reading_of_unchanged_device() {
    let mut h = Harness::with_defaults(&[20.0, 21.0], MockImager::absent());
    h.run_until(1000, 100);
    h.request_json("/rescan");
    assert_eq!(h.ctx.thermometers.reading(0).celsius, 20.0);
    assert_eq!(h.ctx.thermometers.reading(1).celsius, 21.0);
}

// ── /history ──────────────────────────────────────────────────

#[test]
fn history_window_trims_to_recent_points() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    h.run_until(600_000, 1000);

    let all = h.request_json("/history");
    assert_eq!(all["points"].as_array().map(Vec::len), Some(601));

    let recent = h.request_json("/history?window=5m");
    let points = recent["points"].as_array().expect("points");
    assert_eq!(points.len(), 301);
    assert_eq!(points[0]["ts"], 300_000);

    let fallback = h.request_json("/history?window=bogus");
    assert_eq!(fallback["points"].as_array().map(Vec::len), Some(601));
}

#[test]
fn history_points_merge_peer_values() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    h.tick();
    h.hw.peer.reading = Some(PeerReading {
        voltage: Some(12.0),
        current: Some(1.5),
        power: None,
    });
    h.now = 1000;
    h.tick();

    let v = h.request_json("/history?window=all");
    let points = v["points"].as_array().expect("points");
    assert_eq!(points.len(), 2);
    assert!(points[0]["voltage"].is_null());
    assert_eq!(points[1]["voltage"], 12.0);
    assert_eq!(points[1]["current"], 1.5);
    assert!(points[1]["power"].is_null());
}

// ── Routing ───────────────────────────────────────────────────

#[test]
fn unknown_path_is_not_found() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    let r = h.request("/firmware").clone();
    assert_eq!(r, Response::NotFound("Not found"));
    assert_eq!(r.status_code(), 404);
    assert_eq!(h.sched.service().unknown(), 1);
}

// ── Storage unavailable ───────────────────────────────────────

#[test]
fn log_endpoints_degrade_without_storage() {
    let hw = Hardware::new(
        MockBus::with_temps(&[20.0]),
        MockImager::absent(),
        MemoryLogStore::unmountable(),
        MockLed::default(),
        MockPeer::default(),
    );
    let mut h = Harness::boot(HubConfig::default(), hw);

    assert_eq!(
        h.request_json("/startlog"),
        json!({ "ok": false, "msg": "Storage unavailable" })
    );
    assert_eq!(
        h.request_json("/loginfo"),
        json!({ "logging": false, "size": 0, "totalSpace": 0, "usedSpace": 0, "freeSpace": 0 })
    );
    assert_eq!(h.request("/download"), &Response::NotFound("No log file"));
}
