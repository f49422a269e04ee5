//! Logging session lifecycle through the request surface: start, rows on
//! the log interval, download, loginfo, stop, delete and the automatic
//! stops on the size ceiling or a full partition.

use serde_json::json;
use thermhub::adapters::hardware::Hardware;
use thermhub::adapters::memory_store::MemoryLogStore;
use thermhub::app::commands::Response;
use thermhub::app::events::{HubEvent, StopReason};
use thermhub::config::HubConfig;
use thermhub::logger::LOG_HEADER;

use crate::mock_hw::{Harness, MockBus, MockImager, MockLed, MockPeer, mock_hw};

fn csv(h: &mut Harness) -> String {
    match h.request("/download") {
        Response::Bytes { content_type, body } => {
            assert_eq!(*content_type, "text/csv");
            String::from_utf8(body.clone()).expect("utf-8 log")
        }
        other => panic!("expected CSV bytes, got {other:?}"),
    }
}

fn stop_reasons(h: &Harness) -> Vec<StopReason> {
    h.sink
        .events
        .iter()
        .filter_map(|e| match e {
            HubEvent::LogStopped { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect()
}

#[test]
fn session_writes_one_row_per_interval() {
    let mut h = Harness::with_defaults(&[23.45, 19.0], MockImager::uniform(30.0));
    assert_eq!(
        h.request_json("/startlog"),
        json!({ "ok": true, "msg": "Logging started" })
    );
    h.now = 100;
    h.run_until(5000, 100);

    assert_eq!(h.ctx.logger.rows_written(), 5);
    let log = csv(&mut h);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(format!("{}\n", lines[0]), LOG_HEADER);
    assert_eq!(lines[1], "1,23.45,19.00,40.0,30.0");
    assert_eq!(lines[5], "5,23.45,19.00,40.0,30.0");
}

#[test]
fn rows_before_first_reading_carry_sentinels() {
    let cfg = HubConfig {
        log_interval_ms: 500,
        ..HubConfig::default()
    };
    let mut h = Harness::boot(cfg, mock_hw(&[20.0], MockImager::absent()));
    h.request_json("/startlog");
    h.now = 500;
    h.tick();

    let log = csv(&mut h);
    assert_eq!(log.lines().nth(1), Some("0,-127.00,-127.00,-40.0,0.0"));
}

#[test]
fn loginfo_tracks_session_and_usage() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    let idle = h.request_json("/loginfo");
    assert_eq!(idle["logging"], false);
    assert_eq!(idle["size"], 0);

    h.request_json("/startlog");
    let v = h.request_json("/loginfo");
    let total = HubConfig::default().storage_capacity_bytes;
    let header = LOG_HEADER.len() as u64;
    assert_eq!(v["logging"], true);
    assert_eq!(v["size"], header);
    assert_eq!(v["totalSpace"], total);
    assert_eq!(v["usedSpace"], header);
    assert_eq!(v["freeSpace"], total - header);
}

#[test]
fn stop_is_idempotent_and_keeps_the_file() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    h.request_json("/startlog");
    h.now = 100;
    h.run_until(2000, 100);

    let ack = json!({ "ok": true, "msg": "Logging stopped" });
    assert_eq!(h.request_json("/stoplog"), ack);
    assert_eq!(h.request_json("/stoplog"), ack);
    assert_eq!(stop_reasons(&h), vec![StopReason::Requested]);

    let rows = h.ctx.logger.rows_written();
    h.run_until(5000, 100);
    assert_eq!(h.ctx.logger.rows_written(), rows, "no rows after stop");
    assert_eq!(csv(&mut h).lines().count() as u64, rows + 1);
}

#[test]
fn restart_truncates_previous_session() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    h.request_json("/startlog");
    h.now = 100;
    h.run_until(3000, 100);
    h.request_json("/startlog");

    assert_eq!(csv(&mut h), LOG_HEADER);
}

#[test]
fn delete_stops_and_removes() {
    let mut h = Harness::with_defaults(&[20.0], MockImager::absent());
    h.request_json("/startlog");
    h.now = 100;
    h.run_until(1500, 100);

    assert_eq!(
        h.request_json("/deletelog"),
        json!({ "ok": true, "msg": "Log deleted" })
    );
    assert!(!h.ctx.logger.is_active());
    assert_eq!(stop_reasons(&h), vec![StopReason::Deleted]);
    assert_eq!(h.request("/download"), &Response::NotFound("No log file"));
    assert_eq!(
        h.request_json("/deletelog"),
        json!({ "ok": true, "msg": "No log file" })
    );
}

#[test]
fn ceiling_stops_session_automatically() {
    let cfg = HubConfig {
        log_size_ceiling_bytes: 100,
        ..HubConfig::default()
    };
    let mut h = Harness::boot(
        cfg,
        mock_hw(&[23.45, 19.0], MockImager::uniform(30.0)),
    );
    h.request_json("/startlog");
    h.now = 100;
    h.run_until(10_000, 100);

    // 32-byte header plus 24-byte rows: the check before the fourth row
    // sees 104 bytes.
    assert!(!h.ctx.logger.is_active());
    assert_eq!(h.ctx.logger.rows_written(), 3);
    assert_eq!(stop_reasons(&h), vec![StopReason::CeilingReached]);
    assert_eq!(h.request_json("/loginfo")["logging"], false);
}

#[test]
fn full_partition_stops_session() {
    let hw = Hardware::new(
        MockBus::with_temps(&[23.45, 19.0]),
        MockImager::uniform(30.0),
        MemoryLogStore::new(80),
        MockLed::default(),
        MockPeer::default(),
    );
    let mut h = Harness::boot(HubConfig::default(), hw);
    h.request_json("/startlog");
    h.now = 100;
    h.run_until(10_000, 100);

    // Room for the header and two rows only.
    assert_eq!(h.ctx.logger.rows_written(), 2);
    assert_eq!(stop_reasons(&h), vec![StopReason::StorageFull]);
    let written = h.sink.events.iter().find_map(|e| match e {
        HubEvent::LogStopped { bytes_written, .. } => Some(*bytes_written),
        _ => None,
    });
    assert_eq!(written, Some(80));
}
