//! Mock hardware for integration tests.
//!
//! Scripted bus, imager, LED, peer and request queue.  Everything records
//! what the core did to it so tests can assert on the full history without
//! touching real GPIO or I²C.

use std::collections::VecDeque;

use thermhub::adapters::hardware::Hardware;
use thermhub::adapters::memory_store::MemoryLogStore;
use thermhub::app::commands::Response;
use thermhub::app::events::HubEvent;
use thermhub::app::ports::{
    EventSink, Indicator, MAX_BUS_DEVICES, PeerSource, RequestPort, ThermalImager, ThermometerBus,
};
use thermhub::config::HubConfig;
use thermhub::error::SensorError;
use thermhub::history::PeerReading;
use thermhub::sensors::address::{DeviceAddress, Resolution};
use thermhub::sensors::thermal::THERMAL_PIXELS;

pub fn rom(n: u8) -> DeviceAddress {
    DeviceAddress::with_crc(0x28, [n, 0x11, 0x22, 0x33, 0x44, 0x55])
}

// ── 1-Wire bus ────────────────────────────────────────────────

pub struct MockBus {
    pub devices: Vec<(DeviceAddress, f32)>,
    pub ready: bool,
    pub pin_high: bool,
    pub conversions: u32,
    pub reads: u32,
    pub resolution: Option<Resolution>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn with_temps(temps: &[f32]) -> Self {
        Self {
            devices: temps
                .iter()
                .enumerate()
                .map(|(i, t)| (rom(i as u8 + 1), *t))
                .collect(),
            ready: true,
            pin_high: true,
            conversions: 0,
            reads: 0,
            resolution: None,
        }
    }

    pub fn set_temp(&mut self, index: usize, celsius: f32) {
        self.devices[index].1 = celsius;
    }
}

impl ThermometerBus for MockBus {
    fn request_conversion(&mut self) -> Result<(), SensorError> {
        if self.devices.is_empty() {
            return Err(SensorError::NoPresence);
        }
        self.conversions += 1;
        Ok(())
    }

    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn read_celsius(&mut self, address: DeviceAddress) -> Result<f32, SensorError> {
        self.reads += 1;
        self.devices
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, t)| *t)
            .ok_or(SensorError::NoPresence)
    }

    fn search(&mut self) -> heapless::Vec<DeviceAddress, MAX_BUS_DEVICES> {
        self.devices.iter().map(|(a, _)| *a).collect()
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), SensorError> {
        self.resolution = Some(resolution);
        Ok(())
    }

    fn pin(&self) -> i32 {
        13
    }

    fn idle_level_high(&mut self) -> bool {
        self.pin_high
    }

    fn probe_pin(&mut self, gpio: i32) -> Option<usize> {
        Some(if gpio == 13 { self.devices.len() } else { 0 })
    }
}

// ── Thermal imager ────────────────────────────────────────────

pub struct MockImager {
    pub present: bool,
    pub value: f32,
    pub fail: bool,
    pub captures: u32,
}

#[allow(dead_code)]
impl MockImager {
    pub fn uniform(value: f32) -> Self {
        Self {
            present: true,
            value,
            fail: false,
            captures: 0,
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::uniform(0.0)
        }
    }
}

impl ThermalImager for MockImager {
    fn begin(&mut self) -> Result<(), SensorError> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotDetected)
        }
    }

    fn capture_frame(&mut self, out: &mut [f32; THERMAL_PIXELS]) -> Result<(), SensorError> {
        self.captures += 1;
        if self.fail {
            return Err(SensorError::FrameTransfer);
        }
        out.fill(self.value);
        // One hot pixel so max differs from avg.
        out[0] = self.value + 10.0;
        Ok(())
    }
}

// ── LED / peer ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLed {
    pub levels: Vec<bool>,
}

impl Indicator for MockLed {
    fn set(&mut self, on: bool) {
        self.levels.push(on);
    }
}

#[derive(Default)]
pub struct MockPeer {
    pub reading: Option<PeerReading>,
}

impl PeerSource for MockPeer {
    fn latest(&mut self) -> Option<PeerReading> {
        self.reading
    }
}

// ── Requests / events ─────────────────────────────────────────

#[derive(Default)]
pub struct MockRequests {
    pub pending: VecDeque<String>,
    pub responses: Vec<Response>,
}

#[allow(dead_code)]
impl MockRequests {
    pub fn push(&mut self, path: &str) {
        self.pending.push_back(path.to_owned());
    }

    pub fn last_json(&self) -> &serde_json::Value {
        match self.responses.last() {
            Some(Response::Json(v)) => v,
            other => panic!("expected a JSON response, got {other:?}"),
        }
    }
}

impl RequestPort for MockRequests {
    fn poll(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    fn respond(&mut self, response: Response) {
        self.responses.push(response);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<HubEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &HubEvent) {
        self.events.push(event.clone());
    }
}

// ── Bundle ────────────────────────────────────────────────────

pub type MockHw = Hardware<MockBus, MockImager, MemoryLogStore, MockLed, MockPeer>;

pub fn mock_hw(temps: &[f32], imager: MockImager) -> MockHw {
    Hardware::new(
        MockBus::with_temps(temps),
        imager,
        MemoryLogStore::new(HubConfig::default().storage_capacity_bytes),
        MockLed::default(),
        MockPeer::default(),
    )
}

// ── Harness ───────────────────────────────────────────────────

use thermhub::context::HubContext;
use thermhub::scheduler::{Scheduler, TickReport};

/// A booted hub on mock hardware with a virtual clock.
pub struct Harness {
    pub ctx: HubContext,
    pub hw: MockHw,
    pub sched: Scheduler,
    pub requests: MockRequests,
    pub sink: RecordingSink,
    pub now: u64,
}

#[allow(dead_code)]
impl Harness {
    pub fn boot(config: HubConfig, hw: MockHw) -> Self {
        let mut h = Self {
            sched: Scheduler::new(&config),
            ctx: HubContext::new(config),
            hw,
            requests: MockRequests::default(),
            sink: RecordingSink::default(),
            now: 0,
        };
        h.sched.start(&mut h.ctx, &mut h.hw, &mut h.sink, 0);
        h
    }

    pub fn with_defaults(temps: &[f32], imager: MockImager) -> Self {
        Self::boot(HubConfig::default(), mock_hw(temps, imager))
    }

    pub fn tick(&mut self) -> TickReport {
        self.sched
            .tick(&mut self.ctx, &mut self.hw, &mut self.requests, &mut self.sink, self.now)
    }

    /// Tick at `now`, then every `step_ms` up to and including `until`.
    pub fn run_until(&mut self, until: u64, step_ms: u64) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while self.now <= until {
            reports.push(self.tick());
            self.now += step_ms;
        }
        self.now -= step_ms;
        reports
    }

    /// Submit one request and tick once to get it answered.
    pub fn request(&mut self, path: &str) -> &thermhub::app::commands::Response {
        self.requests.push(path);
        self.tick();
        self.requests.responses.last().expect("request was answered")
    }

    pub fn request_json(&mut self, path: &str) -> serde_json::Value {
        self.requests.push(path);
        self.tick();
        self.requests.last_json().clone()
    }
}
