//! Cooperative scheduler.
//!
//! One loop, one thread.  Every step is rate-gated against a monotonic
//! `now_ms` supplied by the caller, so the whole pipeline can be driven
//! from a test with a virtual clock.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Scheduler::tick(now)                    │
//! │                                                              │
//! │  1. requests ──▶ RequestService (bounded batch)              │
//! │  2. thermal  ──▶ ThermalArrayReader::poll (gated)            │
//! │     requests ──▶ RequestService (capture can take ~250 ms)   │
//! │  3. DS18B20  ──▶ try_collect (conversion window)             │
//! │  4. DS18B20  ──▶ request_conversion   (every 2 s)            │
//! │  5. snapshot ──▶ TimeSeriesHistory    (every 1 s)            │
//! │  6. snapshot ──▶ PersistentLogger     (own interval)         │
//! │  7. heartbeat LED (fast while logging, slow otherwise)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use log::info;

use crate::adapters::hardware::Hardware;
use crate::app::ports::{
    EventSink, Indicator, LogStore, PeerSource, RequestPort, ThermalImager, ThermometerBus,
};
use crate::app::service::RequestService;
use crate::config::HubConfig;
use crate::context::HubContext;
use crate::drivers::status_led::Heartbeat;

// ═══════════════════════════════════════════════════════════════
//  Interval gate
// ═══════════════════════════════════════════════════════════════

/// Fires at most once per `period_ms`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalGate {
    period_ms: u32,
    last: Option<u64>,
}

impl IntervalGate {
    /// A gate that fires on its first check.
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last: None,
        }
    }

    /// Treat `now_ms` as the last firing.
    pub fn arm(&mut self, now_ms: u64) {
        self.last = Some(now_ms);
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.period_ms),
        }
    }

    /// Fire if due.  Returns `true` when the gated step should run.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        self.last = Some(now_ms);
        true
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// What one iteration did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub requests_served: usize,
    pub frame_captured: bool,
    pub thermometers_read: bool,
    pub conversion_requested: bool,
    pub snapshot_taken: bool,
    pub row_logged: bool,
    pub led_toggled: bool,
}

pub struct Scheduler {
    conversion: IntervalGate,
    snapshot: IntervalGate,
    heartbeat: Heartbeat,
    service: RequestService,
    max_requests_per_slot: usize,
    ticks: u64,
}

impl Scheduler {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            conversion: IntervalGate::new(config.conversion_request_interval_ms),
            snapshot: IntervalGate::new(config.snapshot_interval_ms),
            heartbeat: Heartbeat::new(config.heartbeat_fast_ms, config.heartbeat_slow_ms),
            service: RequestService::new(),
            max_requests_per_slot: config.max_requests_per_slot,
            ticks: 0,
        }
    }

    /// Boot the hub and light the heartbeat LED.
    pub fn start<B, I, S, L, P>(
        &mut self,
        ctx: &mut HubContext,
        hw: &mut Hardware<B, I, S, L, P>,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) where
        B: ThermometerBus,
        I: ThermalImager,
        S: LogStore,
        L: Indicator,
        P: PeerSource,
    {
        ctx.boot(hw, sink, now_ms);
        // Boot already issued the first conversion.
        self.conversion.arm(now_ms);
        self.heartbeat.set(&mut hw.led, true, now_ms);
        info!(
            "Scheduler: running (conversion every {} ms, snapshot every {} ms)",
            self.conversion.period_ms(),
            self.snapshot.period_ms()
        );
    }

    /// Run one loop iteration.  Never blocks beyond the bounded hardware
    /// transactions of the individual steps.
    pub fn tick<B, I, S, L, P>(
        &mut self,
        ctx: &mut HubContext,
        hw: &mut Hardware<B, I, S, L, P>,
        requests: &mut impl RequestPort,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> TickReport
    where
        B: ThermometerBus,
        I: ThermalImager,
        S: LogStore,
        L: Indicator,
        P: PeerSource,
    {
        self.ticks += 1;
        let limit = self.max_requests_per_slot;
        let mut report = TickReport::default();

        // 1. Requests
        report.requests_served += self
            .service
            .service_pending(limit, requests, ctx, hw, sink, now_ms);

        // 2. Thermal capture, bracketed by request servicing
        if ctx.thermal.is_connected() {
            report.frame_captured = ctx.thermal.poll(&mut hw.imager, now_ms);
            report.requests_served += self
                .service
                .service_pending(limit, requests, ctx, hw, sink, now_ms);
        }

        // 3. Thermometer completion
        report.thermometers_read = ctx.thermometers.try_collect(&mut hw.bus, now_ms);

        // 4. New conversion
        if self.conversion.fire(now_ms) {
            ctx.thermometers.request_conversion(&mut hw.bus, now_ms);
            report.conversion_requested = true;
        }

        // 5. Snapshot → history
        if self.snapshot.fire(now_ms) {
            ctx.record_snapshot(&mut hw.peer, sink, now_ms);
            report.snapshot_taken = true;
        }

        // 6. Logger, from the same snapshot the history just took
        if ctx.logger.is_active() {
            report.row_logged = ctx.logger.append(&mut hw.store, &ctx.latest, sink, now_ms);
        }

        // 7. Heartbeat
        report.led_toggled = self
            .heartbeat
            .update(&mut hw.led, ctx.logger.is_active(), now_ms);

        report
    }

    /// Iterations run since boot.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn service(&self) -> &RequestService {
        &self.service
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
