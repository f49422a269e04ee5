//! Hub context: every piece of mutable state the core owns.
//!
//! One `HubContext` is created at boot and threaded by `&mut` through the
//! scheduler and the request service.  There are no globals; tests build a
//! context, drive it with a virtual clock and inspect it directly.

use log::info;

use crate::adapters::hardware::Hardware;
use crate::app::events::HubEvent;
use crate::app::ports::{
    EventSink, Indicator, LogStore, PeerSource, ThermalImager, ThermometerBus,
};
use crate::config::HubConfig;
use crate::history::{HistoryPoint, TimeSeriesHistory};
use crate::logger::PersistentLogger;
use crate::sensors::thermometer::DiscoveryReport;
use crate::sensors::{DigitalThermometerPoller, ThermalArrayReader};
use crate::telemetry::{self, TelemetrySnapshot};

pub struct HubContext {
    pub config: HubConfig,
    pub thermometers: DigitalThermometerPoller,
    pub thermal: ThermalArrayReader,
    pub logger: PersistentLogger,
    pub history: TimeSeriesHistory,
    /// Most recent aggregated snapshot.
    pub latest: TelemetrySnapshot,
    /// Report of the most recent discovery pass.
    pub last_discovery: Option<DiscoveryReport>,
}

impl HubContext {
    /// Build the context from a validated configuration.
    pub fn new(config: HubConfig) -> Self {
        let thermometers = DigitalThermometerPoller::new(
            config.thermometer_resolution,
            config.conversion_guard_ms,
        );
        let thermal = ThermalArrayReader::new(config.thermal_min_interval_ms);
        let logger = PersistentLogger::new(config.log_interval_ms, config.log_size_ceiling_bytes);
        let history = TimeSeriesHistory::new(config.history_max_age_ms, config.history_max_points);
        let latest = telemetry::snapshot_of(&thermometers, &thermal, 0);
        Self {
            config,
            thermometers,
            thermal,
            logger,
            history,
            latest,
            last_discovery: None,
        }
    }

    /// Boot sequence: mount storage, discover thermometers, bring up the
    /// imager, then request the first conversion straight away.
    pub fn boot<B, I, S, L, P>(
        &mut self,
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
        info!("Hub: booting");
        self.logger.mount(&mut hw.store);
        self.rescan(&mut hw.bus, sink, &[]);
        self.thermal.begin(&mut hw.imager);
        self.thermometers.request_conversion(&mut hw.bus, now_ms);
        self.latest = telemetry::snapshot_of(&self.thermometers, &self.thermal, now_ms);

        sink.emit(&HubEvent::Started {
            thermometers: self.thermometers.thermometer_count(),
            thermal_connected: self.thermal.is_connected(),
            storage_available: self.logger.is_available(),
        });
    }

    /// Run a discovery pass, probing `probe_gpios` first.  The report is
    /// kept and a copy returned.
    pub fn rescan(
        &mut self,
        bus: &mut impl ThermometerBus,
        sink: &mut impl EventSink,
        probe_gpios: &[i32],
    ) -> DiscoveryReport {
        let report = self.thermometers.discover(bus, probe_gpios);
        // Slot bindings may have changed; keep the shared view in step.
        self.latest = telemetry::snapshot_of(&self.thermometers, &self.thermal, self.latest.timestamp);
        sink.emit(&HubEvent::DiscoveryCompleted {
            raw_found: report.raw_found(),
            thermometers: report.thermometer_count,
        });
        self.last_discovery = Some(report.clone());
        report
    }

    /// Aggregate a fresh snapshot and feed it to the history.
    pub fn record_snapshot(
        &mut self,
        peer: &mut impl PeerSource,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> TelemetrySnapshot {
        let snapshot = telemetry::snapshot_of(&self.thermometers, &self.thermal, now_ms);
        self.latest = snapshot;
        self.history
            .ingest(HistoryPoint::from_snapshot(&snapshot, peer.latest()));
        sink.emit(&HubEvent::Telemetry(snapshot));
        snapshot
    }
}
