//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing hub events to the `log` facade
//! (UART on the device, stderr through `env_logger` on the host).  Each
//! event is one tagged line so the serial console stays greppable.

use log::{debug, info, warn};

use crate::app::events::{HubEvent, StopReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`HubEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &HubEvent) {
        match event {
            HubEvent::Started {
                thermometers,
                thermal_connected,
                storage_available,
            } => {
                info!(
                    "START | ds18b20={} | mlx90640={} | storage={}",
                    thermometers,
                    if *thermal_connected { "OK" } else { "ABSENT" },
                    if *storage_available { "OK" } else { "UNAVAILABLE" },
                );
            }
            HubEvent::DiscoveryCompleted {
                raw_found,
                thermometers,
            } => {
                info!("SCAN | raw={} thermometers={}", raw_found, thermometers);
            }
            HubEvent::LogStarted => {
                info!("LOG | session started");
            }
            HubEvent::LogStopped {
                reason,
                bytes_written,
            } => match reason {
                StopReason::CeilingReached | StopReason::StorageFull => {
                    warn!("LOG | auto-stopped ({:?}) after {} bytes", reason, bytes_written);
                }
                _ => info!("LOG | stopped ({:?}) after {} bytes", reason, bytes_written),
            },
            HubEvent::LogDeleted => {
                info!("LOG | deleted");
            }
            HubEvent::Telemetry(s) => {
                debug!(
                    "TELEM | t1={:.2} t2={:.2} | ds={} | mlx={} max={:.1} min={:.1} avg={:.1}",
                    s.t1,
                    s.t2,
                    s.ds_count,
                    if s.thermal_connected { "OK" } else { "--" },
                    s.thermal.max,
                    s.thermal.min,
                    s.thermal.avg,
                );
            }
        }
    }
}
