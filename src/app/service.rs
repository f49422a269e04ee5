//! Request service: answers [`HubRequest`]s from the current hub state.
//!
//! Every handler works on what the context already holds.  Only `/rescan`
//! (one bus enumeration) and the log commands (one store transaction)
//! touch hardware, and both are bounded.
//!
//! ```text
//!  RequestPort ──▶ ┌──────────────────┐ ──▶ Response
//!                  │  RequestService  │
//!   HubContext ◀──▶│  route · render  │ ──▶ EventSink
//!                  └──────────────────┘
//! ```

use log::{debug, info};
use serde_json::{Value, json};

use crate::adapters::hardware::Hardware;
use crate::context::HubContext;
use crate::logger::LogAck;
use crate::sensors::thermometer::DiscoveryReport;

use super::commands::{HubRequest, Response};
use super::ports::{
    EventSink, Indicator, LogStore, PeerSource, RequestPort, ThermalImager, ThermometerBus,
};

/// Round to `places` decimals for JSON output.
fn rounded(value: f32, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (f64::from(value) * scale).round() / scale
}

// ───────────────────────────────────────────────────────────────
// RequestService
// ───────────────────────────────────────────────────────────────

/// Routes requests to handlers and keeps simple counters.
#[derive(Debug, Default)]
pub struct RequestService {
    served: u64,
    unknown: u64,
}

impl RequestService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer up to `limit` pending requests.  Returns how many were taken
    /// from the port.
    pub fn service_pending<B, I, S, L, P>(
        &mut self,
        limit: usize,
        requests: &mut impl RequestPort,
        ctx: &mut HubContext,
        hw: &mut Hardware<B, I, S, L, P>,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> usize
    where
        B: ThermometerBus,
        I: ThermalImager,
        S: LogStore,
        L: Indicator,
        P: PeerSource,
    {
        let mut taken = 0;
        while taken < limit {
            let Some(target) = requests.poll() else { break };
            taken += 1;
            let response = match HubRequest::parse(&target) {
                Some(request) => {
                    debug!("Service: {:?}", request);
                    self.handle(request, ctx, hw, sink, now_ms)
                }
                None => {
                    self.unknown += 1;
                    debug!("Service: unknown path {:?}", target.trim());
                    Response::NotFound("Not found")
                }
            };
            requests.respond(response);
        }
        taken
    }

    /// Answer one parsed request.
    pub fn handle<B, I, S, L, P>(
        &mut self,
        request: HubRequest,
        ctx: &mut HubContext,
        hw: &mut Hardware<B, I, S, L, P>,
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Response
    where
        B: ThermometerBus,
        I: ThermalImager,
        S: LogStore,
        L: Indicator,
        P: PeerSource,
    {
        self.served += 1;
        match request {
            HubRequest::Status => Response::Json(status_json(ctx)),
            HubRequest::ThermalData => Response::Json(thermal_json(ctx)),
            HubRequest::Rescan => {
                info!("Service: rescan requested");
                let probes = ctx.config.probe_gpios.clone();
                let report = ctx.rescan(&mut hw.bus, sink, &probes);
                Response::Json(rescan_json(&report))
            }
            HubRequest::StartLog => {
                Response::Json(ack_json(&ctx.logger.start(&mut hw.store, sink, now_ms)))
            }
            HubRequest::StopLog => Response::Json(ack_json(&ctx.logger.stop(sink))),
            HubRequest::DeleteLog => {
                Response::Json(ack_json(&ctx.logger.delete(&mut hw.store, sink)))
            }
            HubRequest::LogInfo => {
                let info = ctx.logger.info(&hw.store);
                Response::Json(json!({
                    "logging": info.logging,
                    "size": info.size,
                    "totalSpace": info.capacity.total_bytes,
                    "usedSpace": info.capacity.used_bytes,
                    "freeSpace": info.capacity.free_bytes(),
                }))
            }
            HubRequest::Download => match ctx.logger.download(&hw.store) {
                Some(body) => Response::Bytes {
                    content_type: "text/csv",
                    body,
                },
                None => Response::NotFound("No log file"),
            },
            HubRequest::History(window) => {
                let points: Vec<_> = ctx.history.window(window).collect();
                Response::Json(json!({ "points": points }))
            }
        }
    }

    /// Requests answered since boot (unknown paths excluded).
    pub fn served(&self) -> u64 {
        self.served
    }

    pub fn unknown(&self) -> u64 {
        self.unknown
    }
}

// ───────────────────────────────────────────────────────────────
// Renderers
// ───────────────────────────────────────────────────────────────

fn status_json(ctx: &HubContext) -> Value {
    let s = &ctx.latest;
    json!({
        "t1": rounded(s.t1, 2),
        "t2": rounded(s.t2, 2),
        "dsCount": s.ds_count,
        "mlxOk": s.thermal_connected,
        "mlxMax": rounded(s.thermal.max, 1),
        "mlxMin": rounded(s.thermal.min, 1),
        "mlxAvg": rounded(s.thermal.avg, 1),
    })
}

fn thermal_json(ctx: &HubContext) -> Value {
    if !ctx.thermal.is_connected() {
        return json!({ "ok": false });
    }
    let stats = ctx.thermal.stats();
    let pixels: Vec<f64> = ctx
        .thermal
        .frame()
        .pixels
        .iter()
        .map(|&p| rounded(p, 1))
        .collect();
    json!({
        "ok": true,
        "min": rounded(stats.min, 1),
        "max": rounded(stats.max, 1),
        "pixels": pixels,
    })
}

fn rescan_json(report: &DiscoveryReport) -> Value {
    let addresses: Vec<String> = report
        .devices
        .iter()
        .map(|d| d.address.to_hex().as_str().to_owned())
        .collect();
    let probes: Vec<Value> = report
        .probes
        .iter()
        .map(|&(pin, count)| json!({ "pin": pin, "count": count }))
        .collect();
    let pin_state = if report.pin_high { "HIGH" } else { "LOW" };
    json!({
        "addresses": addresses,
        "rawFound": report.raw_found(),
        "dsCount": report.thermometer_count,
        "pin": report.pin,
        "pinState": pin_state,
        "probes": probes,
    })
}

fn ack_json(ack: &LogAck) -> Value {
    json!({ "ok": ack.ok, "msg": ack.msg })
}
