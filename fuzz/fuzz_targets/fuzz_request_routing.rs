//! Fuzz target: request routing
//!
//! Feeds arbitrary request lines through `HubRequest::parse` and, when they
//! parse, through the full request service on simulated hardware.  Every
//! line must produce exactly one response and nothing may panic.
//!
//! cargo fuzz run fuzz_request_routing

#![no_main]

use libfuzzer_sys::fuzz_target;
use thermhub::adapters::hardware::Hardware;
use thermhub::adapters::memory_store::MemoryLogStore;
use thermhub::adapters::sim::{NoPeer, SimThermalImager, SimThermometerBus};
use thermhub::app::commands::{HubRequest, Response};
use thermhub::app::events::HubEvent;
use thermhub::app::ports::{EventSink, RequestPort};
use thermhub::config::HubConfig;
use thermhub::context::HubContext;
use thermhub::drivers::status_led::MemoryLed;
use thermhub::scheduler::Scheduler;

struct Lines {
    pending: Vec<String>,
    answered: usize,
}

impl RequestPort for Lines {
    fn poll(&mut self) -> Option<String> {
        self.pending.pop()
    }

    fn respond(&mut self, _response: Response) {
        self.answered += 1;
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &HubEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let lines: Vec<String> = text.lines().take(32).map(str::to_owned).collect();
    for line in &lines {
        let _ = HubRequest::parse(line);
    }

    let config = HubConfig::default();
    let mut hw = Hardware::new(
        SimThermometerBus::new(config.one_wire_gpio),
        SimThermalImager::new(),
        MemoryLogStore::new(4096),
        MemoryLed::default(),
        NoPeer,
    );
    let mut sched = Scheduler::new(&config);
    let mut ctx = HubContext::new(config);
    let mut sink = Discard;
    sched.start(&mut ctx, &mut hw, &mut sink, 0);

    let expected = lines.len();
    let mut port = Lines {
        pending: lines,
        answered: 0,
    };
    let mut now = 0u64;
    while !port.pending.is_empty() {
        now += 250;
        sched.tick(&mut ctx, &mut hw, &mut port, &mut sink, now);
    }
    assert_eq!(port.answered, expected, "every request gets one response");
});
