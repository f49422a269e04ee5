//! Hardware bundle: every driven adapter the hub core talks to.
//!
//! The scheduler and the request service take one `&mut Hardware<..>`
//! instead of five separate borrows.  Each field is generic over its port
//! trait, so the same core runs against the bit-banged 1-Wire driver on the
//! device, the simulation backends on the host, and scripted mocks in
//! tests.

use crate::app::ports::{Indicator, LogStore, PeerSource, ThermalImager, ThermometerBus};

/// Concrete peripherals behind the port traits.
pub struct Hardware<B, I, S, L, P> {
    /// 1-Wire bus carrying the DS18B20 thermometers.
    pub bus: B,
    /// MLX90640 thermal imager.
    pub imager: I,
    /// Persistent store backing the CSV log.
    pub store: S,
    /// Heartbeat LED.
    pub led: L,
    /// Power-monitor peer.
    pub peer: P,
}

impl<B, I, S, L, P> Hardware<B, I, S, L, P>
where
    B: ThermometerBus,
    I: ThermalImager,
    S: LogStore,
    L: Indicator,
    P: PeerSource,
{
    pub fn new(bus: B, imager: I, store: S, led: L, peer: P) -> Self {
        Self {
            bus,
            imager,
            store,
            led,
            peer,
        }
    }
}
