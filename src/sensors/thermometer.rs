//! Dual DS18B20 poller on a shared 1-Wire bus.
//!
//! Conversions are non-blocking: [`request_conversion`] broadcasts Convert T
//! and returns; [`try_collect`] refuses to read until the conversion window
//! for the configured resolution has passed.  Reading earlier returns the
//! previous conversion (or the 85 °C power-on value), so the gate is a hard
//! requirement, not an optimisation.
//!
//! Slots are bound to ROM addresses, never to search order.  Only
//! [`discover`] rebinds them.
//!
//! [`request_conversion`]: DigitalThermometerPoller::request_conversion
//! [`try_collect`]: DigitalThermometerPoller::try_collect
//! [`discover`]: DigitalThermometerPoller::discover

use log::{debug, info, warn};

use crate::app::ports::ThermometerBus;
use crate::sensors::address::{DeviceAddress, Family, Resolution};

/// Reading reported before a slot has produced a valid sample.
pub const NO_READING_C: f32 = -127.0;
/// Scratchpad power-on value; a read returning it exactly means the
/// device reset or the conversion never ran.
pub const POWER_ON_RESET_C: f32 = 85.0;

/// Number of logical thermometer slots.
pub const SLOT_COUNT: usize = 2;

/// A sample is kept only if it is inside (−50, 125) °C and not the
/// power-on-reset value.
pub fn sample_is_plausible(celsius: f32) -> bool {
    celsius > -50.0 && celsius < 125.0 && celsius != POWER_ON_RESET_C
}

/// Latest accepted reading of one logical slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermometerReading {
    /// Logical slot, 1 or 2.
    pub slot: u8,
    /// ROM identity of the bound device; `0` when unbound.
    pub device_id: u64,
    pub celsius: f32,
    /// At least one plausible sample has been accepted.
    pub valid: bool,
}

impl ThermometerReading {
    fn unbound(slot: u8) -> Self {
        Self {
            slot,
            device_id: 0,
            celsius: NO_READING_C,
            valid: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    ConversionPending { requested_at: u64 },
}

/// One ROM found by a discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: DeviceAddress,
    pub crc_ok: bool,
    pub family: Family,
}

/// Outcome of [`DigitalThermometerPoller::discover`].
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Every ROM the search returned, in search order.
    pub devices: Vec<DiscoveredDevice>,
    /// CRC-valid thermometers (what `dsCount` reports).
    pub thermometer_count: usize,
    /// Data pin the search ran on.
    pub pin: i32,
    /// Idle level of the data pin; `false` means the pull-up is missing.
    pub pin_high: bool,
    /// Device counts on the candidate pins that could be probed.
    pub probes: Vec<(i32, usize)>,
}

impl DiscoveryReport {
    pub fn raw_found(&self) -> usize {
        self.devices.len()
    }
}

/// Non-blocking conversion state machine for the two tracked thermometers.
pub struct DigitalThermometerPoller {
    state: PollerState,
    resolution: Resolution,
    /// Effective conversion wait (ms), never below the datasheet time.
    conversion_wait_ms: u32,
    bindings: [Option<DeviceAddress>; SLOT_COUNT],
    readings: [ThermometerReading; SLOT_COUNT],
    thermometer_count: usize,
    rejected_samples: u32,
}

impl DigitalThermometerPoller {
    pub fn new(resolution: Resolution, conversion_guard_ms: u32) -> Self {
        Self {
            state: PollerState::Idle,
            resolution,
            conversion_wait_ms: conversion_guard_ms.max(resolution.conversion_time_ms()),
            bindings: [None; SLOT_COUNT],
            readings: [
                ThermometerReading::unbound(1),
                ThermometerReading::unbound(2),
            ],
            thermometer_count: 0,
            rejected_samples: 0,
        }
    }

    /// Broadcast a conversion.  While one is already pending this just
    /// restarts the wait.
    pub fn request_conversion(&mut self, bus: &mut impl ThermometerBus, now_ms: u64) {
        if let Err(e) = bus.request_conversion() {
            // Nothing answered the reset.  Stay idle; the next request
            // interval tries again.
            debug!("DS18B20: conversion request failed ({})", e);
            return;
        }
        self.state = PollerState::ConversionPending {
            requested_at: now_ms,
        };
    }

    /// Collect the pending conversion if its window has elapsed.
    ///
    /// Returns `true` if the bus was read (whether or not the samples were
    /// plausible).
    pub fn try_collect(&mut self, bus: &mut impl ThermometerBus, now_ms: u64) -> bool {
        let PollerState::ConversionPending { requested_at } = self.state else {
            return false;
        };
        if now_ms.saturating_sub(requested_at) < u64::from(self.conversion_wait_ms) {
            return false;
        }
        if !bus.is_ready() {
            return false;
        }
        self.state = PollerState::Idle;

        for (binding, reading) in self.bindings.iter().zip(self.readings.iter_mut()) {
            let Some(address) = binding else { continue };
            match bus.read_celsius(*address) {
                Ok(t) if sample_is_plausible(t) => {
                    reading.celsius = t;
                    reading.valid = true;
                }
                Ok(t) => {
                    self.rejected_samples = self.rejected_samples.saturating_add(1);
                    debug!("DS18B20: slot {} rejected {:.2} C", reading.slot, t);
                }
                Err(e) => {
                    self.rejected_samples = self.rejected_samples.saturating_add(1);
                    debug!("DS18B20: slot {} read failed ({})", reading.slot, e);
                }
            }
        }
        true
    }

    /// Enumerate the bus, validate and classify every ROM, and rebind the
    /// slots to the first two CRC-valid thermometers.
    ///
    /// A slot whose device is still first/second keeps its reading; a slot
    /// bound to a different device restarts at [`NO_READING_C`].  Any
    /// pending conversion is abandoned.
    pub fn discover(&mut self, bus: &mut impl ThermometerBus, probe_gpios: &[i32]) -> DiscoveryReport {
        let mut report = DiscoveryReport {
            pin: bus.pin(),
            ..DiscoveryReport::default()
        };

        for &gpio in probe_gpios {
            if let Some(count) = bus.probe_pin(gpio) {
                info!("DS18B20: GPIO {} → {} device(s)", gpio, count);
                report.probes.push((gpio, count));
            }
        }

        report.pin_high = bus.idle_level_high();
        if !report.pin_high {
            warn!(
                "DS18B20: GPIO {} idles LOW — pull-up missing?",
                report.pin
            );
        }

        for address in bus.search() {
            let crc_ok = address.crc_valid();
            let family = address.family();
            if crc_ok {
                info!("DS18B20: {} — {}", address, family);
            } else {
                warn!("DS18B20: {} — CRC ERROR", address);
            }
            report.devices.push(DiscoveredDevice {
                address,
                crc_ok,
                family,
            });
        }

        let mut thermometers = report
            .devices
            .iter()
            .filter(|d| d.crc_ok && d.family.is_thermometer())
            .map(|d| d.address);
        report.thermometer_count = thermometers.clone().count();

        let previous = self.bindings;
        let previous_readings = self.readings;
        for (i, slot) in self.bindings.iter_mut().enumerate() {
            *slot = thermometers.next();
            let slot_no = (i + 1) as u8;
            self.readings[i] = match *slot {
                None => ThermometerReading::unbound(slot_no),
                Some(addr) => match previous.iter().position(|p| *p == Some(addr)) {
                    Some(j) => ThermometerReading {
                        slot: slot_no,
                        ..previous_readings[j]
                    },
                    None => ThermometerReading {
                        slot: slot_no,
                        device_id: addr.id(),
                        celsius: NO_READING_C,
                        valid: false,
                    },
                },
            };
        }
        self.thermometer_count = report.thermometer_count;
        self.state = PollerState::Idle;

        if report.thermometer_count > 0 {
            if let Err(e) = bus.set_resolution(self.resolution) {
                warn!("DS18B20: set resolution failed ({})", e);
            }
        }

        info!(
            "DS18B20: scan complete — {} raw, {} thermometer(s) bound",
            report.raw_found(),
            report.thermometer_count
        );
        report
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn reading(&self, slot: usize) -> ThermometerReading {
        self.readings[slot]
    }

    pub fn readings(&self) -> [ThermometerReading; SLOT_COUNT] {
        self.readings
    }

    pub fn binding(&self, slot: usize) -> Option<DeviceAddress> {
        self.bindings[slot]
    }

    /// CRC-valid thermometers seen by the last discovery.
    pub fn thermometer_count(&self) -> usize {
        self.thermometer_count
    }

    pub fn conversion_wait_ms(&self) -> u32 {
        self.conversion_wait_ms
    }

    /// Samples dropped by the plausibility filter or a failed read.
    pub fn rejected_samples(&self) -> u32 {
        self.rejected_samples
    }
}
