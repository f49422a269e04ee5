//! Simulation backends for host runs.
//!
//! Stand-ins for the 1-Wire bus, the thermal imager and the power-monitor
//! peer so the full hub (scheduler, logger, request interface) can run on
//! a development machine.  Values drift slowly and deterministically.

use log::info;

use crate::app::ports::{MAX_BUS_DEVICES, PeerSource, ThermalImager, ThermometerBus};
use crate::error::SensorError;
use crate::history::PeerReading;
use crate::sensors::address::{DeviceAddress, Family, Resolution};
use crate::sensors::thermal::{THERMAL_COLS, THERMAL_PIXELS, THERMAL_ROWS};

// ---------------------------------------------------------------------------
// 1-Wire bus
// ---------------------------------------------------------------------------

/// A bus with two DS18B20s whose readings drift around fixed set points.
pub struct SimThermometerBus {
    pin: i32,
    devices: Vec<(DeviceAddress, f32)>,
    conversions: u32,
    resolution: Resolution,
}

impl SimThermometerBus {
    pub fn new(pin: i32) -> Self {
        Self {
            pin,
            devices: vec![
                (
                    DeviceAddress::with_crc(Family::DS18B20_CODE, [0x5E, 0x1A, 0x0B, 0x00, 0x00, 0x80]),
                    22.5,
                ),
                (
                    DeviceAddress::with_crc(Family::DS18B20_CODE, [0x91, 0x4C, 0x0B, 0x00, 0x00, 0x4F]),
                    31.0,
                ),
            ],
            conversions: 0,
            resolution: Resolution::Bits12,
        }
    }

    fn quantise(&self, celsius: f32) -> f32 {
        let step = self.resolution.step_celsius();
        (celsius / step).round() * step
    }
}

impl ThermometerBus for SimThermometerBus {
    fn request_conversion(&mut self) -> Result<(), SensorError> {
        if self.devices.is_empty() {
            return Err(SensorError::NoPresence);
        }
        self.conversions = self.conversions.wrapping_add(1);
        Ok(())
    }

    fn is_ready(&mut self) -> bool {
        true
    }

    fn read_celsius(&mut self, address: DeviceAddress) -> Result<f32, SensorError> {
        let (i, &(_, base)) = self
            .devices
            .iter()
            .enumerate()
            .find(|(_, (a, _))| *a == address)
            .ok_or(SensorError::NoPresence)?;
        let phase = self.conversions as f32 * 0.05 + i as f32;
        Ok(self.quantise(base + 0.75 * phase.sin()))
    }

    fn search(&mut self) -> heapless::Vec<DeviceAddress, MAX_BUS_DEVICES> {
        self.devices.iter().map(|(a, _)| *a).collect()
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), SensorError> {
        self.resolution = resolution;
        Ok(())
    }

    fn pin(&self) -> i32 {
        self.pin
    }

    fn idle_level_high(&mut self) -> bool {
        true
    }

    fn probe_pin(&mut self, gpio: i32) -> Option<usize> {
        Some(if gpio == self.pin { self.devices.len() } else { 0 })
    }
}

// ---------------------------------------------------------------------------
// Thermal imager
// ---------------------------------------------------------------------------

/// Ambient background with a warm spot circling the frame.
pub struct SimThermalImager {
    frames: u32,
    ambient: f32,
}

impl Default for SimThermalImager {
    fn default() -> Self {
        Self::new()
    }
}

impl SimThermalImager {
    pub fn new() -> Self {
        Self {
            frames: 0,
            ambient: 23.0,
        }
    }
}

impl ThermalImager for SimThermalImager {
    fn begin(&mut self) -> Result<(), SensorError> {
        info!("SimThermalImager: {}x{} simulated", THERMAL_COLS, THERMAL_ROWS);
        Ok(())
    }

    fn capture_frame(&mut self, out: &mut [f32; THERMAL_PIXELS]) -> Result<(), SensorError> {
        self.frames = self.frames.wrapping_add(1);
        let t = self.frames as f32 * 0.1;
        let cx = (THERMAL_COLS as f32 / 2.0) + 8.0 * t.cos();
        let cy = (THERMAL_ROWS as f32 / 2.0) + 5.0 * t.sin();

        for (i, px) in out.iter_mut().enumerate() {
            let x = (i % THERMAL_COLS) as f32;
            let y = (i / THERMAL_COLS) as f32;
            let d2 = (x - cx).powi(2) + (y - cy).powi(2);
            *px = self.ambient + 14.0 * (-d2 / 18.0).exp();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// Peer that is never reachable.
#[derive(Debug, Default)]
pub struct NoPeer;

impl PeerSource for NoPeer {
    fn latest(&mut self) -> Option<PeerReading> {
        None
    }
}

/// A 12 V rail with a slowly varying load.
#[derive(Debug, Default)]
pub struct SimPeer {
    polls: u32,
}

impl PeerSource for SimPeer {
    fn latest(&mut self) -> Option<PeerReading> {
        self.polls = self.polls.wrapping_add(1);
        let current = 1.2 + 0.3 * (self.polls as f32 * 0.02).sin();
        let voltage = 12.1;
        Some(PeerReading {
            voltage: Some(voltage),
            current: Some(current),
            power: Some(voltage * current),
        })
    }
}
