//! Bit-banged 1-Wire master and DS18B20 bus driver.
//!
//! The data line is a single open-drain GPIO with an external 4.7 kΩ
//! pull-up: driving it low pulls the bus down, "high" releases it.  Timing
//! follows the standard-speed slots of Maxim AN126.
//!
//! ```text
//!  reset   ▔▔╲______480µs______╱▔▔70µs▔▔[sample presence]▔▔410µs▔▔
//!  write 1 ▔▔╲_6µs_╱▔▔▔▔▔▔64µs▔▔▔▔▔▔▔
//!  write 0 ▔▔╲______60µs______╱▔10µs▔
//!  read    ▔▔╲_6µs_╱▔9µs▔[sample]▔55µs▔
//! ```
//!
//! Generic over `embedded-hal` 1.0 so the same code runs on an
//! `esp_idf_hal` `PinDriver` in input/output open-drain mode.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, warn};

use crate::app::ports::{MAX_BUS_DEVICES, ThermometerBus};
use crate::error::SensorError;
use crate::sensors::address::{DeviceAddress, Family, Resolution, crc8};

// ROM and function commands
const CMD_SEARCH_ROM: u8 = 0xF0;
const CMD_MATCH_ROM: u8 = 0x55;
const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;
const CMD_WRITE_SCRATCHPAD: u8 = 0x4E;

/// Alarm thresholds written alongside the resolution (power-on values).
const ALARM_HIGH: u8 = 0x4B;
const ALARM_LOW: u8 = 0x46;

// ---------------------------------------------------------------------------
// 1-Wire master
// ---------------------------------------------------------------------------

pub struct OneWireMaster<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> OneWireMaster<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Self {
        if let Err(e) = pin.set_high() {
            // Every later transaction reports BusFault on the same pin.
            warn!("1-Wire: could not release the data line ({:?})", e);
        }
        Self { pin, delay }
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::BusFault)
    }

    fn drive_low(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::BusFault)
    }

    fn sample(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| SensorError::BusFault)
    }

    /// Reset pulse.  Returns `true` if at least one device answered.
    pub fn reset(&mut self) -> Result<bool, SensorError> {
        self.drive_low()?;
        self.delay.delay_us(480);
        self.release()?;
        self.delay.delay_us(70);
        let present = !self.sample()?;
        self.delay.delay_us(410);
        Ok(present)
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
        self.drive_low()?;
        if bit {
            self.delay.delay_us(6);
            self.release()?;
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.release()?;
            self.delay.delay_us(10);
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool, SensorError> {
        self.drive_low()?;
        self.delay.delay_us(6);
        self.release()?;
        self.delay.delay_us(9);
        let bit = self.sample()?;
        self.delay.delay_us(55);
        Ok(bit)
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
        (0..8).try_for_each(|i| self.write_bit((byte >> i) & 1 == 1))
    }

    pub fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Reset and fail with [`SensorError::NoPresence`] if nobody answers.
    fn reset_expect_presence(&mut self) -> Result<(), SensorError> {
        if self.reset()? {
            Ok(())
        } else {
            Err(SensorError::NoPresence)
        }
    }

    /// Address one device (or all, with `None`).
    pub fn select(&mut self, address: Option<DeviceAddress>) -> Result<(), SensorError> {
        self.reset_expect_presence()?;
        match address {
            Some(addr) => {
                self.write_byte(CMD_MATCH_ROM)?;
                addr.bytes().iter().try_for_each(|b| self.write_byte(*b))
            }
            None => self.write_byte(CMD_SKIP_ROM),
        }
    }

    /// Enumerate every ROM on the bus (binary-tree search, AN187).
    ///
    /// CRC is not checked here; callers classify each ROM themselves.
    pub fn search(&mut self) -> Result<heapless::Vec<DeviceAddress, MAX_BUS_DEVICES>, SensorError> {
        let mut found = heapless::Vec::new();
        let mut rom = [0u8; 8];
        let mut last_discrepancy = 0u8;

        loop {
            if !self.reset()? {
                break;
            }
            self.write_byte(CMD_SEARCH_ROM)?;

            let mut last_zero = 0u8;
            for bit_number in 1..=64u8 {
                let id_bit = self.read_bit()?;
                let cmp_bit = self.read_bit()?;
                if id_bit && cmp_bit {
                    // No device took part in this bit.
                    return Ok(found);
                }

                let byte = usize::from((bit_number - 1) / 8);
                let mask = 1u8 << ((bit_number - 1) % 8);
                let direction = if id_bit != cmp_bit {
                    id_bit
                } else {
                    let d = if bit_number < last_discrepancy {
                        rom[byte] & mask != 0
                    } else {
                        bit_number == last_discrepancy
                    };
                    if !d {
                        last_zero = bit_number;
                    }
                    d
                };

                if direction {
                    rom[byte] |= mask;
                } else {
                    rom[byte] &= !mask;
                }
                self.write_bit(direction)?;
            }

            if found.push(DeviceAddress(rom)).is_err() {
                debug!("1-Wire: more than {} devices, search truncated", MAX_BUS_DEVICES);
                break;
            }
            last_discrepancy = last_zero;
            if last_discrepancy == 0 {
                break;
            }
        }
        Ok(found)
    }

    /// Current level of the released line.
    pub fn line_is_high(&mut self) -> Result<bool, SensorError> {
        self.release()?;
        self.delay.delay_us(10);
        self.sample()
    }
}

// ---------------------------------------------------------------------------
// DS18B20 bus
// ---------------------------------------------------------------------------

/// Decode a 9-byte scratchpad into °C.
///
/// Byte 8 is the CRC of bytes 0..8.  An all-ones scratchpad means nothing
/// drove the line (device gone mid-transaction).
pub fn decode_scratchpad(family: Family, scratchpad: &[u8; 9]) -> Result<f32, SensorError> {
    if scratchpad.iter().all(|b| *b == 0xFF) {
        return Err(SensorError::BusFault);
    }
    if crc8(&scratchpad[..8]) != scratchpad[8] {
        return Err(SensorError::CrcMismatch);
    }
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    let celsius = match family {
        // 9-bit device, 0.5 °C per LSB
        Family::Ds18s20 => f32::from(raw) * 0.5,
        _ => f32::from(raw) / 16.0,
    };
    Ok(celsius)
}

/// Claims another GPIO as a temporary open-drain 1-Wire line.  `None` when
/// the pin cannot be claimed.  The pin is released when the pair drops.
pub type ProbePinOpener<P, D> = fn(i32) -> Option<(P, D)>;

/// DS18B20 family devices on one externally powered 1-Wire bus.
pub struct Ds18b20Bus<P, D> {
    wire: OneWireMaster<P, D>,
    gpio: i32,
    open_probe: Option<ProbePinOpener<P, D>>,
}

impl<P, D> Ds18b20Bus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D, gpio: i32) -> Self {
        Self {
            wire: OneWireMaster::new(pin, delay),
            gpio,
            open_probe: None,
        }
    }

    /// Allow rescans to count devices on other candidate pins.
    pub fn with_probe_pins(mut self, open: ProbePinOpener<P, D>) -> Self {
        self.open_probe = Some(open);
        self
    }
}

impl<P, D> ThermometerBus for Ds18b20Bus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn request_conversion(&mut self) -> Result<(), SensorError> {
        self.wire.select(None)?;
        self.wire.write_byte(CMD_CONVERT_T)
    }

    fn is_ready(&mut self) -> bool {
        // Devices hold the line low until the conversion completes.
        self.wire.read_bit().unwrap_or(false)
    }

    fn read_celsius(&mut self, address: DeviceAddress) -> Result<f32, SensorError> {
        self.wire.select(Some(address))?;
        self.wire.write_byte(CMD_READ_SCRATCHPAD)?;
        let mut scratchpad = [0u8; 9];
        for b in &mut scratchpad {
            *b = self.wire.read_byte()?;
        }
        decode_scratchpad(address.family(), &scratchpad)
    }

    fn search(&mut self) -> heapless::Vec<DeviceAddress, MAX_BUS_DEVICES> {
        self.wire.search().unwrap_or_else(|e| {
            debug!("1-Wire: search failed ({})", e);
            heapless::Vec::new()
        })
    }

    fn set_resolution(&mut self, resolution: Resolution) -> Result<(), SensorError> {
        self.wire.select(None)?;
        self.wire.write_byte(CMD_WRITE_SCRATCHPAD)?;
        self.wire.write_byte(ALARM_HIGH)?;
        self.wire.write_byte(ALARM_LOW)?;
        self.wire.write_byte(resolution.config_byte())
    }

    fn pin(&self) -> i32 {
        self.gpio
    }

    fn idle_level_high(&mut self) -> bool {
        self.wire.line_is_high().unwrap_or(false)
    }

    fn probe_pin(&mut self, gpio: i32) -> Option<usize> {
        // Our own line is already claimed; search it in place.
        if gpio == self.gpio {
            return Some(self.search().len());
        }
        let (pin, delay) = (self.open_probe?)(gpio)?;
        let mut wire = OneWireMaster::new(pin, delay);
        match wire.search() {
            Ok(found) => Some(found.len()),
            Err(e) => {
                debug!("1-Wire: probe of GPIO {} failed ({})", gpio, e);
                Some(0)
            }
        }
    }
}
