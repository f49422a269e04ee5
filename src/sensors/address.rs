//! 1-Wire ROM addressing: CRC-8 validation, family classification, and the
//! stable 64-bit identity a thermometer slot is bound to.
//!
//! ROM layout (LSB first on the wire):
//!
//! ```text
//!  byte 0      bytes 1..=6        byte 7
//! ┌────────┬──────────────────┬─────────┐
//! │ family │  48-bit serial   │  CRC-8  │
//! └────────┴──────────────────┴─────────┘
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected 0x8C).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// Device family decoded from ROM byte 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Ds18b20,
    Ds18s20,
    Ds1822,
    Ds1825,
    Ds28ea00,
    Unknown(u8),
}

impl Family {
    pub const DS18B20_CODE: u8 = 0x28;

    pub fn from_code(code: u8) -> Self {
        match code {
            Self::DS18B20_CODE => Self::Ds18b20,
            0x10 => Self::Ds18s20,
            0x22 => Self::Ds1822,
            0x3B => Self::Ds1825,
            0x42 => Self::Ds28ea00,
            other => Self::Unknown(other),
        }
    }

    /// True for every family that answers Convert T / Read Scratchpad.
    pub fn is_thermometer(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ds18b20 => write!(f, "DS18B20"),
            Self::Ds18s20 => write!(f, "DS18S20"),
            Self::Ds1822 => write!(f, "DS1822"),
            Self::Ds1825 => write!(f, "DS1825"),
            Self::Ds28ea00 => write!(f, "DS28EA00"),
            Self::Unknown(code) => write!(f, "unknown family 0x{code:02X}"),
        }
    }
}

/// A 64-bit 1-Wire ROM code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceAddress(pub [u8; 8]);

impl DeviceAddress {
    pub const fn new(rom: [u8; 8]) -> Self {
        Self(rom)
    }

    /// Build a ROM with a correct trailing CRC from family + serial.
    pub fn with_crc(family: u8, serial: [u8; 6]) -> Self {
        let mut rom = [0u8; 8];
        rom[0] = family;
        rom[1..7].copy_from_slice(&serial);
        rom[7] = crc8(&rom[..7]);
        Self(rom)
    }

    pub fn bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn family(&self) -> Family {
        Family::from_code(self.0[0])
    }

    /// CRC of bytes 0..7 matches byte 7.
    pub fn crc_valid(&self) -> bool {
        crc8(&self.0[..7]) == self.0[7]
    }

    /// Stable identity: the ROM read as a little-endian integer.
    pub fn id(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// Colon-separated hex (`28:FF:64:1E:0C:00:00:9A`), as the rescan report lists it.
    pub fn to_hex(&self) -> heapless::String<23> {
        let mut s = heapless::String::new();
        let _ = fmt::Write::write_fmt(&mut s, format_args!("{self}"));
        s
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// DS18B20 conversion resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    /// Datasheet maximum conversion time, rounded up to whole milliseconds.
    pub fn conversion_time_ms(self) -> u32 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }

    /// Temperature LSB at this resolution (°C).
    pub fn step_celsius(self) -> f32 {
        match self {
            Self::Bits9 => 0.5,
            Self::Bits10 => 0.25,
            Self::Bits11 => 0.125,
            Self::Bits12 => 0.0625,
        }
    }

    /// Configuration-register byte (R1:R0 in bits 6:5).
    pub fn config_byte(self) -> u8 {
        let r = match self {
            Self::Bits9 => 0,
            Self::Bits10 => 1,
            Self::Bits11 => 2,
            Self::Bits12 => 3,
        };
        (r << 5) | 0x1F
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Real serial, CRC byte zeroed (correct CRC is 0xD0).
    const KNOWN_ROM: [u8; 8] = [0x28, 0xFF, 0x64, 0x1E, 0x0C, 0x00, 0x00, 0x00];

    #[test]
    fn crc_of_rom_with_its_own_crc_is_zero() {
        let addr = DeviceAddress::with_crc(0x28, [0xFF, 0x64, 0x1E, 0x0C, 0x00, 0x00]);
        assert!(addr.crc_valid());
        assert_eq!(crc8(addr.bytes()), 0);
    }

    #[test]
    fn maxim_reference_vector() {
        // Maxim AN27 example ROM: 02 1C B8 01 00 00 00 A2
        assert_eq!(crc8(&[0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00]), 0xA2);
    }

    #[test]
    fn corrupted_rom_fails_crc() {
        let mut rom = DeviceAddress::with_crc(0x28, [1, 2, 3, 4, 5, 6]).0;
        rom[3] ^= 0x01;
        assert!(!DeviceAddress(rom).crc_valid());
        assert!(!DeviceAddress(KNOWN_ROM).crc_valid());
    }

    #[test]
    fn family_classification() {
        assert_eq!(Family::from_code(0x28), Family::Ds18b20);
        assert_eq!(Family::from_code(0x10), Family::Ds18s20);
        assert_eq!(Family::from_code(0x01), Family::Unknown(0x01));
        assert!(!Family::Unknown(0x01).is_thermometer());
        assert_eq!(Family::Unknown(0x01).to_string(), "unknown family 0x01");
    }

    #[test]
    fn hex_formatting_is_colon_separated_upper_case() {
        let addr = DeviceAddress::new([0x28, 0xff, 0x64, 0x1e, 0x0c, 0, 0, 0x9a]);
        assert_eq!(addr.to_hex().as_str(), "28:FF:64:1E:0C:00:00:9A");
    }

    #[test]
    fn id_is_stable_little_endian() {
        let addr = DeviceAddress::new([1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(addr.id(), 1);
    }

    #[test]
    fn twelve_bit_config_byte() {
        assert_eq!(Resolution::Bits12.config_byte(), 0x7F);
        assert_eq!(Resolution::Bits9.config_byte(), 0x1F);
    }
}
