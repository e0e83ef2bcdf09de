//! The 16-bit configuration register as a set of named fields
//!
//! ```text
//!  15 | 14 13 12 | 11 10 9 | 8    | 7 6 5 | 4 3 2 1 0
//!  OS | MUX      | PGA     | MODE | DR    | reserved
//! ```

use crate::config::{DataRate, FullScaleRange, Mux, OperatingMode, Start, Status};

/// Conversion result, 12-bit code left-justified
pub const CONVERSION_REG: u8 = 0x00;
/// Configuration
pub const CONFIG_REG: u8 = 0x01;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Bit 15
    Start,
    /// Bits 14:12
    Mux,
    /// Bits 11:9
    FullScaleRange,
    /// Bit 8
    OperatingMode,
    /// Bits 7:5
    DataRate,
}

impl Field {
    fn shift(self) -> u16 {
        match self {
            Field::Start => 15,
            Field::Mux => 12,
            Field::FullScaleRange => 9,
            Field::OperatingMode => 8,
            Field::DataRate => 5,
        }
    }

    fn width_mask(self) -> u16 {
        match self {
            Field::Start | Field::OperatingMode => 0b1,
            Field::Mux | Field::FullScaleRange | Field::DataRate => 0b111,
        }
    }

    /// The field's bits in register position
    pub fn mask(self) -> u16 {
        self.width_mask() << self.shift()
    }
}

/// Cached copy of the configuration register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigRegister(u16);

impl Default for ConfigRegister {
    fn default() -> Self {
        Self::RESET
    }
}

impl ConfigRegister {
    /// Power-on value: single-shot, AIN0/AIN1, ±2.048V, 1600SPS.
    ///
    /// Also written by a reset, and read back to probe for the device.
    pub const RESET: Self = Self(0x8583);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// Decode the register from bus order (MSB first)
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self((u16::from(bytes[0]) << 8) | u16::from(bytes[1]))
    }

    /// Encode the register in bus order (MSB first)
    pub fn to_be_bytes(&self) -> [u8; 2] {
        [(self.0 >> 8) as u8, (self.0 & 0xFF) as u8]
    }

    /// Extract a field, right-aligned
    pub fn get(&self, field: Field) -> u16 {
        (self.0 & field.mask()) >> field.shift()
    }

    /// Replace a field. Bits of `value` wider than the field are dropped.
    pub fn set(&mut self, field: Field, value: u16) {
        self.0 &= !field.mask();
        self.0 |= (value & field.width_mask()) << field.shift();
    }

    pub fn with(mut self, field: Field, value: u16) -> Self {
        self.set(field, value);
        self
    }

    /// OS bit with its write meaning
    pub fn start(&self) -> Start {
        Start::from_bits(self.get(Field::Start))
    }

    /// OS bit with its read meaning
    pub fn status(&self) -> Status {
        Status::from_bits(self.get(Field::Start))
    }

    pub fn mux(&self) -> Mux {
        Mux::from_bits(self.get(Field::Mux))
    }

    pub fn full_scale_range(&self) -> FullScaleRange {
        FullScaleRange::from_bits(self.get(Field::FullScaleRange))
    }

    pub fn operating_mode(&self) -> OperatingMode {
        OperatingMode::from_bits(self.get(Field::OperatingMode))
    }

    pub fn data_rate(&self) -> DataRate {
        DataRate::from_bits(self.get(Field::DataRate))
    }
}

/// Turn a raw conversion register value into a signed code in -2048..=2047.
///
/// The part left-justifies its 12-bit two's complement result, so the low
/// nibble is dropped and bit 11 is copied into bits 15:12.
pub fn decode_conversion(raw: u16) -> i16 {
    let code = raw >> 4;
    let code = if code & (1 << 11) != 0 {
        code | 0xF000
    } else {
        code & !0xF000
    };
    code as i16
}
