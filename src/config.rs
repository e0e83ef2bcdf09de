//! Configuration types read from and written to the TLA202x

use embassy_time::Duration;

/// The TLA202x selects its bus address with a single ADDR pin, which
/// can be strapped to one of four signals:
///
/// | ADDR pin tied to | Address (binary) | Address (hex, right aligned) |
/// | :---             | :---             | :---                         |
/// | GND              | `0b1001_000x`    | `0x48`                       |
/// | VDD              | `0b1001_001x`    | `0x49`                       |
/// | SDA              | `0b1001_010x`    | `0x4A`                       |
/// | SCL              | `0b1001_011x`    | `0x4B`                       |
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// ADDR tied to GND
    #[default]
    Gnd,
    /// ADDR tied to VDD
    Vdd,
    /// ADDR tied to SDA
    Sda,
    /// ADDR tied to SCL
    Scl,
}

impl Address {
    /// Convert into the right-aligned 7-bit address
    pub fn into_addr(&self) -> u8 {
        match self {
            Address::Gnd => 0x48,
            Address::Vdd => 0x49,
            Address::Sda => 0x4A,
            Address::Scl => 0x4B,
        }
    }
}

/// Conversion start, written to OS (bit 15)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Start {
    /// Write: 0, nothing happens
    DontStart,
    /// Write: 1, single-shot conversion started
    StartConversion,
}

impl Start {
    pub(crate) fn bits(self) -> u16 {
        match self {
            Start::DontStart => 0,
            Start::StartConversion => 1,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        if bits & 0b1 == 0 {
            Start::DontStart
        } else {
            Start::StartConversion
        }
    }
}

/// Conversion status, read from OS (bit 15)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Read: 0, conversion in progress
    Busy,
    /// Read: 1, no conversion running, result available
    Ready,
}

impl Status {
    #[cfg(test)]
    pub(crate) fn bits(self) -> u16 {
        match self {
            Status::Busy => 0,
            Status::Ready => 1,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        if bits & 0b1 == 0 {
            Status::Busy
        } else {
            Status::Ready
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// R/W: 0
    Continuous,
    /// R/W: 1
    SingleShot,
}

impl OperatingMode {
    pub(crate) fn bits(self) -> u16 {
        match self {
            OperatingMode::Continuous => 0,
            OperatingMode::SingleShot => 1,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        if bits & 0b1 == 0 {
            OperatingMode::Continuous
        } else {
            OperatingMode::SingleShot
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    /// R/W: 000
    Sps128,
    /// R/W: 001
    Sps250,
    /// R/W: 010
    Sps490,
    /// R/W: 011
    Sps920,
    /// R/W: 100
    Sps1600,
    /// R/W: 101
    Sps2400,
    /// R/W: 110 (and 111 on read)
    Sps3300,
}

impl DataRate {
    /// Nominal conversion rate in samples per second
    pub fn samples_per_second(&self) -> u16 {
        match self {
            DataRate::Sps128 => 128,
            DataRate::Sps250 => 250,
            DataRate::Sps490 => 490,
            DataRate::Sps920 => 920,
            DataRate::Sps1600 => 1600,
            DataRate::Sps2400 => 2400,
            DataRate::Sps3300 => 3300,
        }
    }

    pub(crate) fn bits(self) -> u16 {
        match self {
            DataRate::Sps128 => 0b000,
            DataRate::Sps250 => 0b001,
            DataRate::Sps490 => 0b010,
            DataRate::Sps920 => 0b011,
            DataRate::Sps1600 => 0b100,
            DataRate::Sps2400 => 0b101,
            DataRate::Sps3300 => 0b110,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        match bits & 0b111 {
            0b000 => DataRate::Sps128,
            0b001 => DataRate::Sps250,
            0b010 => DataRate::Sps490,
            0b011 => DataRate::Sps920,
            0b100 => DataRate::Sps1600,
            0b101 => DataRate::Sps2400,
            _ => DataRate::Sps3300,
        }
    }
}

/// Programmable gain, expressed as the input span it maps onto the
/// 12-bit code range. Ordered from widest to narrowest.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FullScaleRange {
    /// R/W: 000, ±6.144V
    Fsr6_144V,
    /// R/W: 001, ±4.096V
    Fsr4_096V,
    /// R/W: 010, ±2.048V
    Fsr2_048V,
    /// R/W: 011, ±1.024V
    Fsr1_024V,
    /// R/W: 100, ±0.512V
    Fsr0_512V,
    /// R/W: 101 (and 110, 111 on read), ±0.256V
    Fsr0_256V,
}

impl FullScaleRange {
    /// The widest span, ±6.144V
    pub const WIDEST: Self = FullScaleRange::Fsr6_144V;
    /// The narrowest span, ±0.256V
    pub const NARROWEST: Self = FullScaleRange::Fsr0_256V;

    /// Position of this range in the gain ladder, 0 (widest) to 5 (narrowest)
    pub fn index(&self) -> u8 {
        self.bits() as u8
    }

    /// Full positive span in millivolts.
    ///
    /// Every step halves the span starting from 8192mV, except the widest
    /// setting which the part clamps to 6144mV.
    pub fn full_range_millivolts(&self) -> u16 {
        match self {
            FullScaleRange::Fsr6_144V => 6144,
            other => 8192 >> other.index(),
        }
    }

    /// Full positive span in volts
    pub fn full_range_volts(&self) -> f32 {
        f32::from(self.full_range_millivolts()) / 1000.0
    }

    /// Size of one LSB in volts
    pub fn resolution(&self) -> f32 {
        match self {
            FullScaleRange::Fsr6_144V => 0.003,
            FullScaleRange::Fsr4_096V => 0.002,
            FullScaleRange::Fsr2_048V => 0.001,
            FullScaleRange::Fsr1_024V => 0.0005,
            FullScaleRange::Fsr0_512V => 0.00025,
            FullScaleRange::Fsr0_256V => 0.000125,
        }
    }

    /// Convert a sign-extended 12-bit code taken at this range into volts.
    ///
    /// One LSB is taken off the span to correct the part's transfer
    /// function, which tops out one step below the nominal full scale.
    pub fn code_to_volts(&self, code: i16) -> f32 {
        let span = self.full_range_volts() - self.resolution();
        f32::from(code) * span / 2047.0
    }

    /// The next wider range, if any
    pub fn wider(&self) -> Option<Self> {
        match self {
            FullScaleRange::Fsr6_144V => None,
            FullScaleRange::Fsr4_096V => Some(FullScaleRange::Fsr6_144V),
            FullScaleRange::Fsr2_048V => Some(FullScaleRange::Fsr4_096V),
            FullScaleRange::Fsr1_024V => Some(FullScaleRange::Fsr2_048V),
            FullScaleRange::Fsr0_512V => Some(FullScaleRange::Fsr1_024V),
            FullScaleRange::Fsr0_256V => Some(FullScaleRange::Fsr0_512V),
        }
    }

    /// The next narrower range, if any
    pub fn narrower(&self) -> Option<Self> {
        match self {
            FullScaleRange::Fsr6_144V => Some(FullScaleRange::Fsr4_096V),
            FullScaleRange::Fsr4_096V => Some(FullScaleRange::Fsr2_048V),
            FullScaleRange::Fsr2_048V => Some(FullScaleRange::Fsr1_024V),
            FullScaleRange::Fsr1_024V => Some(FullScaleRange::Fsr0_512V),
            FullScaleRange::Fsr0_512V => Some(FullScaleRange::Fsr0_256V),
            FullScaleRange::Fsr0_256V => None,
        }
    }

    pub(crate) fn bits(self) -> u16 {
        match self {
            FullScaleRange::Fsr6_144V => 0b000,
            FullScaleRange::Fsr4_096V => 0b001,
            FullScaleRange::Fsr2_048V => 0b010,
            FullScaleRange::Fsr1_024V => 0b011,
            FullScaleRange::Fsr0_512V => 0b100,
            FullScaleRange::Fsr0_256V => 0b101,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        match bits & 0b111 {
            0b000 => FullScaleRange::Fsr6_144V,
            0b001 => FullScaleRange::Fsr4_096V,
            0b010 => FullScaleRange::Fsr2_048V,
            0b011 => FullScaleRange::Fsr1_024V,
            0b100 => FullScaleRange::Fsr0_512V,
            _ => FullScaleRange::Fsr0_256V,
        }
    }
}

/// Input multiplexer: which pair (or input vs ground) is sampled
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mux {
    /// R/W: 000
    Ain0Ain1,
    /// R/W: 001
    Ain0Ain3,
    /// R/W: 010
    Ain1Ain3,
    /// R/W: 011
    Ain2Ain3,
    /// R/W: 100
    Ain0Gnd,
    /// R/W: 101
    Ain1Gnd,
    /// R/W: 110
    Ain2Gnd,
    /// R/W: 111
    Ain3Gnd,
}

impl Mux {
    /// Map a channel number onto a mux setting as `(channel - 4) mod 8`.
    ///
    /// Channels 0-3 land on the ground-referenced inputs AIN0-AIN3, channels
    /// 4-7 on the four differential pairs. Returns `None` past channel 7.
    pub fn from_channel(channel: u8) -> Option<Self> {
        if channel > 7 {
            return None;
        }
        Some(Self::from_bits(u16::from(channel.wrapping_sub(4))))
    }

    pub(crate) fn bits(self) -> u16 {
        match self {
            Mux::Ain0Ain1 => 0b000,
            Mux::Ain0Ain3 => 0b001,
            Mux::Ain1Ain3 => 0b010,
            Mux::Ain2Ain3 => 0b011,
            Mux::Ain0Gnd => 0b100,
            Mux::Ain1Gnd => 0b101,
            Mux::Ain2Gnd => 0b110,
            Mux::Ain3Gnd => 0b111,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        match bits & 0b111 {
            0b000 => Mux::Ain0Ain1,
            0b001 => Mux::Ain0Ain3,
            0b010 => Mux::Ain1Ain3,
            0b011 => Mux::Ain2Ain3,
            0b100 => Mux::Ain0Gnd,
            0b101 => Mux::Ain1Gnd,
            0b110 => Mux::Ain2Gnd,
            _ => Mux::Ain3Gnd,
        }
    }
}

/// Delays used by the driver while talking to the device
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Wait between the reset write and the presence read-back in `begin`
    pub settle: Duration,
    /// Wait before each poll of the conversion status bit
    pub poll_interval: Duration,
    /// Give up with [`Error::Timeout`](crate::Error::Timeout) after this many
    /// polls. `None` polls forever.
    pub max_poll_attempts: Option<u32>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(10),
            poll_interval: Duration::from_millis(5),
            max_poll_attempts: Some(100),
        }
    }
}
