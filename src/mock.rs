//! A simulated TLA202x on an async I2C bus, for tests

use std::vec::Vec;

use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::config::{Mux, OperatingMode, Start, Status};
use crate::register::{ConfigRegister, Field, CONFIG_REG, CONVERSION_REG};

pub struct MockTla {
    pub addr: u8,
    /// Voltages on AIN0..AIN3 relative to ground
    pub inputs: [f32; 4],
    /// Every value written to the configuration register, in order
    pub config_writes: Vec<u16>,
    /// Number of configuration register reads
    pub config_reads: usize,
    /// Answer every configuration read with this value instead
    pub echo_config: Option<u16>,
    /// Status polls that report "converting" after each trigger
    pub busy_polls: u32,
    /// Never finish a conversion
    pub stuck: bool,
    /// NACK every transaction
    pub nack: bool,
    config: ConfigRegister,
    latched: u16,
    pointer: u8,
    busy_left: u32,
}

impl MockTla {
    pub fn new(inputs: [f32; 4]) -> Self {
        Self {
            addr: 0x48,
            inputs,
            config_writes: Vec::new(),
            config_reads: 0,
            echo_config: None,
            busy_polls: 0,
            stuck: false,
            nack: false,
            config: ConfigRegister::RESET,
            latched: 0,
            pointer: 0,
            busy_left: 0,
        }
    }

    /// Configuration as the device currently holds it
    pub fn config(&self) -> ConfigRegister {
        self.config
    }

    /// Code the device would produce for the current configuration
    pub fn sample_code(&self) -> i16 {
        let [a0, a1, a2, a3] = self.inputs;
        let volts = match self.config.mux() {
            Mux::Ain0Ain1 => a0 - a1,
            Mux::Ain0Ain3 => a0 - a3,
            Mux::Ain1Ain3 => a1 - a3,
            Mux::Ain2Ain3 => a2 - a3,
            Mux::Ain0Gnd => a0,
            Mux::Ain1Gnd => a1,
            Mux::Ain2Gnd => a2,
            Mux::Ain3Gnd => a3,
        };
        let full_scale = self.config.full_scale_range().full_range_volts();
        let code = (volts / full_scale * 2048.0).round();
        code.clamp(-2048.0, 2047.0) as i16
    }

    fn sample(&self) -> u16 {
        (self.sample_code() as u16) << 4
    }

    fn write_config(&mut self, value: u16) {
        self.config_writes.push(value);
        let written = ConfigRegister::from_bits(value);
        self.config = written.with(Field::Start, Status::Ready.bits());

        let single = written.operating_mode() == OperatingMode::SingleShot;
        if single && written.start() == Start::StartConversion {
            self.latched = self.sample();
            self.busy_left = if self.stuck { u32::MAX } else { self.busy_polls };
        }
    }

    fn read_config(&mut self) -> u16 {
        self.config_reads += 1;
        if let Some(echo) = self.echo_config {
            return echo;
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return self.config.with(Field::Start, Status::Busy.bits()).bits();
        }
        self.config.bits()
    }

    fn read_conversion(&self) -> u16 {
        match self.config.operating_mode() {
            OperatingMode::Continuous => self.sample(),
            OperatingMode::SingleShot => self.latched,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let Some((&pointer, data)) = bytes.split_first() else {
            return;
        };
        self.pointer = pointer;
        if let [hi, lo] = data {
            if pointer == CONFIG_REG {
                self.write_config(u16::from_be_bytes([*hi, *lo]));
            }
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) {
        let value = match self.pointer {
            CONVERSION_REG => self.read_conversion(),
            CONFIG_REG => self.read_config(),
            _ => 0,
        };
        for (dst, src) in buf.iter_mut().zip(value.to_be_bytes()) {
            *dst = src;
        }
    }
}

impl ErrorType for MockTla {
    type Error = ErrorKind;
}

impl I2c for MockTla {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.nack || address != self.addr {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => self.write_bytes(bytes),
                Operation::Read(buf) => self.read_bytes(buf),
            }
        }
        Ok(())
    }
}
