//! `tla202x-async`
//!
//! A driver for the TLA2021/TLA2022/TLA2024 family of 12-bit ADCs from TI.
//!
//! The driver keeps a cached copy of the configuration register, and only
//! talks to the bus when a change has to reach the device. In single-shot
//! mode, range and channel changes are folded into the write that starts the
//! next conversion.
//!
//! ```rust,ignore
//! let mut adc = Tla202x::new(i2c, Address::Gnd);
//! if !adc.begin().await? {
//!     // no answer from the part, carry on anyway
//! }
//! adc.set_data_rate(DataRate::Sps3300, true).await?;
//! let volts = adc.voltage_read_auto_range(3).await?;
//! ```

#![cfg_attr(not(test), no_std)]

use autorange::Step;
use config::{Address, DataRate, FullScaleRange, Mux, OperatingMode, Start, Status, Timing};
use embassy_time::Timer;
use embedded_hal_async::i2c::I2c;
use register::{decode_conversion, ConfigRegister, Field, CONFIG_REG, CONVERSION_REG};

pub mod autorange;
pub mod config;
pub mod register;

#[cfg(test)]
mod mock;

/// Number of ground-referenced inputs that auto-ranging tracks
pub const GROUNDED_CHANNELS: usize = 4;

/// Driver error type
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The device never reported a finished conversion
    Timeout,
    /// The channel number has no mux setting, or is not ground-referenced
    /// where one is required
    InvalidChannel(u8),
    /// An error with the underlying I2C bus
    I2c(E),
}

/// Which inputs and range a read should use.
///
/// Fields left as `None` keep whatever the device is currently set to.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadRequest {
    /// Channel number, mapped onto the mux with [Mux::from_channel]
    pub channel: Option<u8>,
    pub range: Option<FullScaleRange>,
}

impl ReadRequest {
    /// Read whatever is currently selected
    pub fn current() -> Self {
        Self::default()
    }

    pub fn channel(channel: u8) -> Self {
        Self {
            channel: Some(channel),
            range: None,
        }
    }

    pub fn range(range: FullScaleRange) -> Self {
        Self {
            channel: None,
            range: Some(range),
        }
    }

    pub fn channel_with_range(channel: u8, range: FullScaleRange) -> Self {
        Self {
            channel: Some(channel),
            range: Some(range),
        }
    }
}

/// Async driver for the TLA202x ADC
pub struct Tla202x<I> {
    addr: u8,
    i2c: I,
    timing: Timing,
    conf: ConfigRegister,
    /// The cache holds changes the device has not seen yet
    stale: bool,
    auto_ranges: [FullScaleRange; GROUNDED_CHANNELS],
}

/// Read a 16-bit register, MSB first
async fn read_register<I: I2c>(i2c: &mut I, addr: u8, reg: u8) -> Result<[u8; 2], I::Error> {
    let mut buf = [0u8; 2];
    i2c.write_read(addr, &[reg], &mut buf).await?;
    Ok(buf)
}

impl<I> Tla202x<I>
where
    I: I2c,
{
    /// Create a new [Tla202x] with the given [Address] and [I2c] implementation
    ///
    /// No bus traffic happens here. The cache starts out at the power-on
    /// value, call [Self::begin] to put the device in the same state.
    pub fn new(i2c: I, addr: Address) -> Self {
        Self::with_timing(i2c, addr, Timing::default())
    }

    /// Like [Self::new], with custom settle and polling delays
    pub fn with_timing(i2c: I, addr: Address, timing: Timing) -> Self {
        Self {
            addr: addr.into_addr(),
            i2c,
            timing,
            conf: ConfigRegister::RESET,
            stale: false,
            auto_ranges: [FullScaleRange::Fsr2_048V; GROUNDED_CHANNELS],
        }
    }

    /// Reset the device and check that it answers.
    ///
    /// Returns `Ok(true)` if the configuration register reads back as the
    /// reset value after the settle delay. A mismatch is not an error: the
    /// device may still accept writes, so it is up to the caller whether to
    /// carry on.
    pub async fn begin(&mut self) -> Result<bool, Error<I::Error>> {
        self.reset().await?;
        Timer::after(self.timing.settle).await;

        let readback = read_register(&mut self.i2c, self.addr, CONFIG_REG)
            .await
            .map_err(Error::I2c)?;
        let readback = ConfigRegister::from_be_bytes(readback);
        let present = readback == ConfigRegister::RESET;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "TLA202x at {=u8:#x}: config {=u16:#x}, present: {}",
            self.addr,
            readback.bits(),
            present
        );

        Ok(present)
    }

    /// Write the reset value to the device
    pub async fn reset(&mut self) -> Result<(), Error<I::Error>> {
        self.write_config(ConfigRegister::RESET).await
    }

    /// Write the last cached configuration back to the device.
    ///
    /// The start bit is always cleared, so this never kicks off a conversion.
    pub async fn restore(&mut self) -> Result<(), Error<I::Error>> {
        self.write_config(self.conf.with(Field::Start, Start::DontStart.bits()))
            .await
    }

    /// The configuration register as the driver believes the device holds it,
    /// including any deferred changes
    pub fn config(&self) -> ConfigRegister {
        self.conf
    }

    pub fn operating_mode(&self) -> OperatingMode {
        self.conf.operating_mode()
    }

    pub fn full_scale_range(&self) -> FullScaleRange {
        self.conf.full_scale_range()
    }

    pub fn mux(&self) -> Mux {
        self.conf.mux()
    }

    pub fn data_rate(&self) -> DataRate {
        self.conf.data_rate()
    }

    /// Full positive span of the active range, in volts
    pub fn full_range_voltage(&self) -> f32 {
        self.full_scale_range().full_range_volts()
    }

    /// Size of one LSB at the active range, in volts
    pub fn voltage_resolution(&self) -> f32 {
        self.full_scale_range().resolution()
    }

    /// The range the next auto-ranged read of `channel` will start at
    pub fn auto_range(&self, channel: u8) -> Option<FullScaleRange> {
        self.auto_ranges.get(usize::from(channel)).copied()
    }

    /// Select the full-scale range.
    ///
    /// The cache is updated, and the device too if `write_immediately` is
    /// set. Does nothing if the range is already selected and the device is
    /// up to date with the cache.
    pub async fn set_full_scale_range(
        &mut self,
        range: FullScaleRange,
        write_immediately: bool,
    ) -> Result<(), Error<I::Error>> {
        self.stage(Field::FullScaleRange, range.bits());
        if write_immediately {
            self.sync_config().await?;
        }
        Ok(())
    }

    /// Select the input mux. Same rules as [Self::set_full_scale_range].
    pub async fn set_mux(
        &mut self,
        mux: Mux,
        write_immediately: bool,
    ) -> Result<(), Error<I::Error>> {
        self.stage(Field::Mux, mux.bits());
        if write_immediately {
            self.sync_config().await?;
        }
        Ok(())
    }

    /// Select continuous or single-shot conversion.
    ///
    /// Unlike range and mux, the write is not skipped when the mode is
    /// unchanged.
    pub async fn set_operating_mode(
        &mut self,
        mode: OperatingMode,
        write_immediately: bool,
    ) -> Result<(), Error<I::Error>> {
        self.conf.set(Field::OperatingMode, mode.bits());
        self.stale = true;
        if write_immediately {
            self.push_config().await?;
        }
        Ok(())
    }

    /// Select the conversion rate. The previous rate is cleared first.
    pub async fn set_data_rate(
        &mut self,
        rate: DataRate,
        write_immediately: bool,
    ) -> Result<(), Error<I::Error>> {
        self.conf.set(Field::DataRate, rate.bits());
        self.stale = true;
        if write_immediately {
            self.push_config().await?;
        }
        Ok(())
    }

    /// Attempts to get a signed 12-bit code from the ADC, for whatever input
    /// and range are currently configured.
    ///
    /// In single-shot mode this starts a conversion, carrying any deferred
    /// configuration changes in the same write, then polls the status bit
    /// every [Timing::poll_interval] until the device reports ready.
    /// In continuous mode the latest sample is read straight away.
    ///
    /// The result is in `-2048..=2047`.
    pub async fn read_raw(&mut self) -> Result<i16, Error<I::Error>> {
        if let OperatingMode::SingleShot = self.conf.operating_mode() {
            self.convert().await?;
        }

        let raw = read_register(&mut self.i2c, self.addr, CONVERSION_REG)
            .await
            .map_err(Error::I2c)?;
        Ok(decode_conversion(u16::from_be_bytes(raw)))
    }

    /// Read a code after applying the channel and range in `request`.
    ///
    /// Both changes are staged in the cache together. In continuous mode
    /// they, and anything else the device is missing, are pushed with a
    /// single write before sampling. In single-shot mode they ride along with
    /// the conversion start.
    pub async fn read(&mut self, request: ReadRequest) -> Result<i16, Error<I::Error>> {
        let mux = match request.channel {
            Some(channel) => match Mux::from_channel(channel) {
                Some(mux) => Some(mux),
                None => return Err(Error::InvalidChannel(channel)),
            },
            None => None,
        };

        if let Some(range) = request.range {
            self.stage(Field::FullScaleRange, range.bits());
        }
        if let Some(mux) = mux {
            self.stage(Field::Mux, mux.bits());
        }
        if self.conf.operating_mode() == OperatingMode::Continuous {
            self.sync_config().await?;
        }

        self.read_raw().await
    }

    /// Read a code from `channel`, see [Mux::from_channel] for the numbering
    pub async fn read_channel(&mut self, channel: u8) -> Result<i16, Error<I::Error>> {
        self.read(ReadRequest::channel(channel)).await
    }

    /// Read the voltage of ground-referenced input `channel` (0..=3) at the
    /// active range
    pub async fn voltage_read(&mut self, channel: u8) -> Result<f32, Error<I::Error>> {
        Self::grounded_slot(channel)?;
        let code = self.read_channel(channel).await?;
        Ok(self.full_scale_range().code_to_volts(code))
    }

    /// Read the voltage of ground-referenced input `channel` (0..=3), picking
    /// the range per channel from previous reads.
    ///
    /// Each read nudges the channel's range one step narrower when the code is
    /// under ~45% of full scale, or one step wider when over ~90%. The new
    /// range applies from the next call. A clipped sample is never returned
    /// while a wider range is available: the read is repeated at the wider
    /// range first.
    pub async fn voltage_read_auto_range(
        &mut self,
        channel: u8,
    ) -> Result<f32, Error<I::Error>> {
        let slot = Self::grounded_slot(channel)?;

        loop {
            let range = self.auto_ranges[slot];
            let code = self
                .read(ReadRequest::channel_with_range(channel, range))
                .await?;

            let Step { next, retry } = autorange::step(range, code);

            #[cfg(feature = "defmt")]
            {
                if next != range {
                    defmt::debug!(
                        "AIN{=u8}: code {=i16}, range {} -> {}",
                        channel,
                        code,
                        range,
                        next
                    );
                }
            }

            self.auto_ranges[slot] = next;
            if !retry {
                return Ok(range.code_to_volts(code));
            }
        }
    }

    /// Give back the I2C bus
    pub fn release(self) -> I {
        self.i2c
    }

    fn grounded_slot(channel: u8) -> Result<usize, Error<I::Error>> {
        let slot = usize::from(channel);
        if slot < GROUNDED_CHANNELS {
            Ok(slot)
        } else {
            Err(Error::InvalidChannel(channel))
        }
    }

    /// Change a field in the cache, marking it stale if the value differs
    fn stage(&mut self, field: Field, value: u16) {
        if self.conf.get(field) != value {
            self.conf.set(field, value);
            self.stale = true;
        }
    }

    /// Push the cached configuration if the device is behind it
    async fn sync_config(&mut self) -> Result<(), Error<I::Error>> {
        if self.stale {
            self.push_config().await?;
        }
        Ok(())
    }

    /// Push the cached configuration without starting a conversion
    async fn push_config(&mut self) -> Result<(), Error<I::Error>> {
        self.write_config(self.conf.with(Field::Start, Start::DontStart.bits()))
            .await
    }

    /// Write the configuration register, updating our cache if the write
    /// succeeded. On failure the device is left marked as stale.
    async fn write_config(&mut self, conf: ConfigRegister) -> Result<(), Error<I::Error>> {
        let [hi, lo] = conf.to_be_bytes();
        if let Err(e) = self.i2c.write(self.addr, &[CONFIG_REG, hi, lo]).await {
            self.stale = true;
            return Err(Error::I2c(e));
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("TLA202x config <- {=u16:#x}", conf.bits());

        self.conf = conf;
        self.stale = false;
        Ok(())
    }

    /// Start a single-shot conversion and wait for the device to finish it
    async fn convert(&mut self) -> Result<(), Error<I::Error>> {
        self.write_config(self.conf.with(Field::Start, Start::StartConversion.bits()))
            .await?;

        let mut polls = 0;
        loop {
            Timer::after(self.timing.poll_interval).await;
            let status = read_register(&mut self.i2c, self.addr, CONFIG_REG)
                .await
                .map_err(Error::I2c)?;
            if let Status::Ready = ConfigRegister::from_be_bytes(status).status() {
                return Ok(());
            }

            polls += 1;
            if let Some(max) = self.timing.max_poll_attempts {
                if polls >= max {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("TLA202x conversion not ready after {=u32} polls", polls);
                    return Err(Error::Timeout);
                }
            }
        }
    }
}
