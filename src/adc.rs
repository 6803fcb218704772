//! An MCP3008 session: one initialised subsystem holding one open SPI channel.

use embedded_hal::spi::MODE_1;
use log::{debug, error, info, trace};
use mcp300::mcp3008::Mcp3008;
use mcp300::{to_volts, Channel, InvalidChannel, VOLTAGE_SCALE};

use crate::error::{Error, Result};
use crate::subsystem::{SpiSettings, Subsystem};

#[cfg(feature = "raspberry_pi")]
use crate::raspberry_pi::RaspberryPi;

/// Chip enable line the MCP3008 is wired to.
pub const SPI_CHANNEL: u8 = 0;

/// Number of analog inputs.
pub const CHANNELS: usize = 8;

/// MCP3008 ADC session.
///
/// Holds the subsystem and the SPI channel opened on it for as long as it lives.
/// Dropping the session terminates the subsystem.
pub struct Adc<S: Subsystem> {
    subsystem: S,
    mcp: Mcp3008<S::Spi>,
    supply_voltage: f64,
    reference_voltage: f64,
    clock_speed: u32,
}

#[cfg(feature = "raspberry_pi")]
impl Adc<RaspberryPi> {
    /// Opens an MCP3008 on SPI0 CE0 of a Raspberry Pi.
    ///
    /// `supply_voltage` is the voltage on V<sub>DD</sub> and picks the SPI clock.
    /// `reference_voltage` is the voltage on V<sub>REF</sub>.
    pub fn new(supply_voltage: f64, reference_voltage: f64) -> Result<Self> {
        Self::with_subsystem(RaspberryPi::new(), supply_voltage, reference_voltage)
    }
}

impl<S: Subsystem> Adc<S> {
    /// Opens an MCP3008 through the given subsystem.
    ///
    /// The supply voltage is checked before the subsystem is touched. If the SPI channel
    /// fails to open, the subsystem is terminated again before the error is returned.
    pub fn with_subsystem(
        mut subsystem: S,
        supply_voltage: f64,
        reference_voltage: f64,
    ) -> Result<Self> {
        let Some(clock_speed) = mcp300::clock_speed_for(supply_voltage) else {
            error!("Input voltage is not within 2.7 - 5 Volts");
            return Err(Error::Configuration { supply_voltage });
        };

        debug!("V_DD of {supply_voltage} V allows an SPI clock of {clock_speed} Hz");

        subsystem.initialize()?;

        let settings = SpiSettings {
            channel: SPI_CHANNEL,
            clock_speed,
            mode: MODE_1,
        };

        let spi = match subsystem.open(&settings) {
            Ok(spi) => spi,
            Err(err) => {
                subsystem.terminate();
                return Err(err.into());
            }
        };

        info!("MCP3008 ready on SPI channel {SPI_CHANNEL} at {clock_speed} Hz");

        Ok(Self {
            subsystem,
            mcp: Mcp3008::new(spi),
            supply_voltage,
            reference_voltage,
            clock_speed,
        })
    }

    /// Reads the 10 bit conversion result of a channel in single-ended mode.
    pub fn read_raw_from(&mut self, channel: u8) -> Result<u16> {
        let channel = checked(channel)?;

        let raw = self.mcp.read(channel)?;

        trace!("{channel:?}: {raw}");

        Ok(raw)
    }

    /// Reads a channel in single-ended mode and scales it to volts.
    pub fn read_from(&mut self, channel: u8) -> Result<f64> {
        let raw = self.read_raw_from(channel)?;

        Ok(to_volts(raw, VOLTAGE_SCALE))
    }

    /// Reads the 10 bit conversion result of a channel pair in differential mode.
    /// Channel `2k` measures CH(2k) - CH(2k + 1), channel `2k + 1` the reverse.
    pub fn read_raw_differential_from(&mut self, channel: u8) -> Result<u16> {
        let channel = checked(channel)?;

        let raw = self.mcp.read_differential(channel)?;

        trace!("{channel:?} differential: {raw}");

        Ok(raw)
    }

    /// Reads every channel in order, stopping at the first failure.
    pub fn read_all_raw(&mut self) -> Result<[u16; CHANNELS]> {
        let mut values = [0; CHANNELS];

        for (value, channel) in values.iter_mut().zip(Channel::all()) {
            *value = self.mcp.read(channel)?;
        }

        Ok(values)
    }

    pub fn supply_voltage(&self) -> f64 {
        self.supply_voltage
    }

    /// The V<sub>REF</sub> given at construction. Conversions to volts use a fixed
    /// 3.3V scale regardless.
    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    /// SPI clock in Hz, picked from the supply voltage.
    pub fn clock_speed(&self) -> u32 {
        self.clock_speed
    }
}

impl<S: Subsystem> Drop for Adc<S> {
    fn drop(&mut self) {
        self.subsystem.terminate();
    }
}

fn checked(channel: u8) -> Result<Channel> {
    Channel::try_from(channel).map_err(|InvalidChannel(channel)| Error::Channel(channel))
}
