//! Errors raised by an [`Adc`](crate::Adc) session.

use embedded_hal::spi::ErrorKind;
use thiserror::Error;

/// Everything that can go wrong while opening or reading an ADC session.
#[derive(Debug, Error)]
pub enum Error {
    /// Supply voltage outside of what the chip supports.
    #[error("input voltage {supply_voltage} V not within 2.7 - 5 volts")]
    Configuration { supply_voltage: f64 },

    /// Channel index outside of 0-7.
    #[error("channel {0} must be between 0-7")]
    Channel(u8),

    /// The GPIO subsystem could not be brought up.
    #[error(transparent)]
    SubsystemInit(#[from] SubsystemError),

    /// The SPI channel could not be opened.
    #[error("failed to open SPI channel: {0}")]
    TransportOpen(#[from] OpenError),

    /// An SPI exchange failed.
    #[error("SPI transfer failed: {0}")]
    TransportIo(#[from] TransferError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to initialise the GPIO subsystem.
#[derive(Debug, Error)]
#[error("GPIO failed to initialize")]
pub struct SubsystemError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl SubsystemError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

/// Why an SPI channel failed to open.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("bad SPI channel {0}")]
    BadChannel(u8),

    #[error("bad SPI speed {0} Hz")]
    BadSpeed(u32),

    #[error("bad SPI baud rate {0}")]
    BadBaud(u32),

    #[error("SPI channel unavailable")]
    ChannelUnavailable(#[source] std::io::Error),

    #[error("SPI device failed to open")]
    OpenFailed(#[source] std::io::Error),

    #[error("bad SPI flags")]
    BadFlags,

    #[error("failed due to unknown error: {0}")]
    Unknown(String),
}

/// Why an SPI exchange failed.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("bad SPI handle")]
    BadHandle,

    #[error("bad SPI count {0}")]
    BadCount(usize),

    #[error("transfer failed")]
    TransferFailed(#[source] std::io::Error),
}

impl embedded_hal::spi::Error for TransferError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}
