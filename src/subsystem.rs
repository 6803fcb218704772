//! The GPIO/SPI layer an [`Adc`](crate::Adc) session is built on.

use embedded_hal::spi::{Mode, SpiDevice};

use crate::error::{OpenError, SubsystemError, TransferError};

/// How to open the SPI channel the chip sits on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpiSettings {
    /// Chip enable line the chip is wired to.
    pub channel: u8,
    /// Clock speed in Hz.
    pub clock_speed: u32,
    pub mode: Mode,
}

/// A general purpose I/O subsystem able to hand out SPI channels.
///
/// An [`Adc`](crate::Adc) calls [`initialize`](Subsystem::initialize) once, then
/// [`open`](Subsystem::open) once, and [`terminate`](Subsystem::terminate) when it is
/// dropped or when opening fails.
pub trait Subsystem {
    /// An open SPI channel. Each transaction runs with chip select held low.
    type Spi: SpiDevice<Error = TransferError>;

    fn initialize(&mut self) -> Result<(), SubsystemError>;

    fn open(&mut self, settings: &SpiSettings) -> Result<Self::Spi, OpenError>;

    /// Releases whatever [`initialize`](Subsystem::initialize) acquired. Must be safe to
    /// call regardless of transport state.
    fn terminate(&mut self);
}
