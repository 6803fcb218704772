//! [`Subsystem`] for a Raspberry Pi, on top of `rppal`.

use std::io;

use embedded_hal::spi::{ErrorType, Operation, Phase, Polarity, SpiDevice};
use log::{debug, trace};
use rppal::gpio::Gpio;
use rppal::spi::{self, Bus, Mode, Segment, SlaveSelect, Spi};

use crate::error::{OpenError, SubsystemError, TransferError};
use crate::subsystem::{SpiSettings, Subsystem};

/// Clock range the SPI controller can divide down to.
const MIN_BAUD: u32 = 32_000;
const MAX_BAUD: u32 = 125_000_000;

/// spidev's default buffer size.
const MAX_SEGMENT_LEN: usize = 4096;

/// GPIO and SPI0 of a Raspberry Pi.
#[derive(Default)]
pub struct RaspberryPi {
    gpio: Option<Gpio>,
}

impl RaspberryPi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Subsystem for RaspberryPi {
    type Spi = PiSpi;

    fn initialize(&mut self) -> Result<(), SubsystemError> {
        let gpio = Gpio::new().map_err(SubsystemError::new)?;

        self.gpio = Some(gpio);

        debug!("GPIO initialized");

        Ok(())
    }

    fn open(&mut self, settings: &SpiSettings) -> Result<PiSpi, OpenError> {
        let slave_select = match settings.channel {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(OpenError::BadChannel(other)),
        };

        if !(MIN_BAUD..=MAX_BAUD).contains(&settings.clock_speed) {
            return Err(OpenError::BadBaud(settings.clock_speed));
        }

        let mode = spi_mode(settings.mode);

        let spi = Spi::new(Bus::Spi0, slave_select, settings.clock_speed, mode)
            .map_err(classify_open_error)?;

        debug!(
            "Opened SPI0.{} at {} Hz in {:?}",
            settings.channel, settings.clock_speed, mode
        );

        Ok(PiSpi { spi })
    }

    fn terminate(&mut self) {
        if self.gpio.take().is_some() {
            debug!("GPIO terminated");
        }
    }
}

/// An open spidev channel. Every transaction is a single ioctl, so chip select stays
/// asserted across its operations.
pub struct PiSpi {
    spi: Spi,
}

impl ErrorType for PiSpi {
    type Error = TransferError;
}

impl SpiDevice for PiSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for operation in operations.iter() {
            let len = match operation {
                Operation::Read(words) => words.len(),
                Operation::Write(words) => words.len(),
                Operation::Transfer(read, write) if read.len() != write.len() => {
                    return Err(TransferError::BadCount(read.len().max(write.len())));
                }
                Operation::Transfer(read, _) => read.len(),
                Operation::TransferInPlace(words) => words.len(),
                Operation::DelayNs(_) => 0,
            };

            if len > MAX_SEGMENT_LEN {
                return Err(TransferError::BadCount(len));
            }
        }

        // spidev wants distinct read and write buffers
        let scratch: Vec<Vec<u8>> = operations
            .iter()
            .map(|operation| match operation {
                Operation::TransferInPlace(words) => words.to_vec(),
                _ => Vec::new(),
            })
            .collect();

        let mut segments: Vec<Segment<'_, '_>> = Vec::with_capacity(operations.len());

        for (operation, scratch) in operations.iter_mut().zip(&scratch) {
            let segment = match operation {
                Operation::Read(words) => Segment::with_read(&mut **words),
                Operation::Write(words) => Segment::with_write(*words),
                Operation::Transfer(read, write) => Segment::new(&mut **read, *write),
                Operation::TransferInPlace(words) => Segment::new(&mut **words, scratch),
                Operation::DelayNs(ns) => {
                    if let Some(previous) = segments.last_mut() {
                        let us = ns.div_ceil(1_000).min(u16::MAX as u32) as u16;
                        previous.set_delay(us);
                    }
                    continue;
                }
            };

            segments.push(segment);
        }

        if segments.is_empty() {
            return Ok(());
        }

        trace!("SPI transaction of {} segments", segments.len());

        self.spi
            .transfer_segments(&segments)
            .map_err(classify_transfer_error)
    }
}

fn spi_mode(mode: embedded_hal::spi::Mode) -> Mode {
    match (mode.polarity, mode.phase) {
        (Polarity::IdleLow, Phase::CaptureOnFirstTransition) => Mode::Mode0,
        (Polarity::IdleLow, Phase::CaptureOnSecondTransition) => Mode::Mode1,
        (Polarity::IdleHigh, Phase::CaptureOnFirstTransition) => Mode::Mode2,
        (Polarity::IdleHigh, Phase::CaptureOnSecondTransition) => Mode::Mode3,
    }
}

fn classify_open_error(err: spi::Error) -> OpenError {
    match err {
        spi::Error::Io(err) if err.kind() == io::ErrorKind::NotFound => {
            OpenError::ChannelUnavailable(err)
        }
        spi::Error::Io(err) => OpenError::OpenFailed(err),
        spi::Error::ClockSpeedNotSupported(speed) => OpenError::BadSpeed(speed),
        spi::Error::ModeNotSupported(_) | spi::Error::BitOrderNotSupported(_) => {
            OpenError::BadFlags
        }
        other => OpenError::Unknown(other.to_string()),
    }
}

fn classify_transfer_error(err: spi::Error) -> TransferError {
    match err {
        spi::Error::Io(err) if err.raw_os_error() == Some(libc::EBADF) => {
            TransferError::BadHandle
        }
        spi::Error::Io(err) => TransferError::TransferFailed(err),
        other => TransferError::TransferFailed(io::Error::other(other)),
    }
}
