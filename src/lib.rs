//! Reads an MCP3008 ADC over the SPI bus of a single-board computer.
//!
//! ```no_run
//! # fn main() -> Result<(), mcp3008_pi::Error> {
//! let mut adc = mcp3008_pi::Adc::new(5.0, 5.0)?;
//!
//! println!("{} ({} V)", adc.read_raw_from(7)?, adc.read_from(7)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod adc;
pub mod error;
pub mod subsystem;

#[cfg(feature = "raspberry_pi")]
pub mod raspberry_pi;

pub use adc::Adc;
pub use error::{Error, OpenError, Result, SubsystemError, TransferError};
pub use subsystem::{SpiSettings, Subsystem};

#[cfg(feature = "raspberry_pi")]
pub use raspberry_pi::RaspberryPi;
