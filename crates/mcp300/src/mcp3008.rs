use embedded_hal::spi::SpiDevice;

use crate::{read_with_mode, to_volts, Channel, VOLTAGE_SCALE};

/// MCP3008 driver
pub struct Mcp3008<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Mcp3008<SPI> {
    /// Creates a new driver from an SPI peripheral.
    /// The chip samples on either SPI mode 0 or mode 1, MSB first, 8 bits per word.
    pub fn new(spi: SPI) -> Self {
        spi.into()
    }

    /// Read a channel and return the 10 bit value as a [`u16`].
    /// If `single_ended` is `true`, the conversion will be completed in single-ended mode.
    /// If `false`, the conversion will instead use differential mode.
    pub fn read_with_mode(&mut self, ch: Channel, single_ended: bool) -> Result<u16, SPI::Error> {
        read_with_mode(&mut self.spi, ch, single_ended)
    }

    /// Read a channel and return the 10 bit value as a [`u16`] in single-ended mode.
    pub fn read(&mut self, ch: Channel) -> Result<u16, SPI::Error> {
        self.read_with_mode(ch, true)
    }

    /// Read a channel pair and return the 10 bit value as a [`u16`] in differential mode.
    pub fn read_differential(&mut self, ch: Channel) -> Result<u16, SPI::Error> {
        self.read_with_mode(ch, false)
    }

    /// Read a channel in single-ended mode and scale it to volts.
    pub fn read_volts(&mut self, ch: Channel) -> Result<f64, SPI::Error> {
        self.read(ch).map(|raw| to_volts(raw, VOLTAGE_SCALE))
    }

    /// Gives the SPI peripheral back.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> From<SPI> for Mcp3008<SPI> {
    fn from(spi: SPI) -> Self {
        Self { spi }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{Error, ErrorKind, ErrorType, Operation};

    #[derive(Debug, PartialEq)]
    struct MockError;

    impl Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Answers each conversion with `100 + channel`, plus 512 in differential mode.
    struct MockSpi;

    impl ErrorType for MockSpi {
        type Error = MockError;
    }

    impl SpiDevice for MockSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            assert_eq!(operations.len(), 1);

            match &mut operations[0] {
                Operation::TransferInPlace(words) => {
                    assert_eq!(words.len(), 3);
                    assert_eq!(words[0], 0b0000_0001, "Missing start flag");

                    let single_ended = words[1] & 0b1000_0000 != 0;
                    let channel = (words[1] >> 4) & 0b111;

                    // Null bit low, undefined bits high
                    words[0] = 0xFF;
                    words[1] = if single_ended { 0b1111_1000 } else { 0b1111_1010 };
                    words[2] = 100 + channel;
                }
                _ => panic!("Not an expected operation"),
            }

            Ok(())
        }
    }

    struct FailingSpi;

    impl ErrorType for FailingSpi {
        type Error = MockError;
    }

    impl SpiDevice for FailingSpi {
        fn transaction(&mut self, _: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            Err(MockError)
        }
    }

    #[test]
    fn mock_spi() {
        let mut mcp = Mcp3008::new(MockSpi);

        for (index, channel) in Channel::all().enumerate() {
            assert_eq!(mcp.read(channel), Ok(100 + index as u16));
        }
    }

    #[test]
    fn differential_mode() {
        let mut mcp = Mcp3008::new(MockSpi);

        assert_eq!(mcp.read_differential(Channel::CH0), Ok(612));
        assert_eq!(mcp.read_differential(Channel::CH7), Ok(619));
    }

    #[test]
    fn volts_use_fixed_scale() {
        let mut mcp = Mcp3008::new(MockSpi);

        assert_eq!(mcp.read_volts(Channel::CH3), Ok(103.0 / 1024.0 * 3.3));
    }

    #[test]
    fn errors_pass_through() {
        let mut mcp = Mcp3008::new(FailingSpi);

        assert_eq!(mcp.read(Channel::CH1), Err(MockError));
        assert_eq!(mcp.read_volts(Channel::CH1), Err(MockError));
    }
}
