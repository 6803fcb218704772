//! Provides a driver for a Microchip MCP3008 ADC via the `embedded-hal` ecosystem.

#![no_std]
#![forbid(unsafe_code)]

use core::fmt;

use embedded_hal::spi::SpiDevice;

pub mod mcp3008;

/// Number of bits in a conversion result.
pub const RESOLUTION_BITS: u32 = 10;

/// Largest value a conversion can return.
pub const MAX_CODE: u16 = (1 << RESOLUTION_BITS) - 1;

/// Full scale used by [`to_volts`] in the 3-byte protocol.
pub const VOLTAGE_SCALE: f64 = 3.3;

/// Maximum SPI clock when V<sub>DD</sub> is at least 4.0V.
pub const SPI_CLOCK_GE_4V: u32 = 3_600_000;
/// Maximum SPI clock when V<sub>DD</sub> is at least 3.3V.
pub const SPI_CLOCK_GE_3V3: u32 = 2_340_000;
/// Maximum SPI clock when V<sub>DD</sub> is at least 2.7V.
pub const SPI_CLOCK_GE_2V7: u32 = 1_350_000;

/// Lowest supported supply voltage.
pub const MIN_SUPPLY_VOLTAGE: f64 = 2.7;
/// Highest supported supply voltage.
pub const MAX_SUPPLY_VOLTAGE: f64 = 5.0;

/// Picks the fastest SPI clock the chip tolerates at the given supply voltage.
/// Returns `None` outside of 2.7V - 5.0V.
pub fn clock_speed_for(supply_voltage: f64) -> Option<u32> {
    if !(MIN_SUPPLY_VOLTAGE..=MAX_SUPPLY_VOLTAGE).contains(&supply_voltage) {
        return None;
    }

    let speed = if supply_voltage >= 4.0 {
        SPI_CLOCK_GE_4V
    } else if supply_voltage >= 3.3 {
        SPI_CLOCK_GE_3V3
    } else {
        SPI_CLOCK_GE_2V7
    };

    Some(speed)
}

/// Channel list for MCP3008
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    CH0 = 0,
    CH1 = 1,
    CH2 = 2,
    CH3 = 3,
    CH4 = 4,
    CH5 = 5,
    CH6 = 6,
    CH7 = 7,
}

impl Channel {
    /// Iterate over all channels.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::CH0,
            Self::CH1,
            Self::CH2,
            Self::CH3,
            Self::CH4,
            Self::CH5,
            Self::CH6,
            Self::CH7,
        ]
        .into_iter()
    }
}

/// A channel index outside of 0-7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidChannel(pub u8);

impl fmt::Display for InvalidChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {} is not between 0-7", self.0)
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::all()
            .nth(value as usize)
            .ok_or(InvalidChannel(value))
    }
}

/// Builds the 3 byte request frame: start bit, mode and channel select, then filler.
pub fn encode_request(channel: Channel, single_ended: bool) -> [u8; 3] {
    let mode = if single_ended {
        0b1000_0000
    } else {
        0b0000_0000
    };

    let channel = (channel as u8 & 0b111) << 4;

    [0b0000_0001, mode | channel, 0b0000_0000]
}

/// Extracts the 10 bit result from a 3 byte response frame.
pub fn decode_response(response: &[u8; 3]) -> u16 {
    let result = u16::from_be_bytes([response[1], response[2]]);

    result & 0b0000_0011_1111_1111
}

/// Scales a raw conversion result to volts against `full_scale`.
pub fn to_volts(raw: u16, full_scale: f64) -> f64 {
    raw as f64 / 1024.0 * full_scale
}

/// Internal method for reading/writing to an MCP3008 with a single full-duplex exchange.
pub(crate) fn read_with_mode<SPI: SpiDevice>(
    spi: &mut SPI,
    channel: Channel,
    single_ended: bool,
) -> Result<u16, SPI::Error> {
    let mut buffer = encode_request(channel, single_ended);

    spi.transfer_in_place(&mut buffer)?;

    Ok(decode_response(&buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_selects_channel_in_high_nibble() {
        for (index, channel) in Channel::all().enumerate() {
            let request = encode_request(channel, true);

            assert_eq!(request[0], 0x01, "Missing start flag");
            assert_eq!(request[1], 0x80 | ((index as u8) << 4));
            assert_eq!(request[2], 0x00);
        }
    }

    #[test]
    fn differential_request_clears_mode_bit() {
        assert_eq!(encode_request(Channel::CH0, false), [0x01, 0x00, 0x00]);
        assert_eq!(encode_request(Channel::CH5, false), [0x01, 0x50, 0x00]);
    }

    #[test]
    fn channel_from_index() {
        assert_eq!(Channel::try_from(0), Ok(Channel::CH0));
        assert_eq!(Channel::try_from(7), Ok(Channel::CH7));
        assert_eq!(Channel::try_from(8), Err(InvalidChannel(8)));
        assert_eq!(Channel::try_from(255), Err(InvalidChannel(255)));
    }

    #[test]
    fn response_keeps_low_ten_bits() {
        assert_eq!(decode_response(&[0xFF, 0x00, 0x00]), 0);
        assert_eq!(decode_response(&[0x00, 0x03, 0xFF]), 1023);
        assert_eq!(decode_response(&[0x00, 0x02, 0x01]), 513);

        // Null bit and undefined leading bits are discarded
        assert_eq!(decode_response(&[0xAA, 0xFD, 0x10]), 0x110);

        for b1 in 0..=u8::MAX {
            for b2 in [0x00, 0x5A, 0xFF] {
                let value = decode_response(&[0, b1, b2]);

                assert_eq!(value, (((b1 & 0x03) as u16) << 8) | b2 as u16);
                assert!(value <= MAX_CODE);
            }
        }
    }

    #[test]
    fn clock_tiers() {
        assert_eq!(clock_speed_for(2.7), Some(SPI_CLOCK_GE_2V7));
        assert_eq!(clock_speed_for(3.29), Some(SPI_CLOCK_GE_2V7));
        assert_eq!(clock_speed_for(3.3), Some(SPI_CLOCK_GE_3V3));
        assert_eq!(clock_speed_for(3.99), Some(SPI_CLOCK_GE_3V3));
        assert_eq!(clock_speed_for(4.0), Some(SPI_CLOCK_GE_4V));
        assert_eq!(clock_speed_for(5.0), Some(SPI_CLOCK_GE_4V));
    }

    #[test]
    fn clock_rejects_unsupported_supply() {
        assert_eq!(clock_speed_for(2.69), None);
        assert_eq!(clock_speed_for(2.0), None);
        assert_eq!(clock_speed_for(5.01), None);
        assert_eq!(clock_speed_for(f64::NAN), None);
    }

    #[test]
    fn scaling_is_linear() {
        assert_eq!(to_volts(0, VOLTAGE_SCALE), 0.0);
        assert_eq!(to_volts(512, VOLTAGE_SCALE), 1.65);

        let top = to_volts(MAX_CODE, VOLTAGE_SCALE);
        assert!((top - 3.2967).abs() < 1e-4);

        for raw in 0..=MAX_CODE {
            assert_eq!(to_volts(raw, VOLTAGE_SCALE), raw as f64 / 1024.0 * 3.3);
        }
    }
}
