//! Pin definitions for the 7.5" e-paper HAT on a Raspberry Pi
//!
//! BCM numbering. The assignment is fixed by the HAT and not configurable.

/// Pin configuration constants for the e-paper HAT
pub struct Pins;

#[allow(dead_code)]
impl Pins {
    /// Reset pin for display (active low)
    pub const RST: u8 = 17;
    /// Data/Command control pin (High for data, Low for command)
    pub const DC: u8 = 25;
    /// Chip Select, driven by the SPI0 peripheral as CE0
    pub const CS: u8 = 8;
    /// Busy status pin (Low while the controller is working), pulled down
    pub const BUSY: u8 = 24;
    /// Power enable for the panel's supply
    pub const PWR: u8 = 18;
    /// SPI Master Out Slave In
    pub const MOSI: u8 = 10;
    /// SPI Clock pin
    pub const SCLK: u8 = 11;
}

/// SPI settings for the panel
pub struct SpiSettings;

impl SpiSettings {
    /// SPI clock speed in Hz (4 MHz)
    pub const CLOCK_SPEED_HZ: u32 = 4_000_000;
    /// Largest single transfer accepted by spidev with its default `bufsiz`
    pub const MAX_TRANSFER: usize = 4096;
}
