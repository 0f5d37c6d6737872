//! [`Bus`] for the e-paper HAT on a Raspberry Pi
//!
//! Needs SPI enabled (`dtparam=spi=on`) and access to `/dev/spidev0.0` and
//! `/dev/gpiomem`.
//!
//! | Raspberry      | EPD   |
//! |----------------|-------|
//! | GPIO 11 (SCLK) | CLK   |
//! | GPIO 10 (MOSI) | DIN   |
//! | GPIO 8  (CE0)  | CS    |
//! | GPIO 24        | BUSY  |
//! | GPIO 25        | DC    |
//! | GPIO 17        | RST   |
//! | GPIO 18        | PWR   |

use std::time::Duration;

use embedded_hal::digital::PinState;
use rppal::{
    gpio::{Gpio, InputPin, OutputPin},
    hal::Delay,
    spi::{Bus as SpiBus, Mode, SimpleHalSpiDevice, SlaveSelect, Spi},
};

use crate::epd7in5::error::HardwareError;
use crate::epd7in5::interface::{Bus, HalBus, Pin};
use crate::epd7in5::pins::{Pins, SpiSettings};

type PiHalBus = HalBus<SimpleHalSpiDevice, OutputPin, OutputPin, OutputPin, InputPin, Delay>;

/// SPI0/CE0 plus the HAT's GPIO lines, claimed on [`Bus::open`]
///
/// Dropping the bus closes it, so the supply is switched off on every exit
/// path that unwinds.
#[derive(Default)]
pub struct RpiBus {
    inner: Option<PiHalBus>,
}

impl RpiBus {
    /// Closed bus; nothing is claimed until [`Bus::open`]
    pub fn new() -> Self {
        RpiBus { inner: None }
    }

    fn claim() -> Result<PiHalBus, HardwareError> {
        let spi = Spi::new(
            SpiBus::Spi0,
            SlaveSelect::Ss0,
            SpiSettings::CLOCK_SPEED_HZ,
            Mode::Mode0,
        )
        .map_err(|e| HardwareError::OpenFailed(format!("SPI0: {e}")))?;
        let gpio = Gpio::new().map_err(|e| HardwareError::OpenFailed(format!("GPIO: {e}")))?;

        let output = |pin: u8| {
            gpio.get(pin)
                .map(|p| p.into_output_low())
                .map_err(|e| HardwareError::OpenFailed(format!("GPIO {pin}: {e}")))
        };
        let rst = output(Pins::RST)?;
        let dc = output(Pins::DC)?;
        let pwr = output(Pins::PWR)?;
        let busy = gpio
            .get(Pins::BUSY)
            .map(|p| p.into_input_pulldown())
            .map_err(|e| HardwareError::OpenFailed(format!("GPIO {}: {e}", Pins::BUSY)))?;

        log::debug!(
            "claimed spidev0.0 at {} Hz, RST={} DC={} PWR={} BUSY={}",
            SpiSettings::CLOCK_SPEED_HZ,
            Pins::RST,
            Pins::DC,
            Pins::PWR,
            Pins::BUSY
        );

        Ok(HalBus::new(
            SimpleHalSpiDevice::new(spi),
            rst,
            dc,
            pwr,
            busy,
            Delay::new(),
        ))
    }

    fn open_inner(&mut self) -> Result<&mut PiHalBus, HardwareError> {
        self.inner.as_mut().ok_or(HardwareError::NotOpen)
    }
}

impl Bus for RpiBus {
    fn open(&mut self) -> Result<(), HardwareError> {
        if self.inner.is_some() {
            return Ok(());
        }
        let mut bus = Self::claim()?;
        bus.open()?;
        self.inner = Some(bus);
        Ok(())
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        match self.inner.take() {
            Some(mut bus) => bus.close(),
            None => Ok(()),
        }
    }

    fn write_pin(&mut self, pin: Pin, level: PinState) -> Result<(), HardwareError> {
        self.open_inner()?.write_pin(pin, level)
    }

    fn read_busy(&mut self) -> Result<bool, HardwareError> {
        self.open_inner()?.read_busy()
    }

    fn delay_ms(&mut self, ms: u32) {
        match self.inner.as_mut() {
            Some(bus) => bus.delay_ms(ms),
            None => std::thread::sleep(Duration::from_millis(u64::from(ms))),
        }
    }

    fn spi_write(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        self.open_inner()?.spi_write(bytes)
    }
}

impl Drop for RpiBus {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("closing the e-paper bus failed: {}", e);
        }
    }
}
