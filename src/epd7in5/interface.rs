//! Bus/pin adapter between the driver and the hardware
//!
//! [`Bus`] is the only thing the panel driver talks to. It maps the logical
//! signals (reset, data/command, power enable, busy) onto whatever GPIO and
//! SPI implementation the platform provides. Chip-select is not part of the
//! trait: the SPI device frames every `spi_write` with it.
//!
//! [`HalBus`] implements the trait on top of embedded-hal 1.0 traits, so any
//! HAL with an `SpiDevice`, two `OutputPin`s for reset/DC, one for power and an
//! `InputPin` for busy can drive the panel.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
    spi::SpiDevice,
};

use crate::epd7in5::error::{DisplayError, HardwareError};
use crate::epd7in5::pins::SpiSettings;

/// Output lines the driver drives directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    /// Reset, active low
    Reset,
    /// Data/Command select (Low for command, High for data)
    DataCommand,
    /// Power enable for the panel's supply
    Power,
}

/// Hardware adapter used by [`Epd7in5`](crate::epd7in5::driver::Epd7in5)
///
/// Implementations own the SPI handle and the GPIO lines exclusively.
pub trait Bus {
    /// Claim the SPI device and GPIO lines and switch the panel supply on.
    ///
    /// Calling it on an open bus is a no-op.
    fn open(&mut self) -> Result<(), HardwareError>;

    /// Deassert every output line and release the handle.
    ///
    /// Calling it on a closed bus is a no-op.
    fn close(&mut self) -> Result<(), HardwareError>;

    /// Drive one output line
    fn write_pin(&mut self, pin: Pin, level: PinState) -> Result<(), HardwareError>;

    /// Raw level of the BUSY line; the controller holds it low while working
    fn read_busy(&mut self) -> Result<bool, HardwareError>;

    /// Blocking sleep
    fn delay_ms(&mut self, ms: u32);

    /// Transmit bytes in one SPI transaction
    fn spi_write(&mut self, bytes: &[u8]) -> Result<(), HardwareError>;

    /// Transmit a large payload
    ///
    /// Split into transfers spidev accepts; the bytes on the wire are the same
    /// as writing them one at a time.
    fn spi_write_bulk(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        for chunk in bytes.chunks(SpiSettings::MAX_TRANSFER) {
            self.spi_write(chunk)?;
        }
        Ok(())
    }
}

/// [`Bus`] over embedded-hal 1.0 peripherals
///
/// ## Type Parameters
///
/// - `SPI` - SPI device, asserts chip-select around each transaction
/// - `RST` - Reset output pin
/// - `DC` - Data/Command output pin
/// - `PWR` - Power enable output pin
/// - `BSY` - BUSY input pin (LOW while the display is busy)
/// - `DELAY` - Delay provider for timing
pub struct HalBus<SPI, RST, DC, PWR, BSY, DELAY> {
    /// SPI device
    spi: SPI,
    /// Pin for Reseting
    rst: RST,
    /// Data/Command Control Pin (High for data, Low for command)
    dc: DC,
    /// Panel supply
    pwr: PWR,
    /// Low while the controller is busy
    busy: BSY,
    /// Delay provider
    delay: DELAY,
    is_open: bool,
}

impl<SPI, RST, DC, PWR, BSY, DELAY> HalBus<SPI, RST, DC, PWR, BSY, DELAY> {
    /// Wrap already configured peripherals; the bus starts closed
    pub fn new(spi: SPI, rst: RST, dc: DC, pwr: PWR, busy: BSY, delay: DELAY) -> Self {
        HalBus {
            spi,
            rst,
            dc,
            pwr,
            busy,
            delay,
            is_open: false,
        }
    }

    /// Whether [`Bus::open`] has been called without a matching [`Bus::close`]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Give the peripherals back
    pub fn release(self) -> (SPI, RST, DC, PWR, BSY, DELAY) {
        (self.spi, self.rst, self.dc, self.pwr, self.busy, self.delay)
    }
}

impl<SPI, RST, DC, PWR, BSY, DELAY> HalBus<SPI, RST, DC, PWR, BSY, DELAY>
where
    RST: OutputPin,
    DC: OutputPin,
    PWR: OutputPin,
{
    fn set(&mut self, pin: Pin, level: PinState) -> Result<(), HardwareError> {
        match pin {
            Pin::Reset => self
                .rst
                .set_state(level)
                .map_err(|_| HardwareError::from(DisplayError::RSError)),
            Pin::DataCommand => self
                .dc
                .set_state(level)
                .map_err(|_| HardwareError::from(DisplayError::DCError)),
            Pin::Power => self
                .pwr
                .set_state(level)
                .map_err(|_| HardwareError::Gpio("power enable")),
        }
    }
}

impl<SPI, RST, DC, PWR, BSY, DELAY> Bus for HalBus<SPI, RST, DC, PWR, BSY, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DC: OutputPin,
    PWR: OutputPin,
    BSY: InputPin,
    DELAY: DelayNs,
{
    fn open(&mut self) -> Result<(), HardwareError> {
        if self.is_open {
            return Ok(());
        }
        log::debug!("powering up panel supply");
        self.set(Pin::Power, PinState::High)?;
        self.is_open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        if !self.is_open {
            return Ok(());
        }
        log::debug!("spi end, closing 5V supply");
        self.is_open = false;

        // Try every line even if one fails, report the first failure
        let rst = self.set(Pin::Reset, PinState::Low);
        let dc = self.set(Pin::DataCommand, PinState::Low);
        let pwr = self.set(Pin::Power, PinState::Low);
        rst.and(dc).and(pwr)
    }

    fn write_pin(&mut self, pin: Pin, level: PinState) -> Result<(), HardwareError> {
        if !self.is_open {
            return Err(HardwareError::NotOpen);
        }
        self.set(pin, level)
    }

    fn read_busy(&mut self) -> Result<bool, HardwareError> {
        if !self.is_open {
            return Err(HardwareError::NotOpen);
        }
        self.busy.is_high().map_err(|_| HardwareError::Gpio("busy"))
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn spi_write(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        if !self.is_open {
            return Err(HardwareError::NotOpen);
        }
        self.spi.write(bytes).map_err(|e| {
            log::error!("SPI write error for {} bytes: {:?}", bytes.len(), e);
            HardwareError::from(DisplayError::BusWriteError)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::spi::{ErrorType as SpiErrorType, Operation};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Wire {
        Pin(&'static str, bool),
        Spi(Vec<u8>),
        Delay(u32),
    }

    type Log = Rc<RefCell<Vec<Wire>>>;

    struct FakeOutput {
        name: &'static str,
        log: Log,
    }

    impl PinErrorType for FakeOutput {
        type Error = Infallible;
    }

    impl OutputPin for FakeOutput {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Wire::Pin(self.name, false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.borrow_mut().push(Wire::Pin(self.name, true));
            Ok(())
        }
    }

    struct FakeBusy(bool);

    impl PinErrorType for FakeBusy {
        type Error = Infallible;
    }

    impl InputPin for FakeBusy {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    struct FakeSpi {
        log: Log,
    }

    impl SpiErrorType for FakeSpi {
        type Error = Infallible;
    }

    impl SpiDevice for FakeSpi {
        fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
            for op in operations {
                if let Operation::Write(bytes) = op {
                    self.log.borrow_mut().push(Wire::Spi(bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    struct FakeDelay {
        log: Log,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.log.borrow_mut().push(Wire::Delay(ns / 1_000_000));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.log.borrow_mut().push(Wire::Delay(ms));
        }
    }

    fn hal_bus(
        busy: bool,
    ) -> (
        HalBus<FakeSpi, FakeOutput, FakeOutput, FakeOutput, FakeBusy, FakeDelay>,
        Log,
    ) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let bus = HalBus::new(
            FakeSpi { log: log.clone() },
            FakeOutput {
                name: "rst",
                log: log.clone(),
            },
            FakeOutput {
                name: "dc",
                log: log.clone(),
            },
            FakeOutput {
                name: "pwr",
                log: log.clone(),
            },
            FakeBusy(busy),
            FakeDelay { log: log.clone() },
        );
        (bus, log)
    }

    #[test]
    fn closed_bus_rejects_pin_and_spi_access() {
        let (mut bus, log) = hal_bus(true);

        assert!(matches!(
            bus.write_pin(Pin::Reset, PinState::High),
            Err(HardwareError::NotOpen)
        ));
        assert!(matches!(bus.spi_write(&[0x12]), Err(HardwareError::NotOpen)));
        assert!(matches!(bus.read_busy(), Err(HardwareError::NotOpen)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn open_powers_up_once() {
        let (mut bus, log) = hal_bus(true);

        bus.open().unwrap();
        bus.open().unwrap();

        assert!(bus.is_open());
        assert_eq!(*log.borrow(), vec![Wire::Pin("pwr", true)]);
    }

    #[test]
    fn close_deasserts_every_output() {
        let (mut bus, log) = hal_bus(true);
        bus.open().unwrap();
        bus.write_pin(Pin::DataCommand, PinState::High).unwrap();
        log.borrow_mut().clear();

        bus.close().unwrap();
        bus.close().unwrap();

        assert!(!bus.is_open());
        assert_eq!(
            *log.borrow(),
            vec![
                Wire::Pin("rst", false),
                Wire::Pin("dc", false),
                Wire::Pin("pwr", false),
            ]
        );
    }

    #[test]
    fn bulk_write_splits_into_spidev_sized_transfers() {
        let (mut bus, log) = hal_bus(true);
        bus.open().unwrap();
        log.borrow_mut().clear();

        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        bus.spi_write_bulk(&payload).unwrap();

        let transfers: Vec<Vec<u8>> = log
            .borrow()
            .iter()
            .filter_map(|w| match w {
                Wire::Spi(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            transfers.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![4096, 4096, 1808]
        );
        assert_eq!(transfers.concat(), payload);
    }

    #[test]
    fn busy_line_level_is_passed_through() {
        let (mut idle, _) = hal_bus(true);
        idle.open().unwrap();
        assert!(idle.read_busy().unwrap());

        let (mut working, _) = hal_bus(false);
        working.open().unwrap();
        assert!(!working.read_busy().unwrap());
    }

    #[test]
    fn delay_is_forwarded_even_when_closed() {
        let (mut bus, log) = hal_bus(true);
        bus.delay_ms(20);
        assert_eq!(*log.borrow(), vec![Wire::Delay(20)]);
    }
}
