//! In-memory [`Bus`] that records the traffic the driver produces

use embedded_hal::digital::PinState;

use crate::epd7in5::cmd::Cmd;
use crate::epd7in5::error::HardwareError;
use crate::epd7in5::interface::{Bus, Pin};

/// One observable step on the fake bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Open,
    Close,
    Pin(Pin, bool),
    /// Byte written while DC was low
    Command(u8),
    /// Byte written while DC was high
    Data(u8),
    Delay(u32),
    BusyRead,
}

/// How the BUSY line answers
#[derive(Debug, Clone, Copy)]
pub(crate) enum Busy {
    /// Idle on every read
    Idle,
    /// Never leaves the busy state
    Stuck,
    /// Busy for the first `n` reads of each wait, idle afterwards
    IdleAfter(usize),
}

pub(crate) struct RecordingBus {
    pub events: Vec<Event>,
    pub busy: Busy,
    pub fail_open: bool,
    open: bool,
    dc_high: bool,
    busy_reads: usize,
}

impl RecordingBus {
    pub fn new() -> Self {
        RecordingBus {
            events: Vec::new(),
            busy: Busy::Idle,
            fail_open: false,
            open: false,
            dc_high: false,
            busy_reads: 0,
        }
    }

    pub fn with_busy(busy: Busy) -> Self {
        RecordingBus {
            busy,
            ..RecordingBus::new()
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Commands in order, leaving out the busy status queries
    pub fn commands(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(c) if *c != Cmd::GET_STATUS => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Data bytes sent after the `nth` occurrence of `command`
    pub fn data_after_nth(&self, command: u8, nth: usize) -> Vec<u8> {
        let start = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == Event::Command(command))
            .nth(nth)
            .map(|(i, _)| i + 1);
        let Some(start) = start else {
            return Vec::new();
        };
        self.events[start..]
            .iter()
            .take_while(|e| !matches!(e, Event::Command(_)))
            .filter_map(|e| match e {
                Event::Data(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Data bytes sent after the first occurrence of `command`
    pub fn data_after(&self, command: u8) -> Vec<u8> {
        self.data_after_nth(command, 0)
    }

    pub fn busy_reads(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::BusyRead)
            .count()
    }
}

impl Bus for RecordingBus {
    fn open(&mut self) -> Result<(), HardwareError> {
        if self.fail_open {
            return Err(HardwareError::OpenFailed("/dev/spidev0.0 missing".into()));
        }
        if !self.open {
            self.open = true;
            self.events.push(Event::Open);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        if self.open {
            self.open = false;
            self.events.push(Event::Close);
        }
        Ok(())
    }

    fn write_pin(&mut self, pin: Pin, level: PinState) -> Result<(), HardwareError> {
        if !self.open {
            return Err(HardwareError::NotOpen);
        }
        let high = level == PinState::High;
        if pin == Pin::DataCommand {
            self.dc_high = high;
        }
        self.events.push(Event::Pin(pin, high));
        Ok(())
    }

    fn read_busy(&mut self) -> Result<bool, HardwareError> {
        if !self.open {
            return Err(HardwareError::NotOpen);
        }
        self.events.push(Event::BusyRead);
        let idle = match self.busy {
            Busy::Idle => true,
            Busy::Stuck => false,
            Busy::IdleAfter(n) => {
                self.busy_reads += 1;
                if self.busy_reads > n {
                    self.busy_reads = 0;
                    true
                } else {
                    false
                }
            }
        };
        Ok(idle)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.push(Event::Delay(ms));
    }

    fn spi_write(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        if !self.open {
            return Err(HardwareError::NotOpen);
        }
        let dc_high = self.dc_high;
        self.events.extend(bytes.iter().map(|&b| {
            if dc_high {
                Event::Data(b)
            } else {
                Event::Command(b)
            }
        }));
        Ok(())
    }
}
