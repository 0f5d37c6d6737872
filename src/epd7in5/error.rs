//! Error types for the driver and the bus adapter

pub use display_interface::DisplayError;
use thiserror::Error;

use crate::epd7in5::driver::PanelState;

/// Errors that can occur when talking to the panel
///
/// Nothing in the driver retries; every variant is surfaced to the caller as-is.
#[derive(Error, Debug)]
pub enum HardwareError {
    /// The SPI device or a GPIO line could not be claimed
    #[error("could not open SPI bus or GPIO lines: {0}")]
    OpenFailed(String),

    /// A pin or SPI operation was attempted while the bus is closed
    #[error("bus is not open")]
    NotOpen,

    /// The BUSY line did not report idle within the configured bound
    #[error("timed out after {waited_ms} ms waiting for the panel to become idle")]
    Timeout {
        /// Time spent polling before giving up
        waited_ms: u32,
    },

    /// The operation is not valid in the panel's current state
    #[error("cannot {operation} while the panel is {state:?}")]
    InvalidState {
        /// Name of the rejected operation
        operation: &'static str,
        /// State the panel was in
        state: PanelState,
    },

    /// Frame buffer length does not match what the panel expects
    #[error("buffer has {provided} bytes, expected {required}")]
    BufferSize {
        /// Required buffer size in bytes
        required: usize,
        /// Provided buffer size in bytes
        provided: usize,
    },

    /// Partial refresh window is empty or outside the panel
    #[error("invalid window ({x_start},{y_start})..({x_end},{y_end})")]
    InvalidWindow {
        /// First column
        x_start: u32,
        /// First row
        y_start: u32,
        /// Column after the last one
        x_end: u32,
        /// Row after the last one
        y_end: u32,
    },

    /// SPI transfer or DC/RST line failure
    #[error("display interface error: {0:?}")]
    Interface(DisplayError),

    /// Power enable or BUSY line failure
    #[error("GPIO access failed on the {0} line")]
    Gpio(&'static str),
}

impl From<DisplayError> for HardwareError {
    fn from(err: DisplayError) -> Self {
        HardwareError::Interface(err)
    }
}
