//! 7.5" 800x480 black/white ePaper driver (UC8179 controller)
//!
//! Used with the Waveshare 7.5" V2 panel on a Raspberry Pi HAT, wired to SPI0/CE0.
//!
//! ### Usage
//! This driver does not hide that you're working with one packed buffer. To
//! display something you:
//!
//! 1. open a [`interface::Bus`] (for example [`rpi::RpiBus`]) and hand it to [`driver::Epd7in5`]
//! 1. initialize with [`driver::Epd7in5::init`], [`driver::Epd7in5::init_fast`] or
//!    [`driver::Epd7in5::init_part`]
//! 1. draw into a [`graphics::Bitmap`], preferably with
//!    [`embedded_graphics`](https://github.com/embedded-graphics/embedded-graphics)
//! 1. pack it with [`graphics::pack_image`] and send it with [`driver::Epd7in5::display`]
//! 1. put the panel to sleep with [`driver::Epd7in5::sleep`]
//!
//! ```rust,ignore
//! use epaper_frame::epd7in5::{driver::Epd7in5, graphics::{pack_image, Bitmap}, rpi::RpiBus};
//!
//! let mut epd = Epd7in5::new(RpiBus::new());
//! epd.init_part()?;
//! epd.clear()?;
//!
//! let bitmap = Bitmap::new(WIDTH, HEIGHT);
//! epd.display(&pack_image(&bitmap).data)?;
//! epd.sleep()?;
//! ```
#![deny(missing_docs)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod driver;
pub mod error;
pub mod graphics;
pub mod interface;
pub mod lut;
#[cfg(feature = "rpi")]
pub mod rpi;

mod cmd;
mod flag;
pub mod pins;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{Config, Epd7in5, PanelState, Window};
pub use error::HardwareError;
pub use graphics::{pack_image, Bitmap, BitmapSizeError, PackOutcome, PackedFrame};
pub use interface::{Bus, HalBus, Pin};

/// Display width, pixels horizontally (source outputs)
pub const WIDTH: u32 = 800;

/// Display height, pixels vertically (gate outputs)
pub const HEIGHT: u32 = 480;

/// Bytes in one packed full frame, rows rounded up to whole bytes
pub const BUFFER_SIZE: usize = (WIDTH.div_ceil(8) * HEIGHT) as usize;
