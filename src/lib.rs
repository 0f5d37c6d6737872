//! Driver and frame tooling for the Waveshare 7.5" (800x480) black/white e-paper HAT
//!
//! - [`epd7in5`] talks to the panel: bus/pin adapter, command sequences, packing
//! - [`frame`] turns an image file into a panel-sized [`epd7in5::Bitmap`]

pub mod epd7in5;
pub mod frame;
