//! Monochrome bitmap and the packing rule for the panel's wire format

use core::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use thiserror::Error;

use crate::epd7in5::{BUFFER_SIZE, HEIGHT, WIDTH};

/// Raw rows handed to [`Bitmap::from_bytes`] do not fit the dimensions
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("bitmap data has {provided} bytes, {width}x{height} needs {required}")]
pub struct BitmapSizeError {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes the dimensions need
    pub required: usize,
    /// Bytes provided
    pub provided: usize,
}

/// 1 bit per pixel image, rows padded to whole bytes, MSB first
///
/// Bit `1` is white and bit `0` is black. As a `DrawTarget`,
/// `BinaryColor::On` draws black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// All white bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, BinaryColor::Off)
    }

    /// Bitmap filled with one color
    pub fn filled(width: u32, height: u32, color: BinaryColor) -> Self {
        let fill = match color {
            BinaryColor::On => 0x00,
            BinaryColor::Off => 0xFF,
        };
        Bitmap {
            width,
            height,
            data: vec![fill; Self::stride_for(width) * height as usize],
        }
    }

    /// Wrap raw rows, `data` must hold exactly `height` padded rows
    pub fn from_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BitmapSizeError> {
        let required = Self::stride_for(width) * height as usize;
        if data.len() != required {
            return Err(BitmapSizeError {
                width,
                height,
                required,
                provided: data.len(),
            });
        }
        Ok(Bitmap {
            width,
            height,
            data,
        })
    }

    fn stride_for(width: u32) -> usize {
        width.div_ceil(8) as usize
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    /// Raw rows
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Color at (x, y), `None` outside the bitmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let byte = self.data[y as usize * self.stride() + x as usize / 8];
        let white = byte & (0x80 >> (x % 8)) != 0;
        Some(if white {
            BinaryColor::Off
        } else {
            BinaryColor::On
        })
    }

    /// Set (x, y); points outside the bitmap are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y as usize * self.stride() + x as usize / 8;
        let mask = 0x80 >> (x % 8);
        match color {
            BinaryColor::On => self.data[index] &= !mask,
            BinaryColor::Off => self.data[index] |= mask,
        }
    }
}

impl DrawTarget for Bitmap {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

impl OriginDimensions for Bitmap {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// How [`pack_image`] treated its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackOutcome {
    /// 800x480, packed as is
    Native,
    /// 480x800, rotated 90 degrees counter-clockwise first
    Rotated,
    /// Any other size; the frame is blank
    InvalidDimensions {
        /// Width of the rejected bitmap
        width: u32,
        /// Height of the rejected bitmap
        height: u32,
    },
}

/// Frame in wire convention (`1` = black), ready for `Epd7in5::display`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    /// [`BUFFER_SIZE`] bytes
    pub data: Vec<u8>,
    /// What happened to the input
    pub outcome: PackOutcome,
}

/// Convert a bitmap into the panel's wire format
///
/// A panel-sized bitmap is complemented byte by byte. A portrait (480x800)
/// bitmap is rotated counter-clockwise into landscape first. Anything else
/// gives an all-white frame and a warning.
pub fn pack_image(bitmap: &Bitmap) -> PackedFrame {
    match (bitmap.width(), bitmap.height()) {
        (WIDTH, HEIGHT) => PackedFrame {
            data: bitmap.data().iter().map(|b| !b).collect(),
            outcome: PackOutcome::Native,
        },
        (HEIGHT, WIDTH) => PackedFrame {
            data: pack_rotated(bitmap),
            outcome: PackOutcome::Rotated,
        },
        (width, height) => {
            log::warn!(
                "Wrong image dimensions {}x{}: must be {}x{} (or {}x{}), sending a blank frame",
                width,
                height,
                WIDTH,
                HEIGHT,
                HEIGHT,
                WIDTH
            );
            PackedFrame {
                data: vec![0x00; BUFFER_SIZE],
                outcome: PackOutcome::InvalidDimensions { width, height },
            }
        }
    }
}

/// Panel pixel (x, y) comes from portrait pixel (479 - y, x)
fn pack_rotated(portrait: &Bitmap) -> Vec<u8> {
    let stride = WIDTH.div_ceil(8) as usize;
    let mut out = vec![0x00; BUFFER_SIZE];
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            if portrait.pixel(HEIGHT - 1 - y, x) == Some(BinaryColor::On) {
                out[y as usize * stride + x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    fn black_pixels(frame: &[u8]) -> u32 {
        frame.iter().map(|b| b.count_ones()).sum()
    }

    #[test]
    fn white_bitmap_packs_to_white_frame() {
        let frame = pack_image(&Bitmap::new(WIDTH, HEIGHT));

        assert_eq!(frame.outcome, PackOutcome::Native);
        assert_eq!(frame.data.len(), BUFFER_SIZE);
        assert!(frame.data.iter().all(|&b| b == 0x00));
    }

    #[test]
    fn native_frame_is_bitwise_complement() {
        let mut bitmap = Bitmap::new(WIDTH, HEIGHT);
        bitmap.set_pixel(0, 0, BinaryColor::On);
        bitmap.set_pixel(9, 1, BinaryColor::On);
        bitmap.set_pixel(799, 479, BinaryColor::On);

        let frame = pack_image(&bitmap);

        for (packed, source) in frame.data.iter().zip(bitmap.data()) {
            assert_eq!(*packed, !*source);
        }
        assert_eq!(frame.data[0], 0x80);
        assert_eq!(frame.data[100 + 1], 0x40);
        assert_eq!(frame.data[BUFFER_SIZE - 1], 0x01);
        assert_eq!(black_pixels(&frame.data), 3);
    }

    #[test]
    fn portrait_bitmap_is_rotated_counter_clockwise() {
        let mut portrait = Bitmap::new(HEIGHT, WIDTH);
        // top-right corner ends up top-left
        portrait.set_pixel(479, 0, BinaryColor::On);
        // top-left ends up bottom-left
        portrait.set_pixel(0, 0, BinaryColor::On);
        // bottom-left ends up bottom-right
        portrait.set_pixel(0, 799, BinaryColor::On);
        // a pixel off the corners: (10, 3) -> (3, 469)
        portrait.set_pixel(10, 3, BinaryColor::On);

        let frame = pack_image(&portrait);

        assert_eq!(frame.outcome, PackOutcome::Rotated);
        assert_eq!(frame.data.len(), BUFFER_SIZE);
        assert_eq!(frame.data[0], 0x80);
        assert_eq!(frame.data[479 * 100], 0x80);
        assert_eq!(frame.data[479 * 100 + 99], 0x01);
        assert_eq!(frame.data[469 * 100], 0x10);
        assert_eq!(black_pixels(&frame.data), 4);
    }

    #[test]
    fn other_sizes_give_blank_frame() {
        let mut bitmap = Bitmap::filled(100, 100, BinaryColor::On);
        bitmap.set_pixel(1, 1, BinaryColor::Off);

        let frame = pack_image(&bitmap);

        assert_eq!(
            frame.outcome,
            PackOutcome::InvalidDimensions {
                width: 100,
                height: 100
            }
        );
        assert_eq!(frame.data.len(), BUFFER_SIZE);
        assert!(frame.data.iter().all(|&b| b == 0x00));
    }

    #[test]
    fn rows_are_padded_to_whole_bytes() {
        let mut bitmap = Bitmap::new(10, 2);
        assert_eq!(bitmap.stride(), 2);
        assert_eq!(bitmap.data().len(), 4);

        bitmap.set_pixel(9, 1, BinaryColor::On);
        assert_eq!(bitmap.data(), &[0xFF, 0xFF, 0xFF, 0xBF]);
        assert_eq!(bitmap.pixel(9, 1), Some(BinaryColor::On));
        assert_eq!(bitmap.pixel(8, 1), Some(BinaryColor::Off));
        assert_eq!(bitmap.pixel(10, 1), None);
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(Bitmap::from_bytes(16, 2, vec![0xFF; 4]).is_ok());
        assert_eq!(
            Bitmap::from_bytes(16, 2, vec![0xFF; 3]),
            Err(BitmapSizeError {
                width: 16,
                height: 2,
                required: 4,
                provided: 3
            })
        );
    }

    #[test]
    fn draws_with_embedded_graphics() {
        let mut bitmap = Bitmap::new(WIDTH, HEIGHT);
        assert_eq!(bitmap.size(), Size::new(800, 480));

        Rectangle::new(Point::new(8, 0), Size::new(8, 2))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut bitmap)
            .unwrap();
        // off-panel pixels are dropped
        Pixel(Point::new(-1, 5), BinaryColor::On)
            .draw(&mut bitmap)
            .unwrap();
        Pixel(Point::new(800, 0), BinaryColor::On)
            .draw(&mut bitmap)
            .unwrap();

        assert_eq!(bitmap.data()[0], 0xFF);
        assert_eq!(bitmap.data()[1], 0x00);
        assert_eq!(bitmap.data()[101], 0x00);
        assert_eq!(black_pixels(&pack_image(&bitmap).data), 16);
    }
}
