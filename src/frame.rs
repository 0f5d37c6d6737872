//! Image preparation: load, fit, threshold and caption a picture for the panel
//!
//! The picture is centered on a black 800x480 canvas. Pixels darker than the
//! threshold become black, the rest white. With dithering on, the picture is
//! error-diffused to 0/255 first, so any threshold in 1..=255 keeps it as is.

use std::path::Path;

use embedded_graphics::{
    mono_font::{iso_8859_15::FONT_10X20, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::{
    imageops::{self, BiLevel, FilterType},
    GrayImage, ImageResult,
};

use crate::epd7in5::{Bitmap, HEIGHT, WIDTH};

/// How the picture is scaled to the square `image_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fit {
    /// Resize to exactly `image_size` x `image_size`, ignoring aspect ratio
    #[default]
    Stretch,
    /// Keep the aspect ratio and pad with black, see [`resize_with_padding`]
    Pad,
}

/// Layout of the composed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    /// Side of the square the picture is fitted into
    pub image_size: u32,
    /// Scaling mode
    pub fit: Fit,
    /// Luma below this is black
    pub threshold: u8,
    /// Error-diffuse before thresholding, so only pure black and white remain
    pub dither: bool,
    /// White text drawn centered near the top
    pub caption: Option<String>,
    /// Top edge of the caption in pixels
    pub caption_top: i32,
}

impl Default for Composition {
    fn default() -> Self {
        Composition {
            image_size: 360,
            fit: Fit::Stretch,
            threshold: 128,
            dither: false,
            caption: None,
            caption_top: 20,
        }
    }
}

/// Decode a PNG, JPEG or BMP file into 8-bit luma
pub fn open_grayscale<P: AsRef<Path>>(path: P) -> ImageResult<GrayImage> {
    Ok(image::open(path)?.to_luma8())
}

/// Fit into a black `max_size` square, keeping the aspect ratio
///
/// Pictures smaller than `max_size` in both directions are only centered.
/// Larger ones are scaled down by `min(max_size / w, max_size / h)` first.
pub fn resize_with_padding(img: &GrayImage, max_size: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut canvas = GrayImage::new(max_size, max_size);
    if max_size == 0 || width == 0 || height == 0 {
        return canvas;
    }

    let scaled;
    let top = if width < max_size && height < max_size {
        img
    } else {
        let scale = f64::min(
            f64::from(max_size) / f64::from(width),
            f64::from(max_size) / f64::from(height),
        );
        let new_width = ((f64::from(width) * scale) as u32).max(1);
        let new_height = ((f64::from(height) * scale) as u32).max(1);
        scaled = imageops::resize(img, new_width, new_height, FilterType::Lanczos3);
        &scaled
    };

    let left = (max_size - top.width()) / 2;
    let upper = (max_size - top.height()) / 2;
    imageops::overlay(&mut canvas, top, i64::from(left), i64::from(upper));
    canvas
}

/// Resize to a `size` square, ignoring aspect ratio
pub fn stretch(img: &GrayImage, size: u32) -> GrayImage {
    if size == 0 || img.width() == 0 || img.height() == 0 {
        return GrayImage::new(size, size);
    }
    imageops::resize(img, size, size, FilterType::Lanczos3)
}

/// Floyd-Steinberg dither to pure black and white
pub fn dither(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    imageops::dither(&mut out, &BiLevel);
    out
}

/// Build the panel frame from a picture
pub fn compose(img: &GrayImage, layout: &Composition) -> Bitmap {
    let mut fitted = match layout.fit {
        Fit::Stretch => stretch(img, layout.image_size),
        Fit::Pad => resize_with_padding(img, layout.image_size),
    };
    if layout.dither {
        fitted = dither(&fitted);
    }
    log::debug!(
        "fitted {}x{} picture into {}x{}",
        img.width(),
        img.height(),
        fitted.width(),
        fitted.height()
    );

    let mut canvas = Bitmap::filled(WIDTH, HEIGHT, BinaryColor::On);

    let x_offset = (i64::from(WIDTH) - i64::from(fitted.width())) / 2;
    let y_offset = (i64::from(HEIGHT) - i64::from(fitted.height())) / 2;
    for (x, y, luma) in fitted.enumerate_pixels() {
        let (Ok(cx), Ok(cy)) = (
            u32::try_from(i64::from(x) + x_offset),
            u32::try_from(i64::from(y) + y_offset),
        ) else {
            continue;
        };
        let color = if luma[0] < layout.threshold {
            BinaryColor::On
        } else {
            BinaryColor::Off
        };
        canvas.set_pixel(cx, cy, color);
    }

    if let Some(caption) = &layout.caption {
        let character_style = MonoTextStyle::new(&FONT_10X20, BinaryColor::Off);
        let text_style = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Top)
            .build();
        let anchor = Point::new(WIDTH as i32 / 2, layout.caption_top);
        Text::with_text_style(caption, anchor, character_style, text_style)
            .draw(&mut canvas)
            .unwrap_or_else(|never| match never {});
    }

    canvas
}
