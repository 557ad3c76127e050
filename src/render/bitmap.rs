//! # Packed Monochrome Bitmap
//!
//! The in-memory representation of a processed photo: one bit per pixel,
//! row-major, at the printer's dot width.
//!
//! ## Bit Packing
//!
//! - Bit 7 (MSB) = leftmost pixel of the byte
//! - Bit 0 (LSB) = rightmost pixel
//! - 1 = black (print dot), 0 = white (no dot)
//! - Rows are padded to whole bytes: stride = `ceil(width / 8)`
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```
//!
//! ## Spool Format
//!
//! Bitmaps round-trip through 8-bit grayscale PNGs containing only
//! 0x00/0xFF pixels. The spooled file is the on-disk artifact whose
//! lifetime the print job manages.

use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::PapershotError;

/// A packed 1-bit-per-pixel bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoBitmap {
    width: u32,
    height: u32,
    rows: Vec<u8>,
}

impl MonoBitmap {
    /// Create an all-white bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = (width as usize).div_ceil(8);
        Self {
            width,
            height,
            rows: vec![0u8; stride * height as usize],
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row (`ceil(width / 8)`).
    #[inline]
    pub fn stride(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Packed pixel data, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.rows
    }

    /// Set a pixel. `black = true` prints a dot.
    ///
    /// Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.stride() + x as usize / 8;
        let bit = 7 - (x % 8);
        if black {
            self.rows[idx] |= 1 << bit;
        } else {
            self.rows[idx] &= !(1 << bit);
        }
    }

    /// Read a pixel. Returns `true` for black.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.stride() + x as usize / 8;
        let bit = 7 - (x % 8);
        (self.rows[idx] >> bit) & 1 == 1
    }

    /// Extract a horizontal band of `height` rows starting at row `top`.
    ///
    /// The band is clamped to the bitmap; requesting rows past the bottom
    /// returns fewer rows than asked for.
    pub fn crop_rows(&self, top: u32, height: u32) -> MonoBitmap {
        let top = top.min(self.height);
        let height = height.min(self.height - top);
        let stride = self.stride();
        let start = top as usize * stride;
        let end = (top + height) as usize * stride;
        MonoBitmap {
            width: self.width,
            height,
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Convert to an 8-bit grayscale image (0x00 = black, 0xFF = white).
    pub fn to_gray(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = if self.get(x, y) { 0u8 } else { 255u8 };
                img.put_pixel(x, y, Luma([v]));
            }
        }
        img
    }

    /// Build from a grayscale image: pixels below `threshold` become black.
    pub fn from_gray(img: &GrayImage, threshold: u8) -> MonoBitmap {
        let mut bitmap = MonoBitmap::new(img.width(), img.height());
        for (x, y, pixel) in img.enumerate_pixels() {
            bitmap.set(x, y, pixel[0] < threshold);
        }
        bitmap
    }

    /// Spool the bitmap as a grayscale PNG.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), PapershotError> {
        self.to_gray().save(path.as_ref()).map_err(|e| {
            PapershotError::Encode(format!(
                "Failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Load a spooled PNG back into a bitmap (midpoint threshold).
    pub fn load_png<P: AsRef<Path>>(path: P) -> Result<MonoBitmap, PapershotError> {
        let img = image::open(path.as_ref()).map_err(|e| {
            PapershotError::Decode(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(MonoBitmap::from_gray(&img.to_luma8(), 128))
    }
}
