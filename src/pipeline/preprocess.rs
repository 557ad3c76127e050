//! # Image Preprocessing
//!
//! Turns an arbitrary raster photo into a printable monochrome bitmap.
//!
//! ## Processing Stages
//!
//! The stages run in a fixed, non-reorderable order:
//!
//! 1. **Resize** to the printer's dot width, preserving aspect ratio
//!    (Lanczos3 for print quality)
//! 2. **Normalize** intensity: linear contrast stretch anchored at the
//!    1st/99th luminance percentiles, so under- and over-exposed captures
//!    use the full range
//! 3. **Greyscale** conversion
//! 4. **Ordered dithering** against a 2-level palette (Bayer 8x8)
//! 5. **Hard threshold** at the midpoint (128)
//!
//! Dither-then-threshold is deliberate: the dithering stage distributes
//! quantization error for better perceived quality on a 1-bit device
//! before the final hard cut.
//!
//! ## Spooling
//!
//! The bitmap is persisted to `<spool_dir>/job-<id>.png` for the load and
//! strip stages; the file is deleted when the owning job completes or
//! fails.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use uuid::Uuid;

use crate::config::PrintConfig;
use crate::error::PapershotError;
use crate::render::{dither, MonoBitmap};

/// Percentile anchors for the contrast stretch.
const STRETCH_LOW: f32 = 0.01;
const STRETCH_HIGH: f32 = 0.99;

/// Output of preprocessing: the bitmap plus its spooled artifact.
#[derive(Debug)]
pub struct Processed {
    pub bitmap: MonoBitmap,
    pub path: PathBuf,
}

/// Converts source photos to spooled monochrome bitmaps.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    width: u32,
    spool_dir: PathBuf,
}

impl Preprocessor {
    pub fn new(print: &PrintConfig) -> Self {
        Self {
            width: print.width_dots as u32,
            spool_dir: print.spool_dir.clone(),
        }
    }

    /// Process `source` into the spooled bitmap for job `job_id`.
    ///
    /// ## Errors
    ///
    /// `Decode` when the source cannot be read or decoded, `Encode` when
    /// the spooled PNG cannot be written.
    pub fn process(&self, source: &Path, job_id: Uuid) -> Result<Processed, PapershotError> {
        let image = decode(source)?;
        let bitmap = self.to_bitmap(&image);

        fs::create_dir_all(&self.spool_dir).map_err(|e| {
            PapershotError::Encode(format!(
                "Failed to create spool dir {}: {}",
                self.spool_dir.display(),
                e
            ))
        })?;
        let path = self.spool_dir.join(format!("job-{}.png", job_id));
        bitmap.save_png(&path)?;
        log::debug!(
            "spooled {}x{} bitmap to {}",
            bitmap.width(),
            bitmap.height(),
            path.display()
        );

        Ok(Processed { bitmap, path })
    }

    /// Run the resize/normalize/greyscale/dither/threshold chain.
    fn to_bitmap(&self, image: &DynamicImage) -> MonoBitmap {
        // Resize to printer width, preserving aspect ratio
        let aspect = image.height() as f32 / image.width() as f32;
        let target_height = ((self.width as f32 * aspect).round() as u32).max(1);
        let resized = image.resize_exact(self.width, target_height, FilterType::Lanczos3);

        // Normalize, then collapse to greyscale
        let gray = normalize(&resized).to_luma8();

        // Dither to the 2-level palette, then binarize at the midpoint
        let mut bitmap = MonoBitmap::new(gray.width(), gray.height());
        for (x, y, pixel) in gray.enumerate_pixels() {
            let quantized = dither::quantize(x as usize, y as usize, pixel[0]);
            bitmap.set(x, y, quantized < 128);
        }
        bitmap
    }
}

/// Decode a source image file.
fn decode(source: &Path) -> Result<DynamicImage, PapershotError> {
    #[cfg(feature = "heif")]
    {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        if matches!(ext.as_deref(), Some("heic") | Some("heif")) {
            let data = fs::read(source).map_err(|e| {
                PapershotError::Decode(format!("Failed to read {}: {}", source.display(), e))
            })?;
            return decode_heic(&data).map_err(PapershotError::Decode);
        }
    }

    image::open(source)
        .map_err(|e| PapershotError::Decode(format!("Failed to decode {}: {}", source.display(), e)))
}

/// Decode a HEIC/HEIF image using libheif.
#[cfg(feature = "heif")]
fn decode_heic(data: &[u8]) -> Result<DynamicImage, String> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx =
        HeifContext::read_from_bytes(data).map_err(|e| format!("Failed to read HEIC: {}", e))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| format!("Failed to get primary image: {}", e))?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| format!("Failed to decode HEIC image: {}", e))?;

    let planes = decoded.planes();
    let interleaved = planes.interleaved.ok_or("No interleaved RGB data in HEIC")?;
    let (width, height) = (decoded.width(), decoded.height());
    let stride = interleaved.stride;

    let mut rgb = image::RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let offset = y as usize * stride + x as usize * 3;
            if offset + 2 < interleaved.data.len() {
                rgb.put_pixel(
                    x,
                    y,
                    image::Rgb([
                        interleaved.data[offset],
                        interleaved.data[offset + 1],
                        interleaved.data[offset + 2],
                    ]),
                );
            }
        }
    }
    Ok(DynamicImage::ImageRgb8(rgb))
}

/// Percentile contrast stretch.
///
/// Bounds come from the luminance histogram; the same linear map is then
/// applied to every channel so the stretch does not shift hue before the
/// greyscale conversion.
fn normalize(image: &DynamicImage) -> DynamicImage {
    let luma = image.to_luma8();
    let (low, high) = percentile_bounds(&luma);
    if high <= low {
        // Flat image: nothing to stretch
        return image.clone();
    }

    let scale = 255.0 / (high - low) as f32;
    let mut rgb = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let stretched = (*channel as f32 - low as f32) * scale;
            *channel = stretched.clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

/// Find the 1st and 99th percentile luminance values.
fn percentile_bounds(luma: &GrayImage) -> (u8, u8) {
    let mut histogram = [0u32; 256];
    for Luma([v]) in luma.pixels() {
        histogram[*v as usize] += 1;
    }
    let total: u32 = histogram.iter().sum();
    if total == 0 {
        return (0, 255);
    }

    let low_target = (total as f32 * STRETCH_LOW) as u32;
    let high_target = (total as f32 * STRETCH_HIGH) as u32;

    let mut cumulative = 0u32;
    let mut low = 0u8;
    let mut high = 255u8;
    let mut low_found = false;
    for (value, &count) in histogram.iter().enumerate() {
        cumulative += count;
        if !low_found && cumulative > low_target {
            low = value as u8;
            low_found = true;
        }
        if cumulative >= high_target {
            high = value as u8;
            break;
        }
    }
    (low, high)
}

// ============================================================================
// TESTS
// ============================================================================
