//! # Bayer 8x8 Ordered Dithering
//!
//! Converts continuous-tone (grayscale) pixels to a two-level palette using
//! an ordered Bayer threshold matrix. This is the first of the two
//! quantization stages in the print pipeline: dithering distributes the
//! quantization error across neighboring pixels, and the hard midpoint
//! threshold afterwards makes the final black/white cut.
//!
//! ## Ordered Dithering
//!
//! For each pixel position (x, y):
//!
//! 1. Look up a cutoff from the matrix using (x mod 8, y mod 8)
//! 2. Compare the pixel's darkness to the cutoff
//! 3. Darker than the cutoff quantizes to black (0x00), else white (0xFF)
//!
//! ## Why Bayer?
//!
//! - **Deterministic**: the same input always produces the same output,
//!   which the rest of the pipeline (spooling, strip splitting) relies on
//! - **No error accumulation**: unlike Floyd-Steinberg, errors don't
//!   propagate between strips
//! - **Fast**: O(1) lookup per pixel
//!
//! ## Usage
//!
//! ```
//! use papershot::render::dither;
//!
//! // 50% gray at (0, 0) quantizes to black (matrix value 0 fires first)
//! assert_eq!(dither::quantize(0, 0, 128), 0x00);
//!
//! // Pure white never prints
//! assert_eq!(dither::quantize(0, 0, 255), 0xFF);
//! ```

/// Bayer 8x8 dithering matrix
///
/// Values range from 0-63 and form a dispersed-dot halftone screen:
/// low values activate first at low darkness, high values last.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Get the dithering cutoff for a pixel position, in luminance units.
///
/// Returns a value in (0, 255): `(matrix_value + 0.5) / 64 * 255`, scaled
/// so that pure black always quantizes to black and pure white always to
/// white regardless of position.
#[inline]
pub fn cutoff(x: usize, y: usize) -> f32 {
    let matrix_value = BAYER8[y & 7][x & 7];
    (matrix_value as f32 + 0.5) / 64.0 * 255.0
}

/// Quantize one grayscale pixel to the 2-level palette.
///
/// ## Parameters
///
/// - `x`, `y`: pixel position (the matrix tiles every 8 pixels)
/// - `luma`: grayscale value, 0 = black, 255 = white
///
/// ## Returns
///
/// `0x00` (black) or `0xFF` (white) — never an intermediate gray.
#[inline]
pub fn quantize(x: usize, y: usize, luma: u8) -> u8 {
    let darkness = 255.0 - luma as f32;
    if darkness > cutoff(x, y) { 0x00 } else { 0xFF }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bayer_matrix_values() {
        // Matrix contains all values 0-63 exactly once
        let mut seen = [false; 64];
        for row in &BAYER8 {
            for &val in row {
                assert!(val < 64, "Matrix value {} out of range", val);
                assert!(!seen[val as usize], "Duplicate value {}", val);
                seen[val as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "Not all values 0-63 present");
    }

    #[test]
    fn test_cutoff_range() {
        for y in 0..8 {
            for x in 0..8 {
                let c = cutoff(x, y);
                assert!(c > 0.0, "Cutoff at ({},{}) should be > 0", x, y);
                assert!(c < 255.0, "Cutoff at ({},{}) should be < 255", x, y);
            }
        }
    }

    #[test]
    fn test_cutoff_periodicity() {
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(cutoff(x, y), cutoff(x + 8, y));
                assert_eq!(cutoff(x, y), cutoff(x, y + 8));
                assert_eq!(cutoff(x, y), cutoff(x + 8, y + 8));
            }
        }
    }

    #[test]
    fn test_black_always_black() {
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(quantize(x, y, 0), 0x00);
            }
        }
    }

    #[test]
    fn test_white_always_white() {
        for y in 0..32 {
            for x in 0..32 {
                assert_eq!(quantize(x, y, 255), 0xFF);
            }
        }
    }

    #[test]
    fn test_two_level_output_only() {
        for y in 0..8 {
            for x in 0..8 {
                for luma in [0u8, 42, 127, 128, 200, 255] {
                    let q = quantize(x, y, luma);
                    assert!(q == 0x00 || q == 0xFF, "Got intermediate gray {}", q);
                }
            }
        }
    }

    #[test]
    fn test_gray_distribution() {
        // 50% gray should quantize roughly half of an 8x8 block to black
        let mut black = 0;
        for y in 0..8 {
            for x in 0..8 {
                if quantize(x, y, 128) == 0x00 {
                    black += 1;
                }
            }
        }
        assert!(
            (28..=36).contains(&black),
            "50% gray should produce ~32 black dots, got {}",
            black
        );
    }
}
