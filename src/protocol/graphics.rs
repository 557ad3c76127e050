//! # ESC/POS Bit-Image Graphics
//!
//! Implements the `ESC *` bit-image command used to transmit photo strips.
//!
//! ## Density Modes
//!
//! | Mode | m | Vertical dots | Horizontal density |
//! |------|---|---------------|--------------------|
//! | S8   | 0 | 8  | single |
//! | D8   | 1 | 8  | double |
//! | S24  | 32 | 24 | single |
//! | D24  | 33 | 24 | double |
//!
//! D24 is the default: it matches the printer's 24-dot head pass, so each
//! stripe prints in one motion with no visible banding.
//!
//! ## Data Layout
//!
//! `ESC * m nL nH d1...dk` — unlike raster formats, bit-image data is
//! **column-major**: `nL + nH*256` columns, each column `vertical_dots/8`
//! bytes top-to-bottom, bit 7 of each byte being the topmost dot.
//!
//! ```text
//! Columns:   0        1        2      ...
//!          ┌────────┬────────┬────────┐
//!          │ d1     │ d4     │ d7     │  byte 0 = rows 0-7   (bit7 = row 0)
//!          │ d2     │ d5     │ d8     │  byte 1 = rows 8-15
//!          │ d3     │ d6     │ d9     │  byte 2 = rows 16-23
//!          └────────┴────────┴────────┘
//! ```
//!
//! ## Line Spacing
//!
//! A stripe is terminated by `LF`. [`bit_image`] sets the line spacing to
//! the stripe dot height first and restores the default afterwards, so
//! consecutive stripes butt up against each other exactly.

use serde::{Deserialize, Serialize};

use super::commands::{self, ESC, LF, u16_le};
use crate::render::MonoBitmap;

/// Bit-image density mode (the `m` parameter of `ESC *`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Density {
    S8,
    D8,
    S24,
    #[default]
    D24,
}

impl Density {
    /// The `m` byte for `ESC *`.
    #[inline]
    pub fn mode_byte(self) -> u8 {
        match self {
            Density::S8 => 0,
            Density::D8 => 1,
            Density::S24 => 32,
            Density::D24 => 33,
        }
    }

    /// Vertical dots per stripe (8 or 24).
    #[inline]
    pub fn dots_per_stripe(self) -> u32 {
        match self {
            Density::S8 | Density::D8 => 8,
            Density::S24 | Density::D24 => 24,
        }
    }
}

/// # One Bit-Image Stripe (ESC * m nL nH d1...dk)
///
/// Encodes up to `density.dots_per_stripe()` rows of the bitmap starting
/// at row `top` as one column-major stripe. Rows past the bitmap's bottom
/// edge pad with white.
///
/// The stripe is followed by `LF` to print it and advance the paper.
pub fn stripe(bitmap: &MonoBitmap, top: u32, density: Density) -> Vec<u8> {
    let dots = density.dots_per_stripe();
    let bytes_per_col = (dots / 8) as usize;
    let columns = bitmap.width() as u16;
    let [nl, nh] = u16_le(columns);

    let mut cmd = Vec::with_capacity(5 + columns as usize * bytes_per_col + 1);
    cmd.push(ESC);
    cmd.push(b'*');
    cmd.push(density.mode_byte());
    cmd.push(nl);
    cmd.push(nh);

    for x in 0..bitmap.width() {
        for byte in 0..bytes_per_col {
            let mut packed = 0u8;
            for bit in 0..8 {
                let y = top + (byte * 8 + bit) as u32;
                if y < top + dots && bitmap.get(x, y) {
                    packed |= 1 << (7 - bit);
                }
            }
            cmd.push(packed);
        }
    }

    cmd.push(LF);
    cmd
}

/// # Encode a Whole Bitmap as Bit-Image Stripes
///
/// Wraps the stripes in line-spacing control: spacing is set to the stripe
/// dot height up front and restored to the default afterwards.
///
/// ## Example
///
/// ```
/// use papershot::protocol::graphics::{self, Density};
/// use papershot::render::MonoBitmap;
///
/// let bitmap = MonoBitmap::new(512, 48);
/// let cmd = graphics::bit_image(&bitmap, Density::D24);
/// // ESC 3 24, two 24-row stripes, ESC 2
/// assert_eq!(&cmd[0..3], &[0x1B, 0x33, 24]);
/// assert!(cmd.ends_with(&[0x1B, 0x32]));
/// ```
pub fn bit_image(bitmap: &MonoBitmap, density: Density) -> Vec<u8> {
    let dots = density.dots_per_stripe();
    let mut cmd = commands::line_spacing(dots as u8);

    let mut top = 0;
    while top < bitmap.height() {
        cmd.extend(stripe(bitmap, top, density));
        top += dots;
    }

    cmd.extend(commands::line_spacing_default());
    cmd
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_mode_bytes() {
        assert_eq!(Density::S8.mode_byte(), 0);
        assert_eq!(Density::D8.mode_byte(), 1);
        assert_eq!(Density::S24.mode_byte(), 32);
        assert_eq!(Density::D24.mode_byte(), 33);
    }

    #[test]
    fn test_density_dots() {
        assert_eq!(Density::S8.dots_per_stripe(), 8);
        assert_eq!(Density::D24.dots_per_stripe(), 24);
    }

    #[test]
    fn test_density_default_is_d24() {
        assert_eq!(Density::default(), Density::D24);
    }

    #[test]
    fn test_stripe_header_d24() {
        let bitmap = MonoBitmap::new(512, 24);
        let cmd = stripe(&bitmap, 0, Density::D24);
        assert_eq!(cmd[0], 0x1B); // ESC
        assert_eq!(cmd[1], 0x2A); // '*'
        assert_eq!(cmd[2], 33); // m = D24
        assert_eq!(cmd[3], 0x00); // nL (512 = 0x0200)
        assert_eq!(cmd[4], 0x02); // nH
    }

    #[test]
    fn test_stripe_length() {
        let bitmap = MonoBitmap::new(100, 24);
        let cmd = stripe(&bitmap, 0, Density::D24);
        // 5 header + 100 columns * 3 bytes + LF
        assert_eq!(cmd.len(), 5 + 100 * 3 + 1);
        assert_eq!(*cmd.last().unwrap(), 0x0A);
    }

    #[test]
    fn test_stripe_length_8_dot() {
        let bitmap = MonoBitmap::new(100, 8);
        let cmd = stripe(&bitmap, 0, Density::D8);
        assert_eq!(cmd.len(), 5 + 100 + 1);
    }

    #[test]
    fn test_stripe_column_packing() {
        // Black dot at (0, 0) -> first column byte has bit 7 set
        let mut bitmap = MonoBitmap::new(8, 24);
        bitmap.set(0, 0, true);
        let cmd = stripe(&bitmap, 0, Density::D24);
        assert_eq!(cmd[5], 0x80); // column 0, byte 0 (rows 0-7)
        assert_eq!(cmd[6], 0x00);
        assert_eq!(cmd[7], 0x00);
    }

    #[test]
    fn test_stripe_bottom_row_of_column() {
        // Black dot at (0, 23) -> column byte 2, bit 0
        let mut bitmap = MonoBitmap::new(4, 24);
        bitmap.set(0, 23, true);
        let cmd = stripe(&bitmap, 0, Density::D24);
        assert_eq!(cmd[5], 0x00);
        assert_eq!(cmd[6], 0x00);
        assert_eq!(cmd[7], 0x01);
    }

    #[test]
    fn test_stripe_respects_top_offset() {
        let mut bitmap = MonoBitmap::new(4, 48);
        bitmap.set(0, 24, true);
        let cmd = stripe(&bitmap, 24, Density::D24);
        assert_eq!(cmd[5], 0x80); // row 24 is the top of this stripe
    }

    #[test]
    fn test_stripe_pads_past_bottom() {
        // 10-row bitmap in a 24-dot stripe: rows 10-23 are white padding
        let mut bitmap = MonoBitmap::new(4, 10);
        for y in 0..10 {
            bitmap.set(0, y, true);
        }
        let cmd = stripe(&bitmap, 0, Density::D24);
        assert_eq!(cmd[5], 0xFF); // rows 0-7 black
        assert_eq!(cmd[6], 0xC0); // rows 8-9 black, 10-15 padded white
        assert_eq!(cmd[7], 0x00); // rows 16-23 padded white
    }

    #[test]
    fn test_bit_image_spacing_wrapper() {
        let bitmap = MonoBitmap::new(16, 48);
        let cmd = bit_image(&bitmap, Density::D24);
        assert_eq!(&cmd[0..3], &[0x1B, 0x33, 24]);
        assert!(cmd.ends_with(&[0x1B, 0x32]));
    }

    #[test]
    fn test_bit_image_stripe_count() {
        let bitmap = MonoBitmap::new(16, 50);
        let cmd = bit_image(&bitmap, Density::D24);
        // 50 rows = 3 stripes (24 + 24 + 2) = 3 ESC * headers
        let headers = cmd.windows(3).filter(|w| *w == [0x1B, 0x2A, 33]).count();
        assert_eq!(headers, 3);
    }
}
