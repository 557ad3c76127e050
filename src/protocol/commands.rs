//! # ESC/POS Control Commands
//!
//! Initialization, paper feed, line spacing and cutter commands for
//! ESC/POS thermal receipt printers.
//!
//! ## Escape Sequence Structure
//!
//! Commands are byte sequences starting with an escape prefix:
//! - Two bytes: `ESC @`, `ESC 2`
//! - Multi-byte with parameters: `ESC d n`, `GS V m n`
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`.
//!
//! ## Reference
//!
//! Based on the Epson "ESC/POS Application Programming Guide".

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte (0x1B)
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix (0x1D)
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line (0x0A)
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state. Sent at the start of
/// each print job so formatting from a previous job cannot leak in.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ## Example
///
/// ```
/// use papershot::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints any data in the line buffer and feeds `n` lines at the current
/// line spacing.
///
/// | Format  | Bytes   |
/// |---------|---------|
/// | ASCII   | ESC d n |
/// | Hex     | 1B 64 n |
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

/// # Set Line Spacing (ESC 3 n)
///
/// Sets the line spacing to `n` vertical motion units (dots on most
/// models). Bit-image stripes set this to the stripe dot height so each
/// `LF` advances exactly one stripe with no gap between strips.
#[inline]
pub fn line_spacing(n: u8) -> Vec<u8> {
    vec![ESC, b'3', n]
}

/// # Reset Line Spacing to Default (ESC 2)
///
/// Restores the power-on default line spacing (~1/6 inch). Sent after
/// bit-image output so trailing text prints normally.
#[inline]
pub fn line_spacing_default() -> Vec<u8> {
    vec![ESC, b'2']
}

// ============================================================================
// CUTTER CONTROL
// ============================================================================

/// # Cut Paper at Current Position (GS V m)
///
/// | Format  | Bytes  | m |
/// |---------|--------|---|
/// | Full    | 1D 56 00 | 0 |
/// | Partial | 1D 56 01 | 1 |
///
/// A partial cut leaves a small hinge so the receipt does not fall.
#[inline]
pub fn cut(partial: bool) -> Vec<u8> {
    vec![GS, b'V', if partial { 1 } else { 0 }]
}

/// # Feed, Then Cut (GS V m n)
///
/// Function B: feeds `n` vertical motion units past the last printed line,
/// then cuts. This is the usual end-of-receipt cut.
///
/// | Format  | Bytes    | m  |
/// |---------|----------|----|
/// | Full    | 1D 56 41 n | 65 |
/// | Partial | 1D 56 42 n | 66 |
#[inline]
pub fn cut_feed(partial: bool, n: u8) -> Vec<u8> {
    vec![GS, b'V', if partial { 66 } else { 65 }, n]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ## Example
///
/// ```
/// use papershot::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(512), [0x00, 0x02]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_feed_lines() {
        assert_eq!(feed_lines(0), vec![0x1B, 0x64, 0x00]);
        assert_eq!(feed_lines(3), vec![0x1B, 0x64, 0x03]);
        assert_eq!(feed_lines(255), vec![0x1B, 0x64, 0xFF]);
    }

    #[test]
    fn test_line_spacing() {
        assert_eq!(line_spacing(24), vec![0x1B, 0x33, 24]);
        assert_eq!(line_spacing(8), vec![0x1B, 0x33, 8]);
    }

    #[test]
    fn test_line_spacing_default() {
        assert_eq!(line_spacing_default(), vec![0x1B, 0x32]);
    }

    #[test]
    fn test_cut_full() {
        assert_eq!(cut(false), vec![0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_cut_partial() {
        assert_eq!(cut(true), vec![0x1D, 0x56, 0x01]);
    }

    #[test]
    fn test_cut_feed() {
        assert_eq!(cut_feed(false, 16), vec![0x1D, 0x56, 65, 16]);
        assert_eq!(cut_feed(true, 0), vec![0x1D, 0x56, 66, 0]);
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x0000), [0x00, 0x00]);
        assert_eq!(u16_le(0x00FF), [0xFF, 0x00]);
        assert_eq!(u16_le(0x1234), [0x34, 0x12]);
        assert_eq!(u16_le(512), [0x00, 0x02]);
    }
}
