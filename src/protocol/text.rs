//! # ESC/POS Text Commands
//!
//! Font selection, alignment, style and character size commands, plus a
//! small builder for emitting one styled line (used for the caption the
//! job prints under each photo).
//!
//! ## Command Summary
//!
//! | Command | Bytes | Effect |
//! |---------|-------|--------|
//! | ESC a n | 1B 61 n | Alignment (0 left, 1 center, 2 right) |
//! | ESC M n | 1B 4D n | Font (0 = A 12x24, 1 = B 9x17) |
//! | ESC E n | 1B 45 n | Bold on/off |
//! | ESC - n | 1B 2D n | Underline off/1-dot/2-dot |
//! | GS ! n  | 1D 21 n | Character size multipliers |

use super::commands::{ESC, GS, LF};

/// Text alignment for subsequent lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// # Select Justification (ESC a n)
#[inline]
pub fn align(alignment: Alignment) -> Vec<u8> {
    let n = match alignment {
        Alignment::Left => 0,
        Alignment::Center => 1,
        Alignment::Right => 2,
    };
    vec![ESC, b'a', n]
}

/// Built-in character fonts.
///
/// Font A is the default 12x24 font; font B is the smaller 9x17 font the
/// original photo footer used for captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Font {
    #[default]
    A,
    B,
}

/// # Select Character Font (ESC M n)
#[inline]
pub fn font(f: Font) -> Vec<u8> {
    let n = match f {
        Font::A => 0,
        Font::B => 1,
    };
    vec![ESC, b'M', n]
}

/// # Bold On/Off (ESC E n)
#[inline]
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

/// # Underline On/Off (ESC - n)
///
/// `n = 1` selects 1-dot underline; `n = 0` turns it off.
#[inline]
pub fn underline(enabled: bool) -> Vec<u8> {
    vec![ESC, b'-', enabled as u8]
}

/// # Select Character Size (GS ! n)
///
/// Width multiplier in the high nibble, height multiplier in the low
/// nibble, both 1-8 (encoded as multiplier minus one).
///
/// ## Example
///
/// ```
/// use papershot::protocol::text;
///
/// // Normal size
/// assert_eq!(text::size(1, 1), vec![0x1D, 0x21, 0x00]);
/// // Double width and height
/// assert_eq!(text::size(2, 2), vec![0x1D, 0x21, 0x11]);
/// ```
#[inline]
pub fn size(width_mult: u8, height_mult: u8) -> Vec<u8> {
    let w = width_mult.clamp(1, 8) - 1;
    let h = height_mult.clamp(1, 8) - 1;
    vec![GS, b'!', (w << 4) | h]
}

/// # Styled Line Builder
///
/// Collects font/alignment/style/size settings and emits one text line
/// followed by the reset commands, so a caption cannot leak styling into
/// whatever prints next.
///
/// ## Example
///
/// ```
/// use papershot::protocol::text::{Alignment, Font, TextLine};
///
/// let bytes = TextLine::new("Fagdagen 25.10.2025")
///     .font(Font::B)
///     .align(Alignment::Center)
///     .build();
/// assert!(bytes.ends_with(&[0x1B, 0x61, 0x00])); // alignment reset last
/// ```
#[derive(Debug, Clone)]
pub struct TextLine {
    content: String,
    font: Font,
    align: Alignment,
    bold: bool,
    underline: bool,
    width_mult: u8,
    height_mult: u8,
}

impl TextLine {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            font: Font::A,
            align: Alignment::Left,
            bold: false,
            underline: false,
            width_mult: 1,
            height_mult: 1,
        }
    }

    pub fn font(mut self, f: Font) -> Self {
        self.font = f;
        self
    }

    pub fn align(mut self, a: Alignment) -> Self {
        self.align = a;
        self
    }

    pub fn bold(mut self, enabled: bool) -> Self {
        self.bold = enabled;
        self
    }

    pub fn underline(mut self, enabled: bool) -> Self {
        self.underline = enabled;
        self
    }

    pub fn size(mut self, width_mult: u8, height_mult: u8) -> Self {
        self.width_mult = width_mult;
        self.height_mult = height_mult;
        self
    }

    /// Emit the command sequence for this line.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(font(self.font));
        out.extend(align(self.align));
        out.extend(bold(self.bold));
        out.extend(underline(self.underline));
        out.extend(size(self.width_mult, self.height_mult));
        out.extend(self.content.as_bytes());
        out.push(LF);
        // Reset to defaults
        out.extend(size(1, 1));
        out.extend(bold(false));
        out.extend(underline(false));
        out.extend(font(Font::A));
        out.extend(align(Alignment::Left));
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================
