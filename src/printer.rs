//! # Printer Profiles
//!
//! Hardware characteristics of supported thermal printers.
//!
//! ## Supported Printers
//!
//! | Model | Width (dots) | Resolution | Strip height |
//! |-------|--------------|------------|--------------|
//! | Generic 80mm ESC/POS | 512 | 203 DPI | 24 rows |
//!
//! ## Usage
//!
//! ```
//! use papershot::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::GENERIC_80MM;
//! println!("Print width: {} dots ({} bytes)",
//!          profile.width_dots,
//!          profile.width_bytes);
//! ```

/// # Printer Profile
///
/// Defines the hardware characteristics of a thermal printer. The profile
/// seeds [`crate::config::PrintConfig`]'s defaults.
///
/// ## Physical Properties
///
/// - **width_dots**: Maximum printable width in dots (pixels)
/// - **width_bytes**: Width in bytes (width_dots / 8)
/// - **dpi**: Resolution in dots per inch
/// - **strip_rows**: Rows per transmitted strip; bounds how much of the
///   printer's internal buffer one write can occupy
#[derive(Debug, Clone, Copy)]
pub struct PrinterProfile {
    /// Printer model name
    pub name: &'static str,

    /// Maximum print width in dots (pixels)
    pub width_dots: u16,

    /// Print width in bytes (width_dots / 8)
    pub width_bytes: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Default strip height in rows for chunked transmission
    pub strip_rows: u16,
}

impl PrinterProfile {
    /// # Generic 80mm ESC/POS Profile
    ///
    /// Covers the common run of 80mm-paper serial receipt printers that
    /// accept 512-dot bit images (the `ESC *` 24-dot column format).
    ///
    /// | Property | Value |
    /// |----------|-------|
    /// | Print width | 512 dots (64 bytes) |
    /// | Resolution | 203 DPI |
    /// | Interface | Serial (RS-232/USB-serial) |
    /// | Strip height | 24 rows (one D24 stripe) |
    pub const GENERIC_80MM: Self = Self {
        name: "Generic 80mm ESC/POS",
        width_dots: 512,
        width_bytes: 64,
        dpi: 203,
        strip_rows: 24,
    };
}
