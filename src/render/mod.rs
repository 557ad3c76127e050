//! # Bitmap Rendering
//!
//! Monochrome bitmap representation and the ordered dithering used to
//! produce it.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bitmap`] | Packed 1-bpp bitmap with PNG spool round-trip |
//! | [`dither`] | Bayer 8x8 ordered dithering |

pub mod bitmap;
pub mod dither;

pub use bitmap::MonoBitmap;
