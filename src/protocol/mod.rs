//! # ESC/POS Protocol
//!
//! Command builders for ESC/POS thermal receipt printers. Every builder
//! returns the exact byte sequence to transmit; nothing here touches the
//! transport.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`commands`] | Init, feed, line spacing, cutter |
//! | [`text`] | Fonts, alignment, style, size |
//! | [`graphics`] | `ESC *` bit-image stripes |

pub mod commands;
pub mod graphics;
pub mod text;
