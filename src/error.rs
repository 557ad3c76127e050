//! # Error Types
//!
//! This module defines error types used throughout the papershot library.
//!
//! ## Propagation Policy
//!
//! - Decode/encode/split errors abort the active job before any device
//!   interaction. No retries.
//! - Transport errors fail the active job; the device handle is discarded
//!   and later writes become tolerated no-ops.
//! - Cleanup (spool deletion) failures are logged warnings, never fatal.

use thiserror::Error;

/// Main error type for papershot operations
#[derive(Debug, Error)]
pub enum PapershotError {
    /// The source image could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The processed bitmap could not be written to the spool
    #[error("Encode error: {0}")]
    Encode(String),

    /// The bitmap has a degenerate dimension and cannot be split
    #[error("Empty bitmap: {width}x{height}")]
    EmptyBitmap { width: u32, height: u32 },

    /// Splitting produced no strips
    #[error("No strips were produced")]
    NoStrips,

    /// Transport-level errors (serial open, write, drain, flush)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Still-capture subprocess failure
    #[error("Capture error: {0}")]
    Capture(String),

    /// Filesystem watch failure
    #[error("Watch error: {0}")]
    Watch(String),

    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
