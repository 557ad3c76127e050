//! # Papershot - Photo to Receipt Printer Pipeline
//!
//! Papershot turns raster photos into print jobs for ESC/POS thermal
//! receipt printers on a serial transport. It provides:
//!
//! - **Preprocessing**: deterministic photo → 1-bit bitmap conversion
//!   (resize, contrast stretch, Bayer dithering, midpoint threshold)
//! - **Strip chunking**: height-bounded strips so the printer's internal
//!   buffer is never overrun
//! - **Serial transport**: raw-mode tty with DSR hardware flow control
//!   and an explicit connection state machine
//! - **Triggers**: a watched directory and a still-capture subprocess
//!
//! ## Quick Start
//!
//! ```no_run
//! use papershot::config::Config;
//! use papershot::pipeline::Pipeline;
//!
//! # async fn print() -> Result<(), papershot::PapershotError> {
//! let config = Config::default();
//! let mut pipeline = Pipeline::with_serial(config);
//!
//! let job = pipeline.print("img/photo.jpg".as_ref()).await;
//! let job = job.into_result()?;
//! println!("printed {} strips", job.strips_sent);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | Preprocessing, strip splitting, job orchestration |
//! | [`transport`] | Serial backend, mock backend, connection FSM |
//! | [`protocol`] | ESC/POS command builders |
//! | [`render`] | Packed bitmaps and ordered dithering |
//! | [`watch`] | Directory watch trigger |
//! | [`camera`] | Still-capture subprocess trigger |
//! | [`printer`] | Hardware profiles |
//! | [`config`] | Configuration structures |
//! | [`error`] | Error types |

pub mod camera;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod transport;
pub mod watch;

// Re-exports for convenience
pub use config::Config;
pub use error::PapershotError;
pub use pipeline::Pipeline;
pub use printer::PrinterProfile;
