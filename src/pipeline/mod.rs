//! # Print Pipeline
//!
//! The photo-to-paper path: preprocessing, strip splitting, and the job
//! orchestrator that streams strips to the device.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`preprocess`] | Resize, normalize, dither, threshold, spool |
//! | [`strips`] | Height-bounded strip splitting |
//! | [`job`] | Job state machine and transmit loop |

pub mod job;
pub mod preprocess;
pub mod strips;

pub use job::{JobState, Pipeline, PrintJob};
pub use preprocess::Preprocessor;
pub use strips::Strip;
