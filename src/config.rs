//! # Configuration
//!
//! Explicit configuration structures for the whole pipeline. Everything
//! that was once a hard-coded constant (port path, spool location, watch
//! directory, capture command line) lives here so multiple isolated
//! instances can coexist and tests need no environment coupling.
//!
//! Configuration loads from a JSON file; every field has a default, so a
//! partial file (or none at all) is fine:
//!
//! ```json
//! {
//!   "serial": { "path": "/dev/ttyUSB0", "baud_rate": 115200 },
//!   "print": { "strip_rows": 24, "caption": "Fagdagen 25.10.2025" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PapershotError;
use crate::printer::PrinterProfile;
use crate::protocol::graphics::Density;

/// Top-level configuration passed into the pipeline at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub print: PrintConfig,
    pub watch: WatchConfig,
    pub camera: CameraConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PapershotError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            PapershotError::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            PapershotError::Config(format!(
                "Failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// Serial parity setting. The printers this targets all run 8-N-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Serial transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub path: PathBuf,

    /// Baud rate (115200 for the usual USB-serial printer bridges)
    pub baud_rate: u32,

    /// Data bits (8)
    pub data_bits: u8,

    /// Parity (none)
    pub parity: Parity,

    /// Take an exclusive lock on the tty (`TIOCEXCL`)
    pub exclusive: bool,

    /// Open the device when the pipeline starts rather than at first job
    pub auto_open: bool,

    /// Delay between flush completion and the final close, giving the
    /// printer time to finish processing buffered bytes
    pub close_delay_ms: u64,

    /// DSR poll interval; also the fixed fallback wait when the transport
    /// exposes no DSR line
    pub poll_interval_ms: u64,

    /// Optional bound on DSR polling. `None` (the default) polls
    /// indefinitely.
    pub ready_timeout_ms: Option<u64>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::None,
            exclusive: true,
            auto_open: true,
            close_delay_ms: 0,
            poll_interval_ms: 100,
            ready_timeout_ms: None,
        }
    }
}

/// Print job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Directory for the spooled bitmap and strip artifacts
    pub spool_dir: PathBuf,

    /// Target width in dots; photos are resized to this
    pub width_dots: u16,

    /// Maximum strip height in rows
    pub strip_rows: u32,

    /// Bit-image density mode
    pub density: Density,

    /// Transmit the whole image in one write instead of strips
    pub whole_image: bool,

    /// Optional caption printed under the photo
    pub caption: Option<String>,

    /// Caption size multipliers (width, height)
    pub caption_size: (u8, u8),

    /// Lines to feed after the photo (and caption)
    pub feed_lines: u8,

    /// Partial cut instead of full cut
    pub cut_partial: bool,

    /// Feed distance before the cut, in vertical motion units
    pub cut_feed: u8,
}

impl Default for PrintConfig {
    fn default() -> Self {
        let profile = PrinterProfile::GENERIC_80MM;
        Self {
            spool_dir: PathBuf::from("dist"),
            width_dots: profile.width_dots,
            strip_rows: profile.strip_rows as u32,
            density: Density::D24,
            whole_image: false,
            caption: None,
            caption_size: (1, 1),
            feed_lines: 3,
            cut_partial: false,
            cut_feed: 16,
        }
    }
}

/// Watched-directory trigger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory to watch for new photos (non-recursive)
    pub dir: PathBuf,

    /// Interval between file-size checks while waiting for a writer to
    /// finish
    pub poll_ms: u64,

    /// How long the size must stay unchanged before the file counts as
    /// fully written
    pub stability_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("img"),
            poll_ms: 100,
            stability_ms: 2000,
        }
    }
}

/// Still-capture subprocess configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture utility to invoke
    pub command: String,

    /// Output path the utility writes to; fed to the pipeline afterwards
    pub output: PathBuf,

    /// Capture timeout handed to the utility (`-t`), milliseconds
    pub timeout_ms: u64,

    /// Mirror horizontally
    pub hflip: bool,

    /// Rotation in degrees
    pub rotation: u32,

    /// Exposure compensation
    pub ev: i32,

    /// Brightness adjustment (-1.0 to 1.0)
    pub brightness: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            command: String::from("rpicam-jpeg"),
            output: PathBuf::from("img/capture.jpg"),
            timeout_ms: 3000,
            hflip: true,
            rotation: 180,
            ev: 9,
            brightness: 0.5,
        }
    }
}
