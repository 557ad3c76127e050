//! # Printer Transport Layer
//!
//! Communication backends for sending data to the printer, and the
//! connection state machine that drives them.
//!
//! ## Available Transports
//!
//! - [`serial`]: blocking Unix tty backend (RS-232 / USB-serial)
//! - [`mock`]: scriptable in-memory backend for tests and `--dry-run`
//!
//! The [`device::DeviceAdapter`] owns whichever backend is in use and is
//! the only type the print pipeline talks to.

use std::path::PathBuf;

use crate::error::PapershotError;

pub mod device;
pub mod mock;
pub mod serial;

pub use device::{ConnectionState, DeviceAdapter};
pub use mock::MockTransport;
pub use serial::SerialPort;

/// The seam between the connection state machine and a physical (or fake)
/// byte stream.
///
/// All methods are blocking; [`device::DeviceAdapter`] ships them to the
/// runtime's blocking pool and awaits them, so callers never block the
/// cooperative thread.
pub trait Transport: Send {
    /// Write every byte, chunking internally if the backend needs it.
    fn write_all(&mut self, data: &[u8]) -> Result<(), PapershotError>;

    /// Block until previously written bytes have physically left the
    /// driver (tcdrain on a tty).
    fn drain(&mut self) -> Result<(), PapershotError>;

    /// Discard anything still sitting in driver queues.
    fn flush(&mut self) -> Result<(), PapershotError>;

    /// Sample the hardware ready line (DSR).
    ///
    /// Returns `Ok(Some(asserted))` when the backend has a modem status
    /// line, and `Ok(None)` when it has none — the caller then falls back
    /// to a fixed wait.
    fn ready_line(&mut self) -> Result<Option<bool>, PapershotError>;
}

/// Scan `/dev` for serial devices a printer is likely to sit behind.
///
/// Matches `ttyUSB*`, `ttyACM*` and `rfcomm*`. Returns an empty list on
/// platforms without `/dev` or when the scan fails.
pub fn list_ports() -> Vec<PathBuf> {
    let mut ports = Vec::new();
    if let Ok(entries) = std::fs::read_dir("/dev") {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("ttyUSB")
                || name.starts_with("ttyACM")
                || name.starts_with("rfcomm")
            {
                ports.push(entry.path());
            }
        }
    }
    ports.sort();
    ports
}
