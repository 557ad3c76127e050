//! # Serial TTY Transport
//!
//! Blocking Unix serial backend for receipt printers on RS-232 or
//! USB-serial bridges.
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary raster data passes through
//! unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, etc. disabled
//! - **No output processing**: OPOST disabled (no CR/LF translation)
//! - **8-N-1**: CS8, no parity, one stop bit (per the serial config)
//! - **No echo or canonical mode**
//! - **No XON/XOFF**: 0x11/0x13 appear freely in bit-image data; flow
//!   control is hardware-side via the DSR line instead
//!
//! ## Flow Control
//!
//! The printer raises DSR when its internal buffer can accept more bytes.
//! [`SerialPort::ready_line`] samples it with `TIOCMGET`; ttys without
//! modem lines (rfcomm, pty) report `None` and the caller falls back to a
//! fixed wait.
//!
//! ## Chunked Writes
//!
//! Large blocks are written in 4096-byte chunks with a small delay so the
//! OS driver queue never runs far ahead of the wire.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::config::SerialConfig;
use crate::error::PapershotError;

use super::Transport;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Serial Printer Transport
///
/// Owns the open tty. Construct with [`SerialPort::open`]; dropping the
/// value closes the descriptor (and releases the `TIOCEXCL` lock).
#[derive(Debug)]
pub struct SerialPort {
    file: File,
    chunk_size: usize,
    chunk_delay: Duration,
}

impl SerialPort {
    /// Open and configure the serial device named by `config`.
    ///
    /// ## Errors
    ///
    /// Returns a `Transport` error if the device doesn't exist, permission
    /// is denied (dialout group), or tty configuration fails, and a
    /// `Config` error for unsupported baud rates.
    pub fn open(config: &SerialConfig) -> Result<Self, PapershotError> {
        let file = open_tty(&config.path)?;
        configure_tty(&file, config)?;
        Ok(Self {
            file,
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
        })
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Set the delay between chunks. Default is 2ms.
    pub fn set_chunk_delay(&mut self, delay: Duration) {
        self.chunk_delay = delay;
    }
}

impl Transport for SerialPort {
    fn write_all(&mut self, data: &[u8]) -> Result<(), PapershotError> {
        if data.len() <= self.chunk_size {
            self.file
                .write_all(data)
                .map_err(|e| PapershotError::Transport(format!("Write failed: {}", e)))?;
        } else {
            for chunk in data.chunks(self.chunk_size) {
                self.file
                    .write_all(chunk)
                    .map_err(|e| PapershotError::Transport(format!("Write failed: {}", e)))?;
                if !self.chunk_delay.is_zero() {
                    thread::sleep(self.chunk_delay);
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Result<(), PapershotError> {
        tty_drain(&self.file)
    }

    fn flush(&mut self) -> Result<(), PapershotError> {
        tty_flush(&self.file)
    }

    fn ready_line(&mut self) -> Result<Option<bool>, PapershotError> {
        tty_dsr(&self.file)
    }
}

// ============================================================================
// TTY SYSCALL HELPERS
// ============================================================================

#[cfg(unix)]
fn open_tty(path: &Path) -> Result<File, PapershotError> {
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
        .map_err(|e| PapershotError::Transport(format!("Failed to open {}: {}", path.display(), e)))
}

/// Configure the descriptor for raw binary communication at the requested
/// line settings.
#[cfg(unix)]
fn configure_tty(file: &File, config: &SerialConfig) -> Result<(), PapershotError> {
    use std::io;
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    use crate::config::Parity;

    let fd = file.as_raw_fd();

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(PapershotError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    // Input flags: disable all processing. IXON/IXOFF/IXANY disable
    // software flow control; 0x11/0x13 occur in raster data.
    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    // Output flags: disable post-processing
    termios.c_oflag &= !libc::OPOST;

    // Local flags: disable echo, canonical mode, signals
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    // Control flags: character size
    termios.c_cflag &= !libc::CSIZE;
    termios.c_cflag |= match config.data_bits {
        5 => libc::CS5,
        6 => libc::CS6,
        7 => libc::CS7,
        8 => libc::CS8,
        other => {
            return Err(PapershotError::Config(format!(
                "Unsupported data bits: {}",
                other
            )));
        }
    };

    // Parity
    match config.parity {
        Parity::None => termios.c_cflag &= !(libc::PARENB | libc::PARODD),
        Parity::Even => {
            termios.c_cflag |= libc::PARENB;
            termios.c_cflag &= !libc::PARODD;
        }
        Parity::Odd => termios.c_cflag |= libc::PARENB | libc::PARODD,
    }

    // One stop bit; ignore modem control for open, enable receiver
    termios.c_cflag &= !libc::CSTOPB;
    termios.c_cflag |= libc::CLOCAL | libc::CREAD;

    // Baud rate
    let speed = baud_constant(config.baud_rate).ok_or_else(|| {
        PapershotError::Config(format!("Unsupported baud rate: {}", config.baud_rate))
    })?;
    unsafe {
        libc::cfsetispeed(&mut termios, speed);
        libc::cfsetospeed(&mut termios, speed);
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(PapershotError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    if config.exclusive {
        let result = unsafe { libc::ioctl(fd, libc::TIOCEXCL) };
        if result != 0 {
            return Err(PapershotError::Transport(format!(
                "TIOCEXCL failed: {}",
                io::Error::last_os_error()
            )));
        }
    }

    Ok(())
}

/// Map a numeric baud rate to its termios speed constant.
#[cfg(unix)]
fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    match baud {
        9600 => Some(libc::B9600),
        19200 => Some(libc::B19200),
        38400 => Some(libc::B38400),
        57600 => Some(libc::B57600),
        115_200 => Some(libc::B115200),
        230_400 => Some(libc::B230400),
        _ => None,
    }
}

/// Block until queued output has been physically transmitted.
#[cfg(unix)]
fn tty_drain(file: &File) -> Result<(), PapershotError> {
    use std::io;
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::tcdrain(file.as_raw_fd()) };
    if result != 0 {
        return Err(PapershotError::Transport(format!(
            "tcdrain failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

/// Discard anything still sitting in the driver queues.
#[cfg(unix)]
fn tty_flush(file: &File) -> Result<(), PapershotError> {
    use std::io;
    use std::os::unix::io::AsRawFd;

    let result = unsafe { libc::tcflush(file.as_raw_fd(), libc::TCIOFLUSH) };
    if result != 0 {
        return Err(PapershotError::Transport(format!(
            "tcflush failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

/// Sample the DSR modem line. `Ok(None)` when the tty has no modem lines
/// (rfcomm and pseudo-terminals answer `TIOCMGET` with ENOTTY/EINVAL).
#[cfg(unix)]
fn tty_dsr(file: &File) -> Result<Option<bool>, PapershotError> {
    use std::io;
    use std::os::unix::io::AsRawFd;

    let mut bits: libc::c_int = 0;
    let result = unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCMGET, &mut bits) };
    if result != 0 {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(libc::ENOTTY) | Some(libc::EINVAL) => Ok(None),
            _ => Err(PapershotError::Transport(format!(
                "TIOCMGET failed: {}",
                err
            ))),
        };
    }
    Ok(Some(bits & libc::TIOCM_DSR != 0))
}

#[cfg(not(unix))]
fn open_tty(_path: &Path) -> Result<File, PapershotError> {
    Err(PapershotError::Transport(
        "Serial transport is only supported on Unix".to_string(),
    ))
}

#[cfg(not(unix))]
fn configure_tty(_file: &File, _config: &SerialConfig) -> Result<(), PapershotError> {
    Ok(())
}

#[cfg(not(unix))]
fn tty_drain(_file: &File) -> Result<(), PapershotError> {
    Ok(())
}

#[cfg(not(unix))]
fn tty_flush(_file: &File) -> Result<(), PapershotError> {
    Ok(())
}

#[cfg(not(unix))]
fn tty_dsr(_file: &File) -> Result<Option<bool>, PapershotError> {
    Ok(None)
}

// ============================================================================
// TESTS
// ============================================================================
