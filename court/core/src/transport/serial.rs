//! Serial Port Transport
//!
//! Drives a tty (Arduino-style USB CDC or FTDI adapter) in raw 8N1 mode.
//! The descriptor is opened non-blocking and registered with the tokio
//! reactor through [`AsyncFd`], so reads and writes never block the
//! single-threaded frame loop.
//!
//! # Hangup Detection
//!
//! A readable descriptor that yields zero bytes means the device went away
//! (unplugged, or rebooted into its bootloader). That is reported as
//! [`TransportError::Closed`].

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices,
};
use tokio::io::unix::AsyncFd;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::{Connector, LineBuffer, LineRead, Transport, TransportError};
use crate::config::SerialConfig;

/// How long DTR is held low to reset the microcontroller
const DTR_PULSE: Duration = Duration::from_millis(50);

/// Read chunk size
const READ_CHUNK: usize = 256;

/// Map a numeric baud rate onto its termios constant
fn baud_rate(baud: u32) -> Result<BaudRate, TransportError> {
    match baud {
        9600 => Ok(BaudRate::B9600),
        19200 => Ok(BaudRate::B19200),
        38400 => Ok(BaudRate::B38400),
        57600 => Ok(BaudRate::B57600),
        115_200 => Ok(BaudRate::B115200),
        other => Err(TransportError::UnsupportedBaud(other)),
    }
}

/// Non-blocking serial link
#[derive(Debug)]
pub struct SerialTransport {
    fd: AsyncFd<File>,
    port: String,
    lines: LineBuffer,
    line_timeout: Duration,
}

impl SerialTransport {
    /// Open and configure the port described by `config`
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened, the baud rate is not
    /// supported, or the terminal attributes cannot be applied.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let speed = baud_rate(config.baud_rate)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&config.port)
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        let mut attrs = termios::tcgetattr(&file)?;
        termios::cfmakeraw(&mut attrs);
        termios::cfsetspeed(&mut attrs, speed)?;
        attrs.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
        // cfmakeraw leaves hardware flow control alone; a held-off CTS
        // would block every request write
        attrs.control_flags.remove(ControlFlags::CRTSCTS);
        attrs.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        attrs.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&file, SetArg::TCSANOW, &attrs)?;

        info!(port = %config.port, baud = config.baud_rate, "Serial port opened");

        Ok(Self {
            fd: AsyncFd::new(file)?,
            port: config.port.clone(),
            lines: LineBuffer::new(),
            line_timeout: config.line_timeout,
        })
    }

    /// Wait for the next chunk of bytes and feed it to the line buffer
    async fn fill(&mut self) -> Result<(), TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| inner.get_ref().read(&mut chunk)) {
                Ok(Ok(0)) => return Err(TransportError::Closed),
                Ok(Ok(n)) => {
                    trace!(bytes = n, "Serial read");
                    self.lines.push(&chunk[..n]);
                    return Ok(());
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => {}
            }
        }
    }

    /// Drive the DTR line
    fn set_dtr(&self, asserted: bool) -> Result<(), TransportError> {
        let request = if asserted {
            libc::TIOCMBIS
        } else {
            libc::TIOCMBIC
        };
        let bits: libc::c_int = libc::TIOCM_DTR;
        // SAFETY: the descriptor is open for the lifetime of `self` and
        // `bits` outlives the call.
        let result =
            unsafe { libc::ioctl(self.fd.as_raw_fd(), request, std::ptr::addr_of!(bits)) };
        if result == -1 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut written = 0;
        while written < bytes.len() {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| inner.get_ref().write(&bytes[written..])) {
                Ok(Ok(0)) => return Err(TransportError::Closed),
                Ok(Ok(n)) => written += n,
                Ok(Err(e)) => return Err(e.into()),
                Err(_would_block) => {}
            }
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<LineRead, TransportError> {
        let deadline = Instant::now() + self.line_timeout;
        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(LineRead::Line(line));
            }
            match tokio::time::timeout_at(deadline, self.fill()).await {
                Ok(result) => result?,
                Err(_) => return Ok(LineRead::TimedOut),
            }
        }
    }

    async fn discard_pending_input(&mut self) -> Result<(), TransportError> {
        termios::tcflush(self.fd.get_ref(), FlushArg::TCIFLUSH)?;
        self.lines.clear();
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), TransportError> {
        debug!(port = %self.port, "Pulsing DTR");
        self.set_dtr(false)?;
        tokio::time::sleep(DTR_PULSE).await;
        self.set_dtr(true)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        termios::tcdrain(self.fd.get_ref())?;
        debug!(port = %self.port, "Serial port drained");
        Ok(())
    }

    fn describe(&self) -> String {
        self.port.clone()
    }
}

#[async_trait]
impl Connector for SerialConfig {
    type Transport = SerialTransport;

    async fn connect(&self) -> Result<SerialTransport, TransportError> {
        SerialTransport::open(self)
    }

    fn target(&self) -> String {
        format!("{} @ {} baud", self.port, self.baud_rate)
    }
}
