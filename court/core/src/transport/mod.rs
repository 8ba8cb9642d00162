//! Transport Layer for the Sensor Link
//!
//! Abstracts the half-duplex byte stream between the host and the
//! microcontroller:
//! - [`SerialTransport`]: A real tty (USB CDC / FTDI), non-blocking via `AsyncFd`
//! - [`SimulatedDevice`]: An in-process stand-in that speaks the same protocol
//! - [`ScriptedTransport`]: Replays canned responses for tests
//!
//! # Design Philosophy
//!
//! Transports deal in bytes and lines only. They never interpret `SCALE:`
//! or `KNOCK:` lines; that is the protocol client's job. Every read is
//! bounded by a per-line timeout, so a silent device yields
//! [`LineRead::TimedOut`] instead of blocking forever.

pub mod line;
pub mod scripted;
#[cfg(unix)]
pub mod serial;
pub mod simulated;

use std::io;

use async_trait::async_trait;
use thiserror::Error;

pub use line::{LineBuffer, MAX_LINE_LEN};
pub use scripted::{Reply, ScriptLog, ScriptedConnector, ScriptedTransport};
#[cfg(unix)]
pub use serial::SerialTransport;
pub use simulated::{SimulatedDevice, SimulatorConnector};

/// Errors that end a session with the device
///
/// Timeouts are *not* errors; they are reported as [`LineRead::TimedOut`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port could not be opened
    #[error("Failed to open {port}: {source}")]
    Open {
        /// Port that was attempted
        port: String,
        /// Underlying OS error
        source: io::Error,
    },

    /// Read or write failed on an open port
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Terminal attribute or modem-control call failed
    #[error("Port configuration failed: {0}")]
    Termios(#[from] nix::Error),

    /// The device hung up (unplugged, reset into bootloader, ...)
    #[error("Connection closed by device")]
    Closed,

    /// Baud rate has no termios equivalent
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaud(u32),
}

/// Result of a single bounded line read
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineRead {
    /// A complete line, trimmed, lossily decoded
    Line(String),
    /// No complete line arrived within the read timeout
    TimedOut,
}

/// Byte-stream link to the microcontroller
#[async_trait]
pub trait Transport: Send {
    /// Write raw bytes to the device
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read the next line, giving up after the transport's line timeout
    async fn read_line(&mut self) -> Result<LineRead, TransportError>;

    /// Drop anything already received but not yet read, including a
    /// partially buffered line
    async fn discard_pending_input(&mut self) -> Result<(), TransportError>;

    /// Reboot the remote device, if the link supports it
    async fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Flush and release the link
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Human-readable description (port path, "simulator", ...)
    fn describe(&self) -> String;
}

/// Opens a [`Transport`]
///
/// The frame driver owns the connect step so that open failures surface on
/// the same failure path as mid-session errors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Transport produced on success
    type Transport: Transport;

    /// Open the link
    async fn connect(&self) -> Result<Self::Transport, TransportError>;

    /// What is being connected to, for status display
    fn target(&self) -> String;
}
