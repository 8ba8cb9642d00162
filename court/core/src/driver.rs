//! Frame Driver
//!
//! The fixed-rate loop that paces polling and rendering.
//!
//! # State Machine
//!
//! ```text
//!              open ok, reset, settle, discard
//! Connecting ─────────────────────────────────▶ Running
//!     │                                          │  │
//!     │ open/reset failure        PollError      │  │ Quit
//!     ▼                                          │  ▼
//!   Failed ◀─────────────────────────────────────┘ Stopped
//! ```
//!
//! Each Running iteration drains quit signals, polls if the poll interval
//! has elapsed, ticks the court, renders one snapshot and sleeps the rest
//! of the frame. Polling is paced by wall-clock time, not by frame count,
//! so a slow poll stretches one frame without changing the poll rate.
//!
//! Failed is terminal: the renderer shows the error for the grace period,
//! the transport is closed best-effort and [`FrameDriver::run`] returns the
//! error. There is no reconnect.

use std::io;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::JudgeConfig;
use crate::court::CourtState;
use crate::protocol::{PollError, SensorClient};
use crate::snapshot::DisplaySnapshot;
use crate::transport::{Connector, Transport, TransportError};

/// Prefix of the message shown on the failure screen
pub const FAILURE_PREFIX: &str = "Serial connection error";

/// Errors raised by a display surface
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the terminal (or stdout) failed
    #[error("Render IO error: {0}")]
    Io(#[from] io::Error),
}

/// A display surface
///
/// Renderers only ever see read-only snapshots; they cannot reach the
/// court state or the transport.
pub trait Renderer {
    /// Draw one frame
    fn render(&mut self, snapshot: &DisplaySnapshot) -> Result<(), RenderError>;

    /// Show that the device is being connected
    fn show_connecting(&mut self, _target: &str) -> Result<(), RenderError> {
        Ok(())
    }

    /// Show a fatal error for the rest of the session
    fn show_failure(&mut self, message: &str) -> Result<(), RenderError>;
}

/// Requests delivered to the driver between frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverSignal {
    /// Stop the loop and close the device
    Quit,
}

/// Driver lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Opening and settling the device
    Connecting,
    /// Polling and rendering
    Running,
    /// Terminal: the link failed
    Failed,
    /// Terminal: quit was requested
    Stopped,
}

/// Errors that end [`FrameDriver::run`]
#[derive(Debug, Error)]
pub enum DriverError {
    /// The device could not be opened or prepared
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The link failed mid-session
    #[error(transparent)]
    Poll(#[from] PollError),

    /// The display surface failed
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

/// Result of waiting with quit signals honoured
enum Wait {
    Elapsed,
    Quit,
}

/// Paces polling and rendering for one session
pub struct FrameDriver<R: Renderer> {
    config: JudgeConfig,
    renderer: R,
    signals: mpsc::Receiver<DriverSignal>,
    court: CourtState,
    client: SensorClient,
    state: DriverState,
    frames: u64,
    polls: u64,
}

impl<R: Renderer> FrameDriver<R> {
    /// Create a driver; `signals` carries quit requests from input tasks
    pub fn new(config: JudgeConfig, renderer: R, signals: mpsc::Receiver<DriverSignal>) -> Self {
        let client = SensorClient::new(&config.polling);
        Self {
            config,
            renderer,
            signals,
            court: CourtState::new(),
            client,
            state: DriverState::Connecting,
            frames: 0,
            polls: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Court state as of the last frame
    pub fn court(&self) -> &CourtState {
        &self.court
    }

    /// The display surface
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Polls issued so far
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Run one session against the device `connector` opens
    ///
    /// Returns `Ok(())` after a quit request.
    ///
    /// # Errors
    ///
    /// Returns the error that moved the driver to [`DriverState::Failed`],
    /// after the failure screen has been shown for the grace period, or a
    /// [`DriverError::Render`] as soon as the surface breaks.
    pub async fn run<C: Connector>(&mut self, connector: &C) -> Result<(), DriverError> {
        self.state = DriverState::Connecting;
        let target = connector.target();
        info!(device = %target, "Connecting to device");
        self.renderer.show_connecting(&target)?;

        let mut transport = match connector.connect().await {
            Ok(transport) => transport,
            Err(e) => return self.fail(None::<&mut C::Transport>, e.into()).await,
        };

        if let Err(e) = transport.reset().await {
            return self.fail(Some(&mut transport), e.into()).await;
        }
        if let Wait::Quit = self.wait(self.config.serial.settle_delay).await {
            return self.stop(&mut transport).await;
        }
        if let Err(e) = transport.discard_pending_input().await {
            return self.fail(Some(&mut transport), e.into()).await;
        }

        self.state = DriverState::Running;
        info!(device = %transport.describe(), "Device ready");

        let frame_period = self.config.frame.frame_period();
        let poll_interval = self.config.polling.interval;
        let mut last_poll: Option<Instant> = None;

        loop {
            let frame_start = Instant::now();

            if self.quit_requested() {
                return self.stop(&mut transport).await;
            }

            let poll_due = !matches!(
                last_poll,
                Some(t) if frame_start.duration_since(t) < poll_interval
            );
            if poll_due {
                last_poll = Some(frame_start);
                self.polls += 1;
                match self.client.poll(&mut transport).await {
                    Ok(update) => self.court.apply(&update),
                    Err(e) => return self.fail(Some(&mut transport), e.into()).await,
                }
            }

            self.court.tick();
            let snapshot = self.court.snapshot(Instant::now().into_std());
            if let Err(e) = self.renderer.render(&snapshot) {
                error!(error = %e, "Renderer failed");
                close_quietly(&mut transport).await;
                return Err(e.into());
            }
            self.frames += 1;

            // Cap the frame rate regardless of how long polling took
            let elapsed = frame_start.elapsed();
            if elapsed < frame_period {
                tokio::time::sleep(frame_period - elapsed).await;
            }
        }
    }

    /// Check for a pending quit without waiting
    fn quit_requested(&mut self) -> bool {
        match self.signals.try_recv() {
            Ok(DriverSignal::Quit) => true,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }

    /// Sleep for `duration`, cutting it short on a quit request
    async fn wait(&mut self, duration: std::time::Duration) -> Wait {
        tokio::select! {
            Some(DriverSignal::Quit) = self.signals.recv() => Wait::Quit,
            () = tokio::time::sleep(duration) => Wait::Elapsed,
        }
    }

    async fn stop<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), DriverError> {
        info!(frames = self.frames, polls = self.polls, "Quit requested");
        close_quietly(transport).await;
        self.state = DriverState::Stopped;
        Ok(())
    }

    async fn fail<T: Transport + ?Sized>(
        &mut self,
        transport: Option<&mut T>,
        err: DriverError,
    ) -> Result<(), DriverError> {
        self.state = DriverState::Failed;
        error!(error = %err, "Session failed");

        let message = format!("{FAILURE_PREFIX}: {err}");
        if let Err(e) = self.renderer.show_failure(&message) {
            warn!(error = %e, "Could not display failure");
        }

        if let Wait::Quit = self.wait(self.config.frame.failure_grace).await {
            debug!("Quit during failure grace period");
        }
        if let Some(transport) = transport {
            close_quietly(transport).await;
        }
        Err(err)
    }
}

async fn close_quietly<T: Transport + ?Sized>(transport: &mut T) {
    if let Err(e) = transport.close().await {
        debug!(error = %e, "Error closing transport");
    }
}
