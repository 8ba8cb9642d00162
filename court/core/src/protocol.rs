//! Sensor Protocol Client
//!
//! One poll is one request/response exchange:
//!
//! ```text
//! host                         device
//!  │ ── discard stale input        │
//!  │ ─────────── 'R' ────────────▶ │
//!  │ ◀──────── SCALE:712 ───────── │
//!  │ ◀──────── KNOCK:38 ────────── │
//!  │ ◀──────── END ─────────────── │
//! ```
//!
//! # Error Classification
//!
//! - Malformed lines, unparsable numbers and unknown prefixes are dropped
//!   where they are parsed and counted in [`ParsedUpdate::ignored`].
//! - A read timeout, or an exchange (discard, request and response) that
//!   does not reach `END` within the poll budget, is a
//!   [`PollOutcome::TimedOut`] update with no data. A blocked write counts
//!   the same way.
//! - Only transport failures (and the optional stall policy) escape as
//!   [`PollError`].

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::config::PollConfig;
use crate::court::{KnockEvent, ScaleReading};
use crate::transport::{LineRead, Transport, TransportError};

/// Request byte that asks the device for its current readings
pub const REQUEST: &[u8] = b"R";

/// Response terminator
pub const END_SENTINEL: &str = "END";

const SCALE_PREFIX: &str = "SCALE:";
const KNOCK_PREFIX: &str = "KNOCK:";

/// Errors that end the session
#[derive(Debug, Error)]
pub enum PollError {
    /// The transport failed mid-exchange
    #[error("Connection lost: {0}")]
    ConnectionLost(#[source] TransportError),

    /// The device kept the port open but stopped answering
    #[error("Device stopped responding ({polls} polls timed out in a row)")]
    Stalled {
        /// Consecutive timed-out polls
        polls: u32,
    },
}

/// How the exchange ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// `END` received; the update carries the response's data
    Complete,
    /// No `END` in time; the update carries nothing
    TimedOut,
}

/// Decoded result of one poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUpdate {
    /// Last valid scale reading in the response
    pub scale: Option<ScaleReading>,
    /// Valid knocks, in arrival order
    pub knocks: Vec<KnockEvent>,
    /// Lines that were malformed or unrecognised
    pub ignored: usize,
    /// Whether the response was terminated properly
    pub outcome: PollOutcome,
}

impl ParsedUpdate {
    /// An update carrying nothing, for polls that did not complete
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            scale: None,
            knocks: Vec::new(),
            ignored: 0,
            outcome: PollOutcome::TimedOut,
        }
    }

    /// Whether applying this update changes anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scale.is_none() && self.knocks.is_empty()
    }
}

/// Classification of one response line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorLine {
    /// `SCALE:<0..=1023>`
    Scale(ScaleReading),
    /// `KNOCK:<non-negative int>`
    Knock(u32),
    /// Known prefix with an unusable value
    Malformed,
    /// Unknown prefix (or blank)
    Unknown,
}

impl SensorLine {
    /// Classify a trimmed response line
    #[must_use]
    pub fn parse(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix(SCALE_PREFIX) {
            rest.trim()
                .parse::<i64>()
                .ok()
                .and_then(ScaleReading::new)
                .map_or(Self::Malformed, Self::Scale)
        } else if let Some(rest) = line.strip_prefix(KNOCK_PREFIX) {
            rest.trim()
                .parse::<u32>()
                .map_or(Self::Malformed, Self::Knock)
        } else {
            Self::Unknown
        }
    }
}

/// Decode the lines of a completed response
///
/// Knocks are stamped with `at`, the time the response was decoded.
#[must_use]
pub fn decode_response(lines: &[String], at: Instant) -> ParsedUpdate {
    let mut update = ParsedUpdate {
        scale: None,
        knocks: Vec::new(),
        ignored: 0,
        outcome: PollOutcome::Complete,
    };

    for line in lines {
        match SensorLine::parse(line) {
            SensorLine::Scale(reading) => update.scale = Some(reading),
            SensorLine::Knock(strength) => update.knocks.push(KnockEvent { strength, at }),
            SensorLine::Malformed => {
                debug!(line = %line, "Ignoring malformed sensor line");
                update.ignored += 1;
            }
            SensorLine::Unknown => {
                trace!(line = %line, "Ignoring unrecognised sensor line");
                update.ignored += 1;
            }
        }
    }

    update
}

/// Response collection result before decoding
enum Collected {
    Complete(Vec<String>),
    TimedOut,
}

/// Issues polls and decodes responses
#[derive(Debug)]
pub struct SensorClient {
    budget: Duration,
    stall_limit: u32,
    consecutive_timeouts: u32,
}

impl SensorClient {
    /// Create a client from polling configuration
    #[must_use]
    pub fn new(config: &PollConfig) -> Self {
        Self {
            budget: config.budget,
            stall_limit: config.stall_limit,
            consecutive_timeouts: 0,
        }
    }

    /// Upper bound on a single poll, request write included
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Timed-out polls since the last complete one
    #[must_use]
    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }

    /// Run one request/response exchange
    ///
    /// # Errors
    ///
    /// - [`PollError::ConnectionLost`] if the transport fails
    /// - [`PollError::Stalled`] once `stall_limit` consecutive polls time out
    pub async fn poll<T>(&mut self, transport: &mut T) -> Result<ParsedUpdate, PollError>
    where
        T: Transport + ?Sized,
    {
        let exchange = async {
            transport.discard_pending_input().await?;
            transport.write(REQUEST).await?;
            collect_response(transport).await
        };
        let collected = tokio::time::timeout(self.budget, exchange).await;

        match collected {
            Ok(Ok(Collected::Complete(lines))) => {
                self.consecutive_timeouts = 0;
                let update = decode_response(&lines, tokio::time::Instant::now().into_std());
                trace!(
                    lines = lines.len(),
                    ignored = update.ignored,
                    knocks = update.knocks.len(),
                    "Poll complete"
                );
                Ok(update)
            }
            Ok(Ok(Collected::TimedOut)) | Err(_) => self.note_timeout(),
            Ok(Err(e)) => Err(PollError::ConnectionLost(e)),
        }
    }

    fn note_timeout(&mut self) -> Result<ParsedUpdate, PollError> {
        self.consecutive_timeouts = self.consecutive_timeouts.saturating_add(1);
        debug!(
            consecutive = self.consecutive_timeouts,
            "Poll timed out before END"
        );

        if self.stall_limit > 0 && self.consecutive_timeouts >= self.stall_limit {
            warn!(polls = self.consecutive_timeouts, "Device stalled");
            return Err(PollError::Stalled {
                polls: self.consecutive_timeouts,
            });
        }
        Ok(ParsedUpdate::timed_out())
    }
}

/// Read lines until `END` or a per-line timeout
async fn collect_response<T>(transport: &mut T) -> Result<Collected, TransportError>
where
    T: Transport + ?Sized,
{
    let mut lines = Vec::new();
    loop {
        match transport.read_line().await? {
            LineRead::Line(line) if line == END_SENTINEL => return Ok(Collected::Complete(lines)),
            LineRead::Line(line) => lines.push(line),
            LineRead::TimedOut => return Ok(Collected::TimedOut),
        }
    }
}
