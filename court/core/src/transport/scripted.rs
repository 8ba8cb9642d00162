//! Scripted Transport
//!
//! Replays canned device responses, one per request byte. Used by the test
//! suites and by the headless surface's smoke tests; it never touches a
//! real port.
//!
//! Each `R` written pops the next [`Reply`] off the script. With the script
//! exhausted the device goes quiet, which the protocol client sees as
//! timeouts.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Connector, LineBuffer, LineRead, Transport, TransportError};

/// Default wait for a line before reporting a timeout
const DEFAULT_LINE_TIMEOUT: Duration = Duration::from_secs(1);

/// Gap between lines of an [`Reply::Endless`] stream
const ENDLESS_LINE_GAP: Duration = Duration::from_millis(10);

/// What the fake device does in answer to one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Emit these bytes at once
    Bytes(Vec<u8>),
    /// Say nothing
    Silence,
    /// Repeat this line forever, never sending `END`
    Endless(String),
    /// Hang up
    Disconnect,
}

impl Reply {
    /// Convenience constructor for [`Reply::Bytes`]
    #[must_use]
    pub fn bytes(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

#[derive(Debug, Default)]
struct LogInner {
    writes: Vec<Vec<u8>>,
    discards: usize,
    resets: usize,
    closes: usize,
}

/// Shared record of what was done to a [`ScriptedTransport`]
///
/// Cloning shares the record, so a test can keep a handle after the
/// transport has been moved into a connector.
#[derive(Clone, Debug, Default)]
pub struct ScriptLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ScriptLog {
    /// Every write, in order
    #[must_use]
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.lock().writes.clone()
    }

    /// Number of requests written
    #[must_use]
    pub fn requests(&self) -> usize {
        self.inner
            .lock()
            .writes
            .iter()
            .filter(|w| w.as_slice() == b"R")
            .count()
    }

    /// Number of `discard_pending_input` calls
    #[must_use]
    pub fn discards(&self) -> usize {
        self.inner.lock().discards
    }

    /// Number of `reset` calls
    #[must_use]
    pub fn resets(&self) -> usize {
        self.inner.lock().resets
    }

    /// Number of `close` calls
    #[must_use]
    pub fn closes(&self) -> usize {
        self.inner.lock().closes
    }
}

/// In-memory transport driven by a script of replies
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<Reply>,
    lines: LineBuffer,
    endless: Option<String>,
    hung_up: bool,
    line_timeout: Duration,
    log: ScriptLog,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Empty script; every request is met with silence
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            lines: LineBuffer::new(),
            endless: None,
            hung_up: false,
            line_timeout: DEFAULT_LINE_TIMEOUT,
            log: ScriptLog::default(),
        }
    }

    /// Build from a list of replies
    #[must_use]
    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let mut transport = Self::new();
        transport.script.extend(replies);
        transport
    }

    /// Override the per-line read timeout
    #[must_use]
    pub fn with_line_timeout(mut self, line_timeout: Duration) -> Self {
        self.line_timeout = line_timeout;
        self
    }

    /// Queue the reply to a future request
    pub fn respond(&mut self, reply: Reply) {
        self.script.push_back(reply);
    }

    /// Make bytes appear on the line without a request (stale input)
    pub fn inject(&mut self, data: &[u8]) {
        self.lines.push(data);
    }

    /// Handle to the call record
    #[must_use]
    pub fn log(&self) -> ScriptLog {
        self.log.clone()
    }

    /// Replies not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn answer_request(&mut self) {
        match self.script.pop_front() {
            Some(Reply::Bytes(data)) => self.lines.push(&data),
            Some(Reply::Endless(line)) => self.endless = Some(line),
            Some(Reply::Disconnect) => self.hung_up = true,
            Some(Reply::Silence) | None => {}
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.hung_up {
            return Err(TransportError::Closed);
        }
        self.log.inner.lock().writes.push(bytes.to_vec());
        for _ in bytes.iter().filter(|&&b| b == b'R') {
            self.answer_request();
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<LineRead, TransportError> {
        if let Some(line) = self.lines.next_line() {
            return Ok(LineRead::Line(line));
        }
        if self.hung_up {
            return Err(TransportError::Closed);
        }
        if let Some(line) = &self.endless {
            let line = line.clone();
            tokio::time::sleep(ENDLESS_LINE_GAP).await;
            return Ok(LineRead::Line(line));
        }
        tokio::time::sleep(self.line_timeout).await;
        Ok(LineRead::TimedOut)
    }

    async fn discard_pending_input(&mut self) -> Result<(), TransportError> {
        if self.hung_up {
            return Err(TransportError::Closed);
        }
        self.lines.clear();
        self.endless = None;
        self.log.inner.lock().discards += 1;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), TransportError> {
        self.log.inner.lock().resets += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.log.inner.lock().closes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Hands out a prepared [`ScriptedTransport`] once
#[derive(Debug)]
pub struct ScriptedConnector {
    transport: Mutex<Option<ScriptedTransport>>,
    target: String,
}

impl ScriptedConnector {
    /// Connector that succeeds with `transport`
    #[must_use]
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport: Mutex::new(Some(transport)),
            target: "scripted".to_string(),
        }
    }

    /// Connector whose open always fails, as a missing port would
    #[must_use]
    pub fn failing(port: impl Into<String>) -> Self {
        Self {
            transport: Mutex::new(None),
            target: port.into(),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = ScriptedTransport;

    async fn connect(&self) -> Result<ScriptedTransport, TransportError> {
        self.transport
            .lock()
            .take()
            .ok_or_else(|| TransportError::Open {
                port: self.target.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such device"),
            })
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}
