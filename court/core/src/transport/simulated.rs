//! Simulated Device
//!
//! Speaks the sensor protocol without hardware, for demos and for running
//! the surfaces on a machine with nothing plugged in.
//!
//! The scale sweeps slowly from one side to the other, knocks arrive at
//! random, and now and then the device emits a line the host must ignore.

use std::f64::consts::TAU;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;
use tracing::debug;

use super::{Connector, LineBuffer, LineRead, Transport, TransportError};
use crate::court::SCALE_MAX;
use crate::snapshot::SCALE_CENTER;

/// Time for one full sweep of the scale
const SWEEP_PERIOD: Duration = Duration::from_secs(12);

/// How far the sweep swings either side of centre
const SWEEP_AMPLITUDE: f64 = 420.0;

/// Chance that a response carries a knock
const KNOCK_PROBABILITY: f64 = 0.02;

/// Chance that a response carries a line the host should ignore
const NOISE_PROBABILITY: f64 = 0.05;

/// Time the fake device takes to answer
const RESPONSE_LATENCY: Duration = Duration::from_millis(4);

const NOISE_LINES: &[&str] = &["TEMP:21", "KNOCK:??", "SCALE:", "BOOT OK", ""];

/// In-process stand-in for the microcontroller
#[derive(Debug)]
pub struct SimulatedDevice {
    rng: StdRng,
    started: Instant,
    lines: LineBuffer,
    answered_at: Option<Instant>,
    line_timeout: Duration,
}

impl SimulatedDevice {
    /// Create a device; a fixed `seed` gives a repeatable session
    #[must_use]
    pub fn new(seed: Option<u64>, line_timeout: Duration) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng,
            started: Instant::now(),
            lines: LineBuffer::new(),
            answered_at: None,
            line_timeout,
        }
    }

    /// Scale position the device would report right now
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn scale_at(&self, now: Instant) -> u16 {
        let phase = now.duration_since(self.started).as_secs_f64() / SWEEP_PERIOD.as_secs_f64();
        let value = f64::from(SCALE_CENTER) + SWEEP_AMPLITUDE * (phase * TAU).sin();
        value.round().clamp(0.0, f64::from(SCALE_MAX)) as u16
    }

    fn respond(&mut self) {
        let now = Instant::now();
        let jitter: i32 = self.rng.gen_range(-3..=3);
        let scale = (i32::from(self.scale_at(now)) + jitter).clamp(0, i32::from(SCALE_MAX));

        let mut response = format!("SCALE:{scale}\r\n");
        if self.rng.gen_bool(NOISE_PROBABILITY) {
            let noise = NOISE_LINES[self.rng.gen_range(0..NOISE_LINES.len())];
            response.push_str(noise);
            response.push_str("\r\n");
        }
        if self.rng.gen_bool(KNOCK_PROBABILITY) {
            let strength: u32 = self.rng.gen_range(5..=120);
            debug!(strength, "Simulated knock");
            response.push_str(&format!("KNOCK:{strength}\r\n"));
        }
        response.push_str("END\r\n");

        self.lines.push(response.as_bytes());
        self.answered_at = Some(now + RESPONSE_LATENCY);
    }
}

#[async_trait]
impl Transport for SimulatedDevice {
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for _ in bytes.iter().filter(|&&b| b == b'R') {
            self.respond();
        }
        Ok(())
    }

    async fn read_line(&mut self) -> Result<LineRead, TransportError> {
        if let Some(ready) = self.answered_at.take() {
            tokio::time::sleep_until(ready).await;
        }
        match self.lines.next_line() {
            Some(line) => Ok(LineRead::Line(line)),
            None => {
                tokio::time::sleep(self.line_timeout).await;
                Ok(LineRead::TimedOut)
            }
        }
    }

    async fn discard_pending_input(&mut self) -> Result<(), TransportError> {
        self.lines.clear();
        self.answered_at = None;
        Ok(())
    }

    async fn reset(&mut self) -> Result<(), TransportError> {
        self.started = Instant::now();
        self.lines.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "simulator".to_string()
    }
}

/// Opens a [`SimulatedDevice`]
#[derive(Clone, Debug)]
pub struct SimulatorConnector {
    seed: Option<u64>,
    line_timeout: Duration,
}

impl SimulatorConnector {
    /// Connector for a device with the given seed and read timeout
    #[must_use]
    pub fn new(seed: Option<u64>, line_timeout: Duration) -> Self {
        Self { seed, line_timeout }
    }
}

#[async_trait]
impl Connector for SimulatorConnector {
    type Transport = SimulatedDevice;

    async fn connect(&self) -> Result<SimulatedDevice, TransportError> {
        Ok(SimulatedDevice::new(self.seed, self.line_timeout))
    }

    fn target(&self) -> String {
        "simulator".to_string()
    }
}
