//! Court Core - Headless Sensor Polling and State Synchronization
//!
//! This crate bridges a microcontroller on an unreliable serial link to a
//! fixed-frame-rate animation state machine. It knows nothing about how
//! the courtroom is drawn: surfaces implement [`driver::Renderer`] and
//! receive a read-only [`DisplaySnapshot`] every frame.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         FrameDriver                           │
//! │                                                               │
//! │   every 50ms              every frame (60 fps)                │
//! │  ┌──────────────┐        ┌────────────┐     ┌──────────────┐ │
//! │  │ SensorClient │──────▶ │ CourtState │───▶ │   Renderer   │ │
//! │  │   (poll)     │ update │  (tick)    │snap │ (TUI, JSON)  │ │
//! │  └──────┬───────┘        └────────────┘     └──────────────┘ │
//! └─────────┼─────────────────────────────────────────────────────┘
//!           │ 'R' / SCALE:.. KNOCK:.. END
//!    ┌──────┴──────┐
//!    │  Transport  │  SerialTransport | SimulatedDevice | ScriptedTransport
//!    └─────────────┘
//! ```
//!
//! # Module Overview
//!
//! - [`transport`]: Byte-stream abstraction over the serial link
//! - [`protocol`]: Poll request/response exchange and line classification
//! - [`court`]: Authoritative scale/knock state (the state synchronizer)
//! - [`animation`]: Gavel animation step counter
//! - [`snapshot`]: Per-frame view handed to renderers
//! - [`driver`]: Fixed-rate loop pacing polling and rendering
//! - [`config`]: Runtime configuration from environment and CLI overrides
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod config;
pub mod court;
pub mod driver;
pub mod protocol;
pub mod snapshot;
pub mod transport;

pub use animation::{AnimationState, ANIMATION_LENGTH};
pub use config::{ConfigError, ConfigOverrides, FrameConfig, JudgeConfig, PollConfig, SerialConfig};
pub use court::{CourtState, KnockEvent, ScaleOutOfRange, ScaleReading};
pub use driver::{
    DriverError, DriverSignal, DriverState, FrameDriver, RenderError, Renderer, FAILURE_PREFIX,
};
pub use protocol::{ParsedUpdate, PollError, PollOutcome, SensorClient, SensorLine};
pub use snapshot::{DisplaySnapshot, LinkStatus, Verdict};
pub use transport::{Connector, LineRead, Transport, TransportError};
