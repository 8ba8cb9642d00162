//! Court State
//!
//! The state synchronizer: owns the authoritative scale position and the
//! most recent knock, applies decoded sensor events, and advances the
//! gavel animation once per frame.
//!
//! # Ownership
//!
//! All state lives in private fields. Poll results reach it through
//! [`CourtState::apply`] (or the individual `apply_*` mutators); the frame
//! driver is the only caller of [`CourtState::tick`]. Renderers only ever
//! see a [`DisplaySnapshot`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::AnimationState;
use crate::protocol::{ParsedUpdate, PollOutcome};
use crate::snapshot::{tilt_degrees, DisplaySnapshot, LinkStatus, Verdict, SCALE_CENTER};

/// How long the "last knock" caption stays on screen
pub const KNOCK_DISPLAY_WINDOW: Duration = Duration::from_secs(5);

/// Highest raw potentiometer value
pub const SCALE_MAX: u16 = 1023;

/// Knocks kept for the history line
pub const KNOCK_HISTORY_LEN: usize = 8;

/// A scale value outside `0..=1023`
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("scale reading {0} is outside 0..=1023")]
pub struct ScaleOutOfRange(pub i64);

/// A potentiometer position in `0..=1023`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64")]
pub struct ScaleReading(u16);

impl ScaleReading {
    /// Range-checked constructor; `None` for anything outside `0..=1023`
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= SCALE_MAX)
            .map(Self)
    }

    /// Raw position
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<i64> for ScaleReading {
    type Error = ScaleOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ScaleOutOfRange(value))
    }
}

impl Default for ScaleReading {
    fn default() -> Self {
        Self(SCALE_CENTER)
    }
}

/// A strike reported by the microcontroller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnockEvent {
    /// Reported strength
    pub strength: u32,
    /// When the knock line was parsed
    pub at: Instant,
}

/// Most recent knock, kept for the caption
#[derive(Clone, Copy, Debug)]
struct LastKnock {
    strength: u32,
    at: Instant,
}

/// Authoritative court state
#[derive(Clone, Debug, Default)]
pub struct CourtState {
    scale: ScaleReading,
    last_knock: Option<LastKnock>,
    recent_knocks: VecDeque<u32>,
    link: LinkStatus,
    animation: AnimationState,
}

impl CourtState {
    /// Fresh state: scale centred, no knocks, gavel idle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the scale position if `value` is within `0..=1023`
    ///
    /// Returns whether the reading was applied.
    pub fn apply_scale_reading(&mut self, value: i64) -> bool {
        match ScaleReading::new(value) {
            Some(reading) => {
                self.scale = reading;
                true
            }
            None => false,
        }
    }

    /// Record a knock and restart the gavel swing
    pub fn apply_knock(&mut self, strength: u32, at: Instant) {
        self.last_knock = Some(LastKnock { strength, at });
        self.recent_knocks.push_front(strength);
        self.recent_knocks.truncate(KNOCK_HISTORY_LEN);
        self.animation.restart();
    }

    /// Apply everything a poll decoded, in arrival order
    pub fn apply(&mut self, update: &ParsedUpdate) {
        self.link = match update.outcome {
            PollOutcome::Complete => LinkStatus::Responsive,
            PollOutcome::TimedOut => LinkStatus::Unresponsive,
        };
        if let Some(reading) = update.scale {
            self.apply_scale_reading(i64::from(reading.value()));
        }
        for knock in &update.knocks {
            self.apply_knock(knock.strength, knock.at);
        }
    }

    /// Advance the animation by one frame
    pub fn tick(&mut self) {
        self.animation.tick();
    }

    /// Current scale position
    #[must_use]
    pub fn scale_position(&self) -> u16 {
        self.scale.value()
    }

    /// Strengths of the latest knocks, newest first
    pub fn recent_knocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.recent_knocks.iter().copied()
    }

    /// Whether the device answered the last poll
    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        self.link
    }

    /// Current animation state
    #[must_use]
    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Strength of the last knock (0 before any knock)
    #[must_use]
    pub fn knock_strength(&self) -> u32 {
        self.last_knock.map_or(0, |k| k.strength)
    }

    /// Seconds since the last knock while it is still worth showing
    ///
    /// `None` before any knock, after a zero-strength knock, or once
    /// [`KNOCK_DISPLAY_WINDOW`] has elapsed.
    #[must_use]
    pub fn seconds_since_knock(&self, now: Instant) -> Option<f64> {
        let knock = self.last_knock.filter(|k| k.strength > 0)?;
        let elapsed = now.saturating_duration_since(knock.at);
        (elapsed < KNOCK_DISPLAY_WINDOW).then(|| elapsed.as_secs_f64())
    }

    /// Build the renderer's view of this frame
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> DisplaySnapshot {
        let position = self.scale.value();
        DisplaySnapshot {
            scale_position: position,
            verdict: Verdict::from_position(position),
            tilt_degrees: tilt_degrees(position),
            animation_step: self.animation.step(),
            hammer_degrees: self.animation.hammer_degrees(),
            bang_visible: self.animation.bang_visible(),
            knock_strength: self.knock_strength(),
            seconds_since_knock: self.seconds_since_knock(now),
            recent_knocks: self.recent_knocks().collect(),
            link: self.link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_state() {
        let court = CourtState::new();
        assert_eq!(court.scale_position(), 512);
        assert_eq!(court.knock_strength(), 0);
        assert!(!court.animation().is_active());
        assert_eq!(court.seconds_since_knock(Instant::now()), None);
    }

    #[test]
    fn test_scale_reading_boundaries() {
        let mut court = CourtState::new();

        assert!(!court.apply_scale_reading(-1));
        assert_eq!(court.scale_position(), 512);

        assert!(court.apply_scale_reading(0));
        assert_eq!(court.scale_position(), 0);

        assert!(court.apply_scale_reading(1023));
        assert_eq!(court.scale_position(), 1023);

        assert!(!court.apply_scale_reading(1024));
        assert_eq!(court.scale_position(), 1023);

        assert!(!court.apply_scale_reading(i64::MAX));
        assert!(!court.apply_scale_reading(i64::MIN));
        assert_eq!(court.scale_position(), 1023);
    }

    #[test]
    fn test_knock_restarts_animation_mid_swing() {
        let mut court = CourtState::new();
        let now = Instant::now();
        court.apply_knock(10, now);
        for _ in 0..6 {
            court.tick();
        }
        assert_eq!(court.animation().step(), 7);

        court.apply_knock(20, now);
        assert_eq!(court.animation().step(), 1);
        assert_eq!(court.knock_strength(), 20);
    }

    #[test]
    fn test_knock_caption_window() {
        let mut court = CourtState::new();
        let t0 = Instant::now();
        court.apply_knock(5, t0);

        let recent = court.seconds_since_knock(t0 + Duration::from_millis(4990));
        assert!(recent.is_some());
        assert!((recent.unwrap_or_default() - 4.99).abs() < 1e-9);

        assert_eq!(court.seconds_since_knock(t0 + Duration::from_secs(5)), None);
        assert_eq!(court.seconds_since_knock(t0 + Duration::from_secs(60)), None);
    }

    #[test]
    fn test_zero_strength_knock_hides_caption_but_swings() {
        let mut court = CourtState::new();
        let t0 = Instant::now();
        court.apply_knock(0, t0);
        assert!(court.animation().is_active());
        assert_eq!(court.seconds_since_knock(t0), None);
    }

    #[test]
    fn test_apply_update_in_order() {
        let mut court = CourtState::new();
        let t0 = Instant::now();
        let update = ParsedUpdate {
            scale: ScaleReading::new(700),
            knocks: vec![
                KnockEvent { strength: 3, at: t0 },
                KnockEvent {
                    strength: 9,
                    at: t0 + Duration::from_millis(1),
                },
            ],
            ignored: 0,
            outcome: PollOutcome::Complete,
        };
        court.apply(&update);
        assert_eq!(court.scale_position(), 700);
        assert_eq!(court.knock_strength(), 9);
        assert_eq!(court.animation().step(), 1);
    }

    #[test]
    fn test_snapshot_derivations() {
        let mut court = CourtState::new();
        let t0 = Instant::now();
        court.apply_scale_reading(1000);
        court.apply_knock(7, t0);
        for _ in 0..10 {
            court.tick();
        }

        let snap = court.snapshot(t0 + Duration::from_secs(1));
        assert_eq!(snap.scale_position, 1000);
        assert_eq!(snap.verdict, Verdict::Guilty);
        assert_eq!(snap.animation_step, 11);
        assert_eq!(snap.hammer_degrees, 36.0);
        assert!(snap.bang_visible);
        assert_eq!(snap.knock_strength, 7);
        assert_eq!(snap.seconds_since_knock, Some(1.0));
    }

    #[test]
    fn test_scale_reading_constructor() {
        assert_eq!(ScaleReading::new(0).map(ScaleReading::value), Some(0));
        assert_eq!(ScaleReading::new(1023).map(ScaleReading::value), Some(1023));
        assert_eq!(ScaleReading::new(1024), None);
        assert_eq!(ScaleReading::new(-5), None);
        assert_eq!(ScaleReading::default().value(), 512);
    }

    #[test]
    fn test_scale_reading_deserialize_is_range_checked() {
        let ok: ScaleReading = serde_json::from_str("1023").unwrap();
        assert_eq!(ok.value(), 1023);
        assert!(serde_json::from_str::<ScaleReading>("1024").is_err());
        assert!(serde_json::from_str::<ScaleReading>("-1").is_err());
        assert_eq!(
            ScaleReading::try_from(5000),
            Err(ScaleOutOfRange(5000))
        );
    }

    #[test]
    fn test_knock_history_is_bounded_newest_first() {
        let mut court = CourtState::new();
        let t0 = Instant::now();
        for strength in 1..=10 {
            court.apply_knock(strength, t0);
        }

        let history: Vec<u32> = court.recent_knocks().collect();
        assert_eq!(history.len(), KNOCK_HISTORY_LEN);
        assert_eq!(history, vec![10, 9, 8, 7, 6, 5, 4, 3]);
        assert_eq!(court.snapshot(t0).recent_knocks, history);
    }

    #[test]
    fn test_zero_strength_knock_enters_history() {
        let mut court = CourtState::new();
        court.apply_knock(0, Instant::now());
        assert_eq!(court.recent_knocks().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_link_status_follows_poll_outcome() {
        let mut court = CourtState::new();
        assert_eq!(court.link_status(), LinkStatus::Waiting);

        court.apply(&ParsedUpdate::timed_out());
        assert_eq!(court.link_status(), LinkStatus::Unresponsive);

        let complete = ParsedUpdate {
            scale: None,
            knocks: Vec::new(),
            ignored: 0,
            outcome: PollOutcome::Complete,
        };
        court.apply(&complete);
        assert_eq!(court.link_status(), LinkStatus::Responsive);
        assert_eq!(court.snapshot(Instant::now()).link, LinkStatus::Responsive);

        // A timed-out poll keeps the last known scale
        court.apply_scale_reading(800);
        court.apply(&ParsedUpdate::timed_out());
        assert_eq!(court.scale_position(), 800);
        assert_eq!(court.link_status(), LinkStatus::Unresponsive);
    }
}
