//! Gavel Animation
//!
//! A knock starts a fixed-length, frame-counted swing: the hammer rises for
//! the first half and comes down for the second half, with a "BANG" shown
//! just after impact. The counter advances once per rendered frame, so the
//! animation length is measured in frames rather than wall-clock time.

use serde::{Deserialize, Serialize};

/// Number of frames in a full swing
pub const ANIMATION_LENGTH: u8 = 20;

/// Last frame of the raising half
const RAISE_STEPS: u8 = ANIMATION_LENGTH / 2;

/// Hammer rotation per step, in degrees
const DEGREES_PER_STEP: f64 = 4.0;

/// Last frame on which the BANG indicator is shown
const BANG_LAST_STEP: u8 = 15;

/// Step counter driving the gavel swing
///
/// Invariant: `0 <= step <= ANIMATION_LENGTH`. Step 0 is idle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationState {
    step: u8,
}

impl AnimationState {
    /// Idle animation
    #[must_use]
    pub const fn idle() -> Self {
        Self { step: 0 }
    }

    /// Current step (0 = idle)
    #[must_use]
    pub const fn step(self) -> u8 {
        self.step
    }

    /// Whether a swing is in progress
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.step > 0
    }

    /// (Re)start the swing from the first frame
    ///
    /// A swing already in progress is interrupted, not queued.
    pub fn restart(&mut self) {
        self.step = 1;
    }

    /// Advance one frame; wraps back to idle after the last frame
    pub fn tick(&mut self) {
        if self.step == 0 {
            return;
        }
        self.step += 1;
        if self.step > ANIMATION_LENGTH {
            self.step = 0;
        }
    }

    /// Hammer rotation in degrees for the current step
    #[must_use]
    pub fn hammer_degrees(self) -> f64 {
        match self.step {
            0 => 0.0,
            s if s <= RAISE_STEPS => f64::from(s) * DEGREES_PER_STEP,
            s => f64::from(ANIMATION_LENGTH - s) * DEGREES_PER_STEP,
        }
    }

    /// Whether the BANG indicator is visible (just after impact)
    #[must_use]
    pub const fn bang_visible(self) -> bool {
        self.step > RAISE_STEPS && self.step <= BANG_LAST_STEP
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at_step(step: u8) -> AnimationState {
        let mut anim = AnimationState::idle();
        anim.restart();
        for _ in 1..step {
            anim.tick();
        }
        anim
    }

    #[test]
    fn test_idle_tick_stays_idle() {
        let mut anim = AnimationState::idle();
        anim.tick();
        assert_eq!(anim.step(), 0);
        assert!(!anim.is_active());
    }

    #[test]
    fn test_full_cycle_returns_to_idle() {
        let mut anim = AnimationState::idle();
        anim.restart();
        let mut seen = vec![anim.step()];
        for _ in 0..ANIMATION_LENGTH {
            anim.tick();
            seen.push(anim.step());
        }
        let expected: Vec<u8> = (1..=ANIMATION_LENGTH).chain(std::iter::once(0)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_restart_interrupts_swing() {
        let mut anim = at_step(7);
        assert_eq!(anim.step(), 7);
        anim.restart();
        assert_eq!(anim.step(), 1);
    }

    #[test]
    fn test_hammer_degrees_rise_and_fall() {
        assert_eq!(at_step(1).hammer_degrees(), 4.0);
        assert_eq!(at_step(10).hammer_degrees(), 40.0);
        assert_eq!(at_step(11).hammer_degrees(), 36.0);
        assert_eq!(at_step(20).hammer_degrees(), 0.0);
        assert_eq!(AnimationState::idle().hammer_degrees(), 0.0);
    }

    #[test]
    fn test_bang_window() {
        let visible: Vec<u8> = (1..=ANIMATION_LENGTH)
            .filter(|&s| at_step(s).bang_visible())
            .collect();
        assert_eq!(visible, vec![11, 12, 13, 14, 15]);
        assert!(!at_step(10).bang_visible());
        assert!(!at_step(16).bang_visible());
        assert!(!AnimationState::idle().bang_visible());
    }
}
