//! Display Snapshot
//!
//! The per-frame, read-only view of the court that renderers consume.
//! Everything here is derived from [`CourtState`](crate::court::CourtState)
//! when the snapshot is taken; nothing is stored back.

use serde::{Deserialize, Serialize};

/// Centre of the potentiometer range
pub const SCALE_CENTER: u16 = 512;

/// Readings below this are "Innocent"
const NEUTRAL_LOW: u16 = 450;

/// Readings above this are "Guilty"
const NEUTRAL_HIGH: u16 = 550;

/// Beam tilt at either end of the range, in degrees
pub const MAX_TILT_DEGREES: f64 = 30.0;

/// Three-way classification of the scale position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Scale leans towards the defence
    Innocent,
    /// Within the neutral band (450..=550)
    Neutral,
    /// Scale leans towards the prosecution
    Guilty,
}

impl Verdict {
    /// Classify a scale position
    #[must_use]
    pub fn from_position(position: u16) -> Self {
        if position < NEUTRAL_LOW {
            Self::Innocent
        } else if position > NEUTRAL_HIGH {
            Self::Guilty
        } else {
            Self::Neutral
        }
    }

    /// Label shown under the scale
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Innocent => "Innocent",
            Self::Neutral => "Neutral",
            Self::Guilty => "Guilty",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the device is answering polls
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// No poll has finished yet
    #[default]
    Waiting,
    /// The last poll reached `END`
    Responsive,
    /// The last poll timed out
    Unresponsive,
}

impl LinkStatus {
    /// Short text for the status line
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Responsive => "link ok",
            Self::Unresponsive => "no response",
        }
    }
}

/// Beam tilt in degrees for a scale position, linear in roughly [-30, +30]
#[must_use]
pub fn tilt_degrees(position: u16) -> f64 {
    (f64::from(position) - f64::from(SCALE_CENTER)) / f64::from(SCALE_CENTER) * MAX_TILT_DEGREES
}

/// Everything a renderer needs to draw one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    /// Raw scale position (0..=1023)
    pub scale_position: u16,
    /// Verdict band for the position
    pub verdict: Verdict,
    /// Beam tilt in degrees
    pub tilt_degrees: f64,
    /// Gavel animation step (0 = idle)
    pub animation_step: u8,
    /// Gavel rotation in degrees
    pub hammer_degrees: f64,
    /// Whether "BANG!" should be drawn
    pub bang_visible: bool,
    /// Strength of the most recent knock (0 if none yet)
    pub knock_strength: u32,
    /// Seconds since the last knock, only while the knock is still recent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_since_knock: Option<f64>,
    /// Strengths of the latest knocks, newest first
    pub recent_knocks: Vec<u32>,
    /// Whether the device answered the last poll
    pub link: LinkStatus,
}

impl DisplaySnapshot {
    /// Text for the knock history line, if there is any history
    #[must_use]
    pub fn knock_history(&self) -> Option<String> {
        if self.recent_knocks.is_empty() {
            return None;
        }
        let strengths: Vec<String> = self.recent_knocks.iter().map(u32::to_string).collect();
        Some(format!("Knocks: {}", strengths.join(" ")))
    }

    /// Text for the "last knock" line, if it should be shown
    #[must_use]
    pub fn knock_caption(&self) -> Option<String> {
        self.seconds_since_knock.map(|secs| {
            format!(
                "Last Knock: {secs:.1}s ago (Strength: {})",
                self.knock_strength
            )
        })
    }
}
