//! Sprite Artwork
//!
//! Text-art frames loaded from the assets directory. A terminal cannot
//! rotate an image, so each prop is a short flip-book: the frame closest to
//! the requested angle is drawn.
//!
//! # Asset Format
//!
//! `scale.txt` and `hammer.txt` hold frames separated by lines of exactly
//! `---`. Scale frames run from full "Innocent" tilt to full "Guilty" tilt;
//! hammer frames run from resting to fully raised. Pattern characters are
//! coloured through a palette:
//!
//! | Char | Drawn as | Color |
//! |------|----------|-------|
//! | `W`  | `█`      | wood  |
//! | `w`  | `▀`      | wood  |
//! | `G`  | `█`      | gold  |
//! | `g`  | `▄`      | gold  |
//! | `S`  | `█`      | gray  |
//! | ` `  | blank    | -     |
//!
//! Any other character is drawn as itself in gold.

use std::fs;
use std::path::{Path, PathBuf};

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use thiserror::Error;
use tracing::debug;

use super::Artwork;
use crate::theme;

/// File holding the scale frames
pub const SCALE_FILE: &str = "scale.txt";

/// File holding the gavel frames
pub const HAMMER_FILE: &str = "hammer.txt";

/// Frame separator line
const SEPARATOR: &str = "---";

/// Tilt covered by the scale frames, either side of level
const SCALE_SPAN_DEGREES: f64 = 30.0;

/// Swing covered by the hammer frames
const HAMMER_SPAN_DEGREES: f64 = 40.0;

/// Errors loading sprite assets
#[derive(Debug, Error)]
pub enum AssetError {
    /// An asset file could not be read
    #[error("Failed to read asset {path}: {source}")]
    Read {
        /// File that was attempted
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// An asset file holds no frames
    #[error("Asset {path} contains no frames")]
    Empty {
        /// Offending file
        path: PathBuf,
    },
}

/// Palette lookup: pattern char to displayed char and colour
const PALETTE: &[(char, char, Color)] = &[
    ('W', '█', theme::WOOD),
    ('w', '▀', theme::WOOD),
    ('G', '█', theme::GOLD),
    ('g', '▄', theme::GOLD),
    ('S', '█', theme::GRAY),
];

/// One pre-coloured frame
#[derive(Clone, Debug)]
struct SpriteFrame {
    lines: Vec<Line<'static>>,
}

impl SpriteFrame {
    fn from_pattern(rows: &[&str]) -> Self {
        // Pad every row to the same width so centring keeps the rows aligned
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let lines = rows
            .iter()
            .map(|row| {
                let padding = width - row.chars().count();
                let cells = row.chars().chain(std::iter::repeat(' ').take(padding));
                Line::from(cells.map(cell).collect::<Vec<_>>())
            })
            .collect();
        Self { lines }
    }

    fn height(&self) -> usize {
        self.lines.len()
    }
}

fn cell(ch: char) -> Span<'static> {
    if ch == ' ' {
        return Span::raw(" ");
    }
    let (display, color) = PALETTE
        .iter()
        .find(|(key, _, _)| *key == ch)
        .map_or((ch, theme::GOLD), |(_, display, color)| (*display, *color));
    Span::styled(display.to_string(), Style::default().fg(color))
}

/// Split asset text into frames, dropping blank frames
fn parse_frames(text: &str) -> Vec<SpriteFrame> {
    let mut frames = Vec::new();
    let mut rows: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once(SEPARATOR)) {
        if line.trim_end() == SEPARATOR {
            // Trim blank rows at both ends of the frame
            let start = rows.iter().position(|r| !r.trim().is_empty());
            let end = rows.iter().rposition(|r| !r.trim().is_empty());
            if let (Some(start), Some(end)) = (start, end) {
                frames.push(SpriteFrame::from_pattern(&rows[start..=end]));
            }
            rows.clear();
        } else {
            rows.push(line.trim_end());
        }
    }
    frames
}

fn load_frames(path: &Path) -> Result<Vec<SpriteFrame>, AssetError> {
    let text = fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let frames = parse_frames(&text);
    if frames.is_empty() {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), frames = frames.len(), "Loaded sprite frames");
    Ok(frames)
}

/// Pick the frame index for `value` within `[min, max]` across `count` frames
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn frame_index(value: f64, min: f64, max: f64, count: usize) -> usize {
    if count <= 1 || max <= min {
        return 0;
    }
    let t = ((value - min) / (max - min)).clamp(0.0, 1.0);
    ((t * (count - 1) as f64).round() as usize).min(count - 1)
}

/// Artwork backed by text-art frame files
#[derive(Clone, Debug)]
pub struct SpriteArtwork {
    scale: Vec<SpriteFrame>,
    hammer: Vec<SpriteFrame>,
}

impl SpriteArtwork {
    /// Load `scale.txt` and `hammer.txt` from `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing, unreadable, or empty.
    pub fn load(dir: &Path) -> Result<Self, AssetError> {
        Ok(Self {
            scale: load_frames(&dir.join(SCALE_FILE))?,
            hammer: load_frames(&dir.join(HAMMER_FILE))?,
        })
    }

    /// Number of scale frames and hammer frames
    #[must_use]
    pub fn frame_counts(&self) -> (usize, usize) {
        (self.scale.len(), self.hammer.len())
    }

    fn scale_frame(&self, tilt_degrees: f64) -> &SpriteFrame {
        let index = frame_index(
            tilt_degrees,
            -SCALE_SPAN_DEGREES,
            SCALE_SPAN_DEGREES,
            self.scale.len(),
        );
        &self.scale[index]
    }

    fn hammer_frame(&self, swing_degrees: f64) -> &SpriteFrame {
        let index = frame_index(swing_degrees, 0.0, HAMMER_SPAN_DEGREES, self.hammer.len());
        &self.hammer[index]
    }
}

/// Draw a frame centred in `area`
fn draw_centred(frame: &mut Frame, area: Rect, sprite: &SpriteFrame) {
    let height = u16::try_from(sprite.height()).unwrap_or(u16::MAX);
    let top = area.y + area.height.saturating_sub(height) / 2;
    let target = Rect {
        y: top,
        height: area.height.min(height),
        ..area
    };
    let paragraph = Paragraph::new(sprite.lines.clone()).alignment(Alignment::Center);
    frame.render_widget(paragraph, target);
}

impl Artwork for SpriteArtwork {
    fn name(&self) -> &'static str {
        "sprites"
    }

    fn draw_scale(&self, frame: &mut Frame, area: Rect, tilt_degrees: f64) {
        draw_centred(frame, area, self.scale_frame(tilt_degrees));
    }

    fn draw_hammer(&self, frame: &mut Frame, area: Rect, swing_degrees: f64) {
        draw_centred(frame, area, self.hammer_frame(swing_degrees));
    }
}
