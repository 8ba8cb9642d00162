//! Theme and Colors
//!
//! Courtroom palette: polished wood, brass fittings, and the two verdict
//! colours.

use ratatui::style::Color;

// ============================================================================
// Courtroom Palette
// ============================================================================

/// Gavel and scale base
pub const WOOD: Color = Color::Rgb(160, 120, 80);

/// Scale beam and pans
pub const GOLD: Color = Color::Rgb(218, 165, 32);

/// Scale pivot, dim text
pub const GRAY: Color = Color::Rgb(100, 100, 100);

/// "Guilty", "BANG!", errors
pub const RED: Color = Color::Rgb(200, 50, 50);

/// "Innocent"
pub const GREEN: Color = Color::Rgb(50, 200, 50);

/// "Neutral" and captions
pub const INK: Color = Color::Rgb(230, 230, 230);

// ============================================================================
// UI Colors
// ============================================================================

/// Title bar accent
pub const TITLE: Color = GOLD;

/// Status line text
pub const STATUS: Color = GRAY;
