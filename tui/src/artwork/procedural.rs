//! Procedural Artwork
//!
//! Draws the props from primitive shapes on a braille canvas. The canvas
//! uses a fixed 200x200 coordinate space centred on the origin, y up.

use ratatui::layout::Rect;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Line, Rectangle};
use ratatui::Frame;

use super::Artwork;
use crate::theme;

/// Half-extent of the canvas coordinate space
const EXTENT: f64 = 100.0;

// Scale geometry
const BEAM_LENGTH: f64 = 140.0;
const BEAM_Y: f64 = 30.0;
const PAN_DROP: f64 = 28.0;
const PAN_RADIUS: f64 = 16.0;

// Gavel geometry
const HANDLE_LENGTH: f64 = 90.0;
const HEAD_WIDTH: f64 = 44.0;
const HEAD_HEIGHT: f64 = 22.0;
const PIVOT: (f64, f64) = (-10.0, -70.0);

/// Artwork drawn from shapes
#[derive(Clone, Copy, Debug, Default)]
pub struct ProceduralArtwork;

/// Beam end points for a tilt, left then right
fn beam_ends(tilt_degrees: f64) -> ((f64, f64), (f64, f64)) {
    let (sin, cos) = tilt_degrees.to_radians().sin_cos();
    let half = BEAM_LENGTH / 2.0;
    // Positive tilt drops the right-hand pan
    (
        (-half * cos, BEAM_Y + half * sin),
        (half * cos, BEAM_Y - half * sin),
    )
}

/// Top of the gavel handle for a swing angle
fn handle_top(swing_degrees: f64) -> (f64, f64) {
    let (sin, cos) = swing_degrees.to_radians().sin_cos();
    (PIVOT.0 + sin * HANDLE_LENGTH, PIVOT.1 + cos * HANDLE_LENGTH)
}

impl Artwork for ProceduralArtwork {
    fn name(&self) -> &'static str {
        "shapes"
    }

    fn draw_scale(&self, frame: &mut Frame, area: Rect, tilt_degrees: f64) {
        let (left, right) = beam_ends(tilt_degrees);
        let widget = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-EXTENT, EXTENT])
            .y_bounds([-EXTENT, EXTENT])
            .paint(move |ctx| {
                // Base
                ctx.draw(&Rectangle {
                    x: -35.0,
                    y: -80.0,
                    width: 70.0,
                    height: 18.0,
                    color: theme::WOOD,
                });
                // Pivot
                ctx.draw(&Rectangle {
                    x: -6.0,
                    y: -62.0,
                    width: 12.0,
                    height: 96.0,
                    color: theme::GRAY,
                });
                // Beam
                ctx.draw(&Line::new(left.0, left.1, right.0, right.1, theme::GOLD));
                // Pans hang from the beam ends
                for (x, y) in [left, right] {
                    ctx.draw(&Line::new(x, y, x, y - PAN_DROP + PAN_RADIUS, theme::GOLD));
                    ctx.draw(&Circle {
                        x,
                        y: y - PAN_DROP,
                        radius: PAN_RADIUS,
                        color: theme::GOLD,
                    });
                }
            });
        frame.render_widget(widget, area);
    }

    fn draw_hammer(&self, frame: &mut Frame, area: Rect, swing_degrees: f64) {
        let (top_x, top_y) = handle_top(swing_degrees);
        let widget = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([-EXTENT, EXTENT])
            .y_bounds([-EXTENT, EXTENT])
            .paint(move |ctx| {
                ctx.draw(&Line::new(PIVOT.0, PIVOT.1, top_x, top_y, theme::WOOD));
                ctx.draw(&Rectangle {
                    x: top_x - HEAD_WIDTH / 2.0,
                    y: top_y - HEAD_HEIGHT / 2.0,
                    width: HEAD_WIDTH,
                    height: HEAD_HEIGHT,
                    color: theme::WOOD,
                });
                // Sound block
                ctx.draw(&Rectangle {
                    x: -60.0,
                    y: -85.0,
                    width: 40.0,
                    height: 10.0,
                    color: theme::GRAY,
                });
            });
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_level_beam() {
        let (left, right) = beam_ends(0.0);
        assert!(close(left, (-70.0, BEAM_Y)));
        assert!(close(right, (70.0, BEAM_Y)));
    }

    #[test]
    fn test_guilty_tilt_drops_right_pan() {
        let (left, right) = beam_ends(30.0);
        assert!(right.1 < BEAM_Y);
        assert!(left.1 > BEAM_Y);
        assert!(close(right, (70.0 * 30f64.to_radians().cos(), BEAM_Y - 35.0)));
    }

    #[test]
    fn test_resting_gavel_points_up() {
        assert!(close(handle_top(0.0), (PIVOT.0, PIVOT.1 + HANDLE_LENGTH)));
        let raised = handle_top(40.0);
        assert!(raised.0 > PIVOT.0);
        assert!(raised.1 < PIVOT.1 + HANDLE_LENGTH);
    }
}
