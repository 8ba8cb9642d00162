//! Terminal Renderer
//!
//! Draws the courtroom into a ratatui terminal, one snapshot per frame.
//!
//! # Layout
//!
//! ```text
//! ┌ Court is in session ──────────────────────────────┐
//! │                                  │      BANG!     │
//! │            scale art             │                │
//! │                                  │   gavel art    │
//! │             Guilty               │ Knocks: 42 17  │
//! └───────────────────────────────────────────────────┘
//!  Last Knock: 1.2s ago (Strength: 42)
//!  /dev/ttyACM0 @ 9600 baud | link ok | scale 712 | q/Esc to quit
//! ```

use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use court_core::{DisplaySnapshot, LinkStatus, RenderError, Renderer, Verdict};

use crate::artwork::Artwork;
use crate::theme;

/// Text drawn next to the gavel just after impact
pub const BANG_TEXT: &str = "BANG!";

/// Colour for a verdict label
pub fn verdict_style(verdict: Verdict) -> Style {
    let color = match verdict {
        Verdict::Innocent => theme::GREEN,
        Verdict::Neutral => theme::INK,
        Verdict::Guilty => theme::RED,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Full-screen courtroom renderer
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    artwork: Box<dyn Artwork>,
    device: String,
}

impl<B: Backend> TerminalRenderer<B> {
    /// Draw into `terminal` with `artwork`
    pub fn new(terminal: Terminal<B>, artwork: Box<dyn Artwork>) -> Self {
        Self {
            terminal,
            artwork,
            device: String::new(),
        }
    }

    /// The terminal being drawn into
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Name of the artwork in use
    pub fn artwork_name(&self) -> &'static str {
        self.artwork.name()
    }
}

/// Draw one courtroom frame
pub fn draw_court(frame: &mut Frame, snapshot: &DisplaySnapshot, artwork: &dyn Artwork, device: &str) {
    let [court, caption, status] = Layout::vertical([
        Constraint::Min(8),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::WOOD))
        .title(" Court is in session ")
        .title_style(Style::default().fg(theme::TITLE));
    let inner = block.inner(court);
    frame.render_widget(block, court);

    let [scale_side, hammer_side] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(inner);

    // Scale with its verdict underneath
    let [scale_art, verdict] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(scale_side);
    artwork.draw_scale(frame, scale_art, snapshot.tilt_degrees);
    frame.render_widget(
        Paragraph::new(Line::styled(
            snapshot.verdict.label(),
            verdict_style(snapshot.verdict),
        ))
        .alignment(Alignment::Center),
        verdict,
    );

    // Gavel with BANG above it and the knock history below
    let [bang, hammer_art, history] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(hammer_side);
    if snapshot.bang_visible {
        frame.render_widget(
            Paragraph::new(Line::styled(
                BANG_TEXT,
                Style::default()
                    .fg(theme::RED)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            bang,
        );
    }
    artwork.draw_hammer(frame, hammer_art, snapshot.hammer_degrees);
    if let Some(text) = snapshot.knock_history() {
        frame.render_widget(
            Paragraph::new(Line::styled(text, Style::default().fg(theme::STATUS)))
                .alignment(Alignment::Center),
            history,
        );
    }

    if let Some(text) = snapshot.knock_caption() {
        frame.render_widget(
            Paragraph::new(Line::styled(format!(" {text}"), Style::default().fg(theme::INK))),
            caption,
        );
    }

    let status_text = format!(
        " {device} | {} | scale {} | q/Esc to quit",
        snapshot.link.label(),
        snapshot.scale_position
    );
    let status_color = match snapshot.link {
        LinkStatus::Unresponsive => theme::RED,
        LinkStatus::Waiting | LinkStatus::Responsive => theme::STATUS,
    };
    frame.render_widget(
        Paragraph::new(Line::styled(status_text, Style::default().fg(status_color))),
        status,
    );
}

/// Draw a single centred message
fn draw_message(frame: &mut Frame, message: &str, style: Style) {
    let area = frame.area();
    let height = 3.min(area.height);
    let target = Rect {
        y: area.y + area.height.saturating_sub(height) / 2,
        height,
        ..area
    };
    frame.render_widget(
        Paragraph::new(Line::styled(message.to_string(), style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        target,
    );
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, snapshot: &DisplaySnapshot) -> Result<(), RenderError> {
        let artwork = self.artwork.as_ref();
        let device = self.device.as_str();
        self.terminal
            .draw(|frame| draw_court(frame, snapshot, artwork, device))?;
        Ok(())
    }

    fn show_connecting(&mut self, target: &str) -> Result<(), RenderError> {
        self.device = target.to_string();
        let message = format!("Connecting to {target}...");
        self.terminal
            .draw(|frame| draw_message(frame, &message, Style::default().fg(theme::GOLD)))?;
        Ok(())
    }

    fn show_failure(&mut self, message: &str) -> Result<(), RenderError> {
        let style = Style::default().fg(theme::RED).add_modifier(Modifier::BOLD);
        self.terminal
            .draw(|frame| draw_message(frame, message, style))?;
        Ok(())
    }
}
