//! Headless Surface
//!
//! Writes the session as JSON lines instead of drawing it, for running
//! without a terminal (CI, piping into other tools, soak tests on the
//! bench).
//!
//! ```text
//! {"event":"connecting","target":"/dev/ttyACM0 @ 9600 baud"}
//! {"event":"frame","scale_position":700,"verdict":"Guilty",...,"link":"responsive"}
//! {"event":"failure","message":"Serial connection error: ..."}
//! ```
//!
//! A frame is written only when something visible changed, so an idle
//! court does not flood the output at the frame rate. The knock caption's
//! running clock does not count as a change.

use std::io::Write;

use court_core::{DisplaySnapshot, LinkStatus, RenderError, Renderer};
use serde::Serialize;

/// One output line
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum HeadlessEvent<'a> {
    Connecting {
        target: &'a str,
    },
    Frame {
        #[serde(flatten)]
        snapshot: &'a DisplaySnapshot,
    },
    Failure {
        message: &'a str,
    },
}

/// What must differ for a frame to be written again
#[derive(Clone, Debug, PartialEq)]
struct FrameKey {
    scale_position: u16,
    animation_step: u8,
    knock_strength: u32,
    caption_visible: bool,
    recent_knocks: Vec<u32>,
    link: LinkStatus,
}

impl From<&DisplaySnapshot> for FrameKey {
    fn from(snapshot: &DisplaySnapshot) -> Self {
        Self {
            scale_position: snapshot.scale_position,
            animation_step: snapshot.animation_step,
            knock_strength: snapshot.knock_strength,
            caption_visible: snapshot.seconds_since_knock.is_some(),
            recent_knocks: snapshot.recent_knocks.clone(),
            link: snapshot.link,
        }
    }
}

/// JSON-lines renderer
#[derive(Debug)]
pub struct HeadlessRenderer<W: Write> {
    out: W,
    last: Option<FrameKey>,
    written: usize,
}

impl<W: Write> HeadlessRenderer<W> {
    /// Write events to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: None,
            written: 0,
        }
    }

    /// Frames written so far
    pub fn frames_written(&self) -> usize {
        self.written
    }

    /// The underlying writer
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn emit(&mut self, event: &HeadlessEvent<'_>) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, event).map_err(std::io::Error::from)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Renderer for HeadlessRenderer<W> {
    fn render(&mut self, snapshot: &DisplaySnapshot) -> Result<(), RenderError> {
        let key = FrameKey::from(snapshot);
        if self.last.as_ref() == Some(&key) {
            return Ok(());
        }
        self.last = Some(key);
        self.written += 1;
        self.emit(&HeadlessEvent::Frame { snapshot })
    }

    fn show_connecting(&mut self, target: &str) -> Result<(), RenderError> {
        self.emit(&HeadlessEvent::Connecting { target })
    }

    fn show_failure(&mut self, message: &str) -> Result<(), RenderError> {
        self.emit(&HeadlessEvent::Failure { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use court_core::Verdict;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn snapshot(position: u16, step: u8) -> DisplaySnapshot {
        DisplaySnapshot {
            scale_position: position,
            verdict: Verdict::from_position(position),
            tilt_degrees: 0.0,
            animation_step: step,
            hammer_degrees: 0.0,
            bang_visible: false,
            knock_strength: 0,
            seconds_since_knock: None,
            recent_knocks: Vec::new(),
            link: LinkStatus::Responsive,
        }
    }

    fn lines(renderer: &HeadlessRenderer<Vec<u8>>) -> Vec<Value> {
        String::from_utf8_lossy(renderer.get_ref())
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_event_shapes() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        renderer.show_connecting("simulator").unwrap();
        renderer.render(&snapshot(700, 0)).unwrap();
        renderer
            .show_failure("Serial connection error: gone")
            .unwrap();

        let out = lines(&renderer);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["event"], "connecting");
        assert_eq!(out[0]["target"], "simulator");
        assert_eq!(out[1]["event"], "frame");
        assert_eq!(out[1]["scale_position"], 700);
        assert_eq!(out[1]["verdict"], "Guilty");
        assert!(out[1].get("seconds_since_knock").is_none());
        assert_eq!(out[2]["event"], "failure");
        assert_eq!(out[2]["message"], "Serial connection error: gone");
    }

    #[test]
    fn test_unchanged_frames_are_skipped() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        for _ in 0..10 {
            renderer.render(&snapshot(512, 0)).unwrap();
        }
        renderer.render(&snapshot(513, 0)).unwrap();
        renderer.render(&snapshot(513, 2)).unwrap();
        assert_eq!(renderer.frames_written(), 3);
        assert_eq!(lines(&renderer).len(), 3);
    }

    #[test]
    fn test_caption_clock_alone_is_not_a_change() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        let mut snap = snapshot(512, 0);
        snap.knock_strength = 9;
        snap.seconds_since_knock = Some(0.5);
        renderer.render(&snap).unwrap();
        snap.seconds_since_knock = Some(0.6);
        renderer.render(&snap).unwrap();
        snap.seconds_since_knock = None;
        renderer.render(&snap).unwrap();

        let out = lines(&renderer);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["seconds_since_knock"], 0.5);
        assert!(out[1].get("seconds_since_knock").is_none());
    }

    #[test]
    fn test_link_change_is_written() {
        let mut renderer = HeadlessRenderer::new(Vec::new());
        let mut snap = snapshot(512, 0);
        renderer.render(&snap).unwrap();
        snap.link = LinkStatus::Unresponsive;
        renderer.render(&snap).unwrap();
        renderer.render(&snap).unwrap();

        let out = lines(&renderer);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["link"], "responsive");
        assert_eq!(out[1]["link"], "unresponsive");
    }
}
