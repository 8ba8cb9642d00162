//! Line Framing
//!
//! Splits the raw byte stream into newline-terminated lines.
//!
//! # Wire Format
//!
//! ```text
//! SCALE:712\r\n
//! KNOCK:38\n
//! END\n
//! ```
//!
//! Lines may end in `\n` or `\r\n` and may arrive split across any number
//! of reads. Bytes are decoded as UTF-8 with invalid sequences replaced by
//! U+FFFD, so one corrupted byte never costs more than its own line.
//!
//! # Garbage Protection
//!
//! A partial line longer than [`MAX_LINE_LEN`] without a terminator is
//! dropped (baud mismatch noise, a device stuck printing without newlines).

use tracing::debug;

/// Longest partial line kept while waiting for its terminator
pub const MAX_LINE_LEN: usize = 256;

/// Minimum buffer capacity
const MIN_BUFFER_CAPACITY: usize = 512;

/// Incremental line splitter
#[derive(Debug)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    /// Position where we've consumed up to
    read_pos: usize,
    /// Tail of a dropped over-long line is still arriving
    skipping: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MIN_BUFFER_CAPACITY),
            read_pos: 0,
            skipping: false,
        }
    }

    /// Append received bytes
    pub fn push(&mut self, data: &[u8]) {
        let data = if self.skipping {
            match data.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.skipping = false;
                    &data[end + 1..]
                }
                None => return,
            }
        } else {
            data
        };

        // Compact once the consumed prefix dominates
        if self.read_pos > self.buffer.len() / 2 && self.read_pos > MIN_BUFFER_CAPACITY {
            self.buffer.drain(..self.read_pos);
            self.read_pos = 0;
        }
        self.buffer.extend_from_slice(data);
        self.enforce_limit();
    }

    /// Number of unconsumed bytes
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.read_pos
    }

    /// Pop the next complete line, trimmed of surrounding whitespace
    pub fn next_line(&mut self) -> Option<String> {
        let pending = &self.buffer[self.read_pos..];
        let newline = pending.iter().position(|&b| b == b'\n')?;
        let line = String::from_utf8_lossy(&pending[..newline]).trim().to_string();
        self.read_pos += newline + 1;
        Some(line)
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.read_pos = 0;
        self.skipping = false;
    }

    fn enforce_limit(&mut self) {
        let pending = &self.buffer[self.read_pos..];
        let partial = match pending.iter().rposition(|&b| b == b'\n') {
            Some(last_newline) => &pending[last_newline + 1..],
            None => pending,
        };
        if partial.len() > MAX_LINE_LEN {
            debug!(bytes = partial.len(), "Dropping over-long partial line");
            let keep = self.buffer.len() - partial.len();
            self.buffer.truncate(keep);
            self.skipping = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain(buf: &mut LineBuffer) -> Vec<String> {
        std::iter::from_fn(|| buf.next_line()).collect()
    }

    #[test]
    fn test_complete_lines() {
        let mut buf = LineBuffer::new();
        buf.push(b"SCALE:700\nKNOCK:3\nEND\n");
        assert_eq!(drain(&mut buf), vec!["SCALE:700", "KNOCK:3", "END"]);
        assert_eq!(buf.available(), 0);
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut buf = LineBuffer::new();
        buf.push(b"SCA");
        assert_eq!(buf.next_line(), None);
        buf.push(b"LE:12");
        assert_eq!(buf.next_line(), None);
        buf.push(b"3\r\nE");
        assert_eq!(buf.next_line().as_deref(), Some("SCALE:123"));
        assert_eq!(buf.next_line(), None);
        buf.push(b"ND\n");
        assert_eq!(buf.next_line().as_deref(), Some("END"));
    }

    #[test]
    fn test_crlf_and_whitespace_trimmed() {
        let mut buf = LineBuffer::new();
        buf.push(b"  END \r\n");
        assert_eq!(buf.next_line().as_deref(), Some("END"));
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut buf = LineBuffer::new();
        buf.push(b"KNOCK:\xff\xfe\nEND\n");
        assert_eq!(buf.next_line().as_deref(), Some("KNOCK:\u{fffd}\u{fffd}"));
        assert_eq!(buf.next_line().as_deref(), Some("END"));
    }

    #[test]
    fn test_overlong_partial_line_dropped() {
        let mut buf = LineBuffer::new();
        buf.push(&[b'x'; MAX_LINE_LEN + 10]);
        assert_eq!(buf.available(), 0);

        // Rest of the runaway line is skipped, the next one survives
        buf.push(b"xxxx\nEND\n");
        assert_eq!(drain(&mut buf), vec!["END"]);
    }

    #[test]
    fn test_complete_lines_kept_when_partial_overflows() {
        let mut buf = LineBuffer::new();
        let mut data = b"SCALE:1\n".to_vec();
        data.extend_from_slice(&[b'?'; MAX_LINE_LEN + 1]);
        buf.push(&data);
        assert_eq!(buf.next_line().as_deref(), Some("SCALE:1"));
        assert_eq!(buf.next_line(), None);
    }

    #[test]
    fn test_clear() {
        let mut buf = LineBuffer::new();
        buf.push(b"SCALE:1\nSCA");
        buf.clear();
        assert_eq!(buf.available(), 0);
        buf.push(b"END\n");
        assert_eq!(drain(&mut buf), vec!["END"]);
    }

    #[test]
    fn test_compaction_preserves_content() {
        let mut buf = LineBuffer::new();
        for i in 0..500 {
            buf.push(format!("SCALE:{i}\n").as_bytes());
            assert_eq!(buf.next_line(), Some(format!("SCALE:{i}")));
        }
        assert_eq!(buf.available(), 0);
    }
}
