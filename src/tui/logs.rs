//! Operation log panel — bounded ring buffer with a noise filter.
//!
//! Engine output is noisy: progress repaints leave artifacts once the
//! terminal control bytes are gone. The filter rules for those artifacts
//! are specific to this engine's output encoding, so they live behind a
//! trait and can be swapped per controller.

use regex::Regex;

/// Hard capacity of the log panel.
pub const LOG_CAPACITY: usize = 400;

/// Decides whether a line is real output or rendering noise.
pub trait LineFilter: Send {
    fn accept(&self, line: &str) -> bool;
}

/// Single characters that are legitimate one-character tool output.
const BRACKET_ALLOWLIST: &[char] = &['[', ']', '{', '}', '(', ')', '<', '>', '|'];

/// Noise rules observed in docker compose output.
pub struct ComposeNoiseFilter {
    erase_remnant: Regex,
}

impl Default for ComposeNoiseFilter {
    fn default() -> Self {
        Self {
            // Progress repaints emit ESC[K / ESC[2K; once the ESC byte is
            // consumed by the pty the line arrives starting with "[K".
            erase_remnant: Regex::new(r"^\[[0-9]*K").expect("static regex"),
        }
    }
}

impl LineFilter for ComposeNoiseFilter {
    fn accept(&self, line: &str) -> bool {
        if line.chars().any(|c| c.is_control() && c != '\t') {
            return false;
        }
        let mut chars = line.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            return BRACKET_ALLOWLIST.contains(&first);
        }
        !self.erase_remnant.is_match(line)
    }
}

/// Accepts everything. For controllers with clean output, and for tests.
pub struct PassthroughFilter;

impl LineFilter for PassthroughFilter {
    fn accept(&self, _line: &str) -> bool {
        true
    }
}

/// FIFO-trimmed log storage. Empty-after-trim lines never enter,
/// regardless of filter.
pub struct LogRing {
    lines: Vec<String>,
    capacity: usize,
    filter: Box<dyn LineFilter>,
}

impl LogRing {
    pub fn new() -> Self {
        Self::with_filter(LOG_CAPACITY, Box::new(ComposeNoiseFilter::default()))
    }

    pub fn with_filter(capacity: usize, filter: Box<dyn LineFilter>) -> Self {
        Self {
            lines: Vec::new(),
            capacity,
            filter,
        }
    }

    /// Filter and append. Returns whether the line was kept.
    pub fn push(&mut self, line: &str) -> bool {
        let line = line.trim_end();
        if line.trim().is_empty() {
            return false;
        }
        if !self.filter.accept(line) {
            return false;
        }
        self.lines.push(line.to_string());
        while self.lines.len() > self.capacity {
            self.lines.remove(0);
        }
        true
    }

    /// Replace contents wholesale with already-filtered lines.
    pub fn restore(&mut self, mut lines: Vec<String>) {
        if lines.len() > self.capacity {
            lines.drain(..lines.len() - self.capacity);
        }
        self.lines = lines;
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_enforced() {
        let mut ring = LogRing::new();
        for i in 0..500 {
            ring.push(&format!("line {i}"));
        }
        assert_eq!(ring.len(), LOG_CAPACITY);
        // Oldest trimmed first.
        assert_eq!(ring.lines()[0], "line 100");
        assert_eq!(ring.lines()[LOG_CAPACITY - 1], "line 499");
    }

    #[test]
    fn empty_lines_rejected() {
        let mut ring = LogRing::new();
        assert!(!ring.push(""));
        assert!(!ring.push("   "));
        assert!(!ring.push("\t"));
        assert!(ring.is_empty());
    }

    #[test]
    fn single_char_needs_allowlist() {
        let mut ring = LogRing::new();
        assert!(!ring.push("x"));
        assert!(!ring.push("7"));
        assert!(ring.push("]"));
        assert!(ring.push("{"));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn control_characters_rejected() {
        let mut ring = LogRing::new();
        assert!(!ring.push("bad \x1b[32mcolor"));
        assert!(!ring.push("bell\x07"));
        assert!(ring.push("tabs\tare fine"));
    }

    #[test]
    fn erase_remnant_prefix_rejected() {
        let mut ring = LogRing::new();
        assert!(!ring.push("[K pulling fs layer"));
        assert!(!ring.push("[2Kdone"));
        assert!(ring.push("[ok] service started"));
    }

    #[test]
    fn passthrough_filter_keeps_noise() {
        let mut ring = LogRing::with_filter(10, Box::new(PassthroughFilter));
        assert!(ring.push("x"));
        assert!(ring.push("[K artifact"));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn restore_replaces_and_trims() {
        let mut ring = LogRing::with_filter(3, Box::new(PassthroughFilter));
        ring.push("old");
        ring.restore(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(ring.lines(), &["b", "c", "d"]);
    }

    #[test]
    fn trailing_whitespace_trimmed() {
        let mut ring = LogRing::new();
        assert!(ring.push("line   "));
        assert_eq!(ring.lines()[0], "line");
    }
}
