//! Depth-tracking boundary scanner.
//!
//! Finds the byte that closes the first opening delimiter in a buffer. In
//! string-aware mode, delimiters inside double-quoted text (with backslash
//! escapes) are ignored, which makes the scanner safe to run over JSON.

use crate::error::{Error, Result};

/// Byte that starts and ends a quoted string.
pub const QUOTE: u8 = b'"';

/// Byte that escapes the following byte inside a quoted string.
pub const ESCAPE: u8 = b'\\';

/// Progress of a scan over one section.
///
/// A fresh state scans from offset 0. The same state can be handed back to
/// [`BoundaryScanner::scan_resume`] after more bytes were appended to the
/// buffer, and the scan continues where it stopped instead of starting over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    depth: usize,
    in_string: bool,
    escaped: bool,
    position: usize,
}

impl ScanState {
    /// Create a state positioned at the start of the buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state positioned at `offset`.
    pub fn at(offset: usize) -> Self {
        Self {
            position: offset,
            ..Self::default()
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the scan is inside a quoted string.
    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// Whether the previous byte was an escape that has not been consumed.
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    /// Index of the next byte the scanner will read.
    pub fn position(&self) -> usize {
        self.position
    }

    /// True when no byte has been consumed since the last reset.
    pub fn is_idle(&self) -> bool {
        self.position == 0 && self.depth == 0 && !self.in_string
    }

    /// Forget all progress and go back to offset 0.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shift the position left after the caller dropped `n` bytes from the
    /// front of its buffer.
    pub(crate) fn rebase(&mut self, n: usize) {
        self.position = self.position.saturating_sub(n);
    }
}

/// Locates the closing delimiter of a nested section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryScanner {
    open: u8,
    close: u8,
    string_aware: bool,
}

impl BoundaryScanner {
    /// Create a scanner that treats every byte as structural.
    pub fn new(open: u8, close: u8) -> Result<Self> {
        Self::build(open, close, false)
    }

    /// Create a scanner that skips delimiters inside quoted strings.
    pub fn string_aware(open: u8, close: u8) -> Result<Self> {
        Self::build(open, close, true)
    }

    /// String-aware scanner for JSON objects.
    pub const fn json_object() -> Self {
        Self {
            open: b'{',
            close: b'}',
            string_aware: true,
        }
    }

    fn build(open: u8, close: u8, string_aware: bool) -> Result<Self> {
        if open == close {
            return Err(Error::InvalidArgument(format!(
                "opening and closing delimiters must differ, both are {:?}",
                open as char
            )));
        }
        Ok(Self {
            open,
            close,
            string_aware,
        })
    }

    /// Opening delimiter.
    pub fn open(&self) -> u8 {
        self.open
    }

    /// Closing delimiter.
    pub fn close(&self) -> u8 {
        self.close
    }

    /// Whether quoted strings are skipped.
    pub fn is_string_aware(&self) -> bool {
        self.string_aware
    }

    /// Scan `buf` from `offset`.
    ///
    /// Returns the absolute index of the delimiter closing the first opener,
    /// or `None` if the buffer ends before the section is closed.
    pub fn scan(&self, buf: &[u8], offset: usize) -> Option<usize> {
        let mut state = ScanState::at(offset);
        self.scan_resume(buf, &mut state)
    }

    /// Continue a scan using persisted state.
    ///
    /// On `None` the state holds everything needed to resume once the caller
    /// has appended more bytes to the same buffer. On `Some` the state points
    /// just past the closing delimiter; reset it before scanning the next
    /// section.
    pub fn scan_resume(&self, buf: &[u8], state: &mut ScanState) -> Option<usize> {
        while state.position < buf.len() {
            let index = state.position;
            let byte = buf[index];
            state.position += 1;

            if state.in_string {
                if state.escaped {
                    state.escaped = false;
                } else if byte == ESCAPE {
                    state.escaped = true;
                } else if byte == QUOTE {
                    state.in_string = false;
                }
                continue;
            }

            if byte == self.open {
                state.depth += 1;
            } else if byte == self.close {
                // A closer before any opener has nothing to close.
                if state.depth > 0 {
                    state.depth -= 1;
                    if state.depth == 0 {
                        return Some(index);
                    }
                }
            } else if self.string_aware && byte == QUOTE {
                state.in_string = true;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn braces() -> BoundaryScanner {
        BoundaryScanner::new(b'{', b'}').unwrap()
    }

    #[test]
    fn test_simple_section() {
        let source = b"{ this is simple }";
        assert_eq!(braces().scan(source, 0), Some(17));
    }

    #[test]
    fn test_broken_section() {
        assert_eq!(braces().scan(b"{ this is simple", 0), None);
    }

    #[test]
    fn test_nested_section() {
        assert_eq!(braces().scan(b"{ this is { simple } }", 0), Some(21));
    }

    #[test]
    fn test_broken_section_with_complete_subsection() {
        assert_eq!(braces().scan(b"{ this is { complex } oups", 0), None);
    }

    #[test]
    fn test_offset_is_absolute() {
        let source = b"xx{ a } { b }";
        assert_eq!(braces().scan(source, 0), Some(6));
        assert_eq!(braces().scan(source, 7), Some(12));
    }

    #[test]
    fn test_ignores_delimiters_in_escaped_string() {
        let source = br#"{ this is "a string \"with escaped quote and sectionChars like } or {{{!" }"#;
        let scanner = BoundaryScanner::string_aware(b'{', b'}').unwrap();
        assert_eq!(scanner.scan(source, 0), Some(74));
    }

    #[test]
    fn test_unterminated_string_is_not_found() {
        let source = br#"{ this is "a string \"with }"#;
        let scanner = BoundaryScanner::string_aware(b'{', b'}').unwrap();
        assert_eq!(scanner.scan(source, 0), None);

        // Without string awareness the same bytes close the section.
        assert_eq!(braces().scan(source, 0), Some(source.len() - 1));
    }

    #[test]
    fn test_equal_delimiters_rejected() {
        assert!(matches!(
            BoundaryScanner::string_aware(b'"', b'"'),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            BoundaryScanner::new(b'[', b'['),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_closer_before_opener_is_ignored() {
        assert_eq!(braces().scan(b"} { x }", 0), Some(6));
    }

    #[test]
    fn test_resume_matches_single_buffer_scan() {
        let source: &[u8] = br#"{"rev":7,"nodes":[{"hostname":"a\"}{"},{"x":{}}]}"#;
        let scanner = BoundaryScanner::json_object();
        let expected = scanner.scan(source, 0);
        assert_eq!(expected, Some(source.len() - 1));

        for split in 1..source.len() {
            let mut state = ScanState::new();
            assert_eq!(scanner.scan_resume(&source[..split], &mut state), None);
            assert_eq!(state.position(), split);
            assert_eq!(scanner.scan_resume(source, &mut state), expected, "split at {}", split);
        }
    }

    #[test]
    fn test_state_tracks_escape_across_chunks() {
        let scanner = BoundaryScanner::json_object();
        let source = br#"{"a\"}"}"#;
        let mut state = ScanState::new();

        // Stop right after the backslash.
        assert_eq!(scanner.scan_resume(&source[..4], &mut state), None);
        assert!(state.in_string());
        assert!(state.is_escaped());
        assert_eq!(state.depth(), 1);

        assert_eq!(scanner.scan_resume(source, &mut state), Some(7));
    }
}
