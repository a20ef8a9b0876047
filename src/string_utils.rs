//! UTF-8 safe string and line utilities
//!
//! Document positions in this crate are byte offsets. Anything that moves a
//! position by a number of *characters* (the delimiter reveal radius, cursor
//! columns reported by rules) goes through these helpers so that multi-byte
//! characters like `ø`, `中` or `🎉` never split.

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest index `<= index` that is on a UTF-8 character boundary.
///
/// Indices past the end clamp to the string length.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i > 0 && !is_utf8_char_start(bytes[i]) {
        i -= 1;
    }
    i
}

/// Returns the smallest index `>= index` that is on a UTF-8 character boundary.
#[inline]
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i < bytes.len() && !is_utf8_char_start(bytes[i]) {
        i += 1;
    }
    i
}

/// A byte is a char start unless it is a continuation byte (10xxxxxx).
#[inline]
fn is_utf8_char_start(byte: u8) -> bool {
    (byte & 0b1100_0000) != 0b1000_0000
}

// ─────────────────────────────────────────────────────────────────────────────
// Character Stepping
// ─────────────────────────────────────────────────────────────────────────────

/// Move `index` back by `count` characters, stopping at 0.
pub fn step_back_chars(s: &str, index: usize, count: usize) -> usize {
    let start = floor_char_boundary(s, index);
    s[..start]
        .char_indices()
        .rev()
        .take(count)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start)
}

/// Move `index` forward by `count` characters.
///
/// Steps that would run past the end of `s` are counted as one byte each, so
/// a window computed near the end of a document keeps its nominal width.
pub fn step_forward_chars(s: &str, index: usize, count: usize) -> usize {
    let start = ceil_char_boundary(s, index);
    let mut offset = start;
    let mut remaining = count;
    for ch in s[start..].chars() {
        if remaining == 0 {
            break;
        }
        offset += ch.len_utf8();
        remaining -= 1;
    }
    offset + remaining
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Indexing
// ─────────────────────────────────────────────────────────────────────────────

/// Byte offsets of the start of every `\n`-separated line in a document.
///
/// An empty document has exactly one (empty) line, matching how editor
/// widgets count lines.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, starts }
    }

    /// Number of lines in the document.
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based line number containing the byte `offset`.
    pub fn line_at(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(exact) => exact + 1,
            Err(insert_at) => insert_at,
        }
    }

    /// Byte offset where the 1-based `line` starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line.checked_sub(1)?).copied()
    }

    /// Text of the 1-based `line`, without its trailing newline.
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = self.line_start(line)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some(&self.text[start..end])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_norwegian() {
        let s = "Hei på deg"; // 'å' occupies bytes 5..7
        assert_eq!(floor_char_boundary(s, 6), 5);
        assert_eq!(floor_char_boundary(s, 5), 5);
        assert_eq!(floor_char_boundary(s, 100), s.len());
    }

    #[test]
    fn test_ceil_chinese() {
        let s = "Hello 世界";
        assert_eq!(ceil_char_boundary(s, 7), 9);
        assert_eq!(ceil_char_boundary(s, 6), 6);
    }

    #[test]
    fn test_step_back_chars() {
        let s = "a世b";
        assert_eq!(step_back_chars(s, 4, 1), 1);
        assert_eq!(step_back_chars(s, 4, 2), 0);
        assert_eq!(step_back_chars(s, 4, 5), 0);
        assert_eq!(step_back_chars(s, 0, 1), 0);
    }

    #[test]
    fn test_step_forward_chars() {
        let s = "a世b";
        assert_eq!(step_forward_chars(s, 1, 1), 4);
        assert_eq!(step_forward_chars(s, 1, 2), 5);
        // Past the end keeps counting bytes
        assert_eq!(step_forward_chars(s, 4, 3), 7);
    }

    #[test]
    fn test_line_index_lookup() {
        let doc = "# Title\n\nbody\n";
        let index = LineIndex::new(doc);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_at(0), 1);
        assert_eq!(index.line_at(7), 1);
        assert_eq!(index.line_at(8), 2);
        assert_eq!(index.line_at(9), 3);
        assert_eq!(index.line_text(1), Some("# Title"));
        assert_eq!(index.line_text(2), Some(""));
        assert_eq!(index.line_text(3), Some("body"));
        assert_eq!(index.line_text(4), Some(""));
        assert_eq!(index.line_text(5), None);
        assert_eq!(index.line_text(0), None);
    }

    #[test]
    fn test_line_index_empty_document() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_text(1), Some(""));
    }
}
