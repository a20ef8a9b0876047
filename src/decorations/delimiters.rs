//! Markdown delimiter scanning
//!
//! Finds the syntax characters of one line: block markers at the start of
//! the line and paired inline markers anywhere in it. Scanning is purely
//! lexical and line-local. Unbalanced markers are never paired.
//!
//! Every marker is ASCII, so byte offsets found here are always on
//! character boundaries.

use regex::Regex;
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of syntax a delimiter belongs to. Declaration order breaks ties
/// between delimiters covering the same span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DelimiterToken {
    Heading,
    UnorderedList,
    OrderedList,
    Blockquote,
    Fence,
    Strong,
    Emphasis,
    InlineCode,
    LinkLabel,
    LinkUrl,
    Strikethrough,
}

impl DelimiterToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelimiterToken::Heading => "heading",
            DelimiterToken::UnorderedList => "unordered-list",
            DelimiterToken::OrderedList => "ordered-list",
            DelimiterToken::Blockquote => "blockquote",
            DelimiterToken::Fence => "fence",
            DelimiterToken::Strong => "strong",
            DelimiterToken::Emphasis => "emphasis",
            DelimiterToken::InlineCode => "inline-code",
            DelimiterToken::LinkLabel => "link-label",
            DelimiterToken::LinkUrl => "link-url",
            DelimiterToken::Strikethrough => "strikethrough",
        }
    }

    /// Class for the text between a pair of these delimiters.
    pub fn content_class(&self) -> Option<&'static str> {
        match self {
            DelimiterToken::Strong => Some("cm-strong"),
            DelimiterToken::Emphasis => Some("cm-emphasis"),
            DelimiterToken::Strikethrough => Some("cm-strikethrough"),
            DelimiterToken::InlineCode => Some("cm-inline-code"),
            _ => None,
        }
    }
}

/// A run of syntax characters, in document byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterRange {
    pub from: usize,
    pub to: usize,
    pub token: DelimiterToken,
    /// 1-based line the delimiter sits on
    pub line: usize,
}

/// Text styled by a pair of delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub from: usize,
    pub to: usize,
    pub class: &'static str,
}

/// Everything found on one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineScan {
    /// Sorted by start, end, then token order
    pub delimiters: Vec<DelimiterRange>,
    /// Sorted by start
    pub content: Vec<ContentRange>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scanner
// ─────────────────────────────────────────────────────────────────────────────

static_pattern!(heading_marker, r"^(\s*)(#{1,6}\s+)");
static_pattern!(unordered_list_marker, r"^(\s*)([-*+]\s+)");
static_pattern!(ordered_list_marker, r"^(\s*)(\d+\.\s+)");
static_pattern!(blockquote_marker, r"^(\s*)(>\s?)");
static_pattern!(fence_marker, r"^(\s*)(`{3,}|~{3,})");

/// Whether the byte at `index` is escaped by an odd run of backslashes.
pub fn is_escaped(text: &[u8], index: usize) -> bool {
    let slashes = text[..index.min(text.len())]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count();
    slashes % 2 == 1
}

struct LineScanner<'a> {
    bytes: &'a [u8],
    line_from: usize,
    line: usize,
    scan: LineScan,
}

impl<'a> LineScanner<'a> {
    fn push(&mut self, from: usize, to: usize, token: DelimiterToken) {
        self.scan.delimiters.push(DelimiterRange {
            from: self.line_from + from,
            to: self.line_from + to,
            token,
            line: self.line,
        });
    }

    fn push_pair(&mut self, start: usize, end: usize, len: usize, token: DelimiterToken) {
        self.push(start, start + len, token);
        self.push(end, end + len, token);
        if let Some(class) = token.content_class() {
            if end > start + len {
                self.scan.content.push(ContentRange {
                    from: self.line_from + start + len,
                    to: self.line_from + end,
                    class,
                });
            }
        }
    }

    /// Prefix marker captured by group 2, after indentation in group 1.
    fn block_marker(&mut self, text: &str, pattern: &Regex, token: DelimiterToken) -> bool {
        let Some(caps) = pattern.captures(text) else {
            return false;
        };
        let indent = caps[1].len();
        self.push(indent, indent + caps[2].len(), token);
        true
    }

    fn block_markers(&mut self, text: &str) {
        let exclusive = [
            (heading_marker(), DelimiterToken::Heading),
            (unordered_list_marker(), DelimiterToken::UnorderedList),
            (ordered_list_marker(), DelimiterToken::OrderedList),
            (blockquote_marker(), DelimiterToken::Blockquote),
        ];
        for (pattern, token) in exclusive {
            if self.block_marker(text, pattern, token) {
                break;
            }
        }
        self.block_marker(text, fence_marker(), DelimiterToken::Fence);
    }

    /// Pair up occurrences of `marker`, innermost first.
    ///
    /// With `no_adjacent`, a marker touching that byte on either side is
    /// part of a longer run and skipped.
    fn paired_markers(&mut self, marker: &[u8], token: DelimiterToken, no_adjacent: Option<u8>) {
        let bytes = self.bytes;
        let len = marker.len();
        let mut open: Vec<usize> = Vec::new();
        let mut index = 0;

        while index + len <= bytes.len() {
            if &bytes[index..index + len] != marker || is_escaped(bytes, index) {
                index += 1;
                continue;
            }

            if let Some(run) = no_adjacent {
                let before = index > 0 && bytes[index - 1] == run;
                let after = bytes.get(index + len) == Some(&run);
                if before || after {
                    index += len;
                    continue;
                }
            }

            match open.pop() {
                Some(start) => {
                    if index > start {
                        self.push_pair(start, index, len, token);
                    }
                }
                None => open.push(index),
            }
            index += len;
        }
    }

    /// Single backticks only; runs of two or more are skipped.
    fn inline_code(&mut self) {
        let bytes = self.bytes;
        let mut open: Vec<usize> = Vec::new();

        for index in 0..bytes.len() {
            if bytes[index] != b'`' || is_escaped(bytes, index) {
                continue;
            }
            let before = index > 0 && bytes[index - 1] == b'`';
            let after = bytes.get(index + 1) == Some(&b'`');
            if before || after {
                continue;
            }

            match open.pop() {
                Some(start) => {
                    if index > start + 1 {
                        self.push_pair(start, index, 1, DelimiterToken::InlineCode);
                    }
                }
                None => open.push(index),
            }
        }
    }

    fn first_unescaped(&self, byte: u8, from: usize) -> Option<usize> {
        (from..self.bytes.len())
            .find(|&cursor| self.bytes[cursor] == byte && !is_escaped(self.bytes, cursor))
    }

    /// `[label](url)` with a non-empty label and url.
    fn links(&mut self) {
        let bytes = self.bytes;
        let mut index = 0;

        while index < bytes.len() {
            if bytes[index] != b'[' || is_escaped(bytes, index) {
                index += 1;
                continue;
            }

            let Some(label_end) = self.first_unescaped(b']', index + 1) else {
                index += 1;
                continue;
            };
            let opens_url = bytes.get(label_end + 1) == Some(&b'(');
            let has_url = matches!(bytes.get(label_end + 2), Some(b) if *b != b')');
            if label_end <= index + 1 || !opens_url || !has_url {
                index += 1;
                continue;
            }

            let Some(url_end) = self.first_unescaped(b')', label_end + 2) else {
                index += 1;
                continue;
            };
            if url_end <= label_end + 2 {
                index += 1;
                continue;
            }

            self.push(index, index + 1, DelimiterToken::LinkLabel);
            self.push(label_end, label_end + 1, DelimiterToken::LinkLabel);
            self.push(label_end + 1, label_end + 2, DelimiterToken::LinkUrl);
            self.push(url_end, url_end + 1, DelimiterToken::LinkUrl);
            index = url_end + 1;
        }
    }

    fn finish(mut self) -> LineScan {
        self.scan
            .delimiters
            .sort_by_key(|range| (range.from, range.to, range.token));
        self.scan.content.sort_by_key(|range| range.from);
        self.scan
    }
}

/// Scan one line of text that starts at byte `line_from` of the document.
pub fn scan_line(text: &str, line_from: usize, line: usize) -> LineScan {
    let mut scanner = LineScanner {
        bytes: text.as_bytes(),
        line_from,
        line,
        scan: LineScan::default(),
    };

    scanner.block_markers(text);
    scanner.paired_markers(b"**", DelimiterToken::Strong, None);
    scanner.paired_markers(b"__", DelimiterToken::Strong, None);
    scanner.paired_markers(b"~~", DelimiterToken::Strikethrough, None);
    scanner.paired_markers(b"*", DelimiterToken::Emphasis, Some(b'*'));
    scanner.paired_markers(b"_", DelimiterToken::Emphasis, Some(b'_'));
    scanner.inline_code();
    scanner.links();
    scanner.finish()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
