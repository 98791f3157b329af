//! Diagram block extraction from Markdown text.
//!
//! Walks the document line by line and tracks code fences the way `CommonMark`
//! does: a fence opens with three or more backticks or tildes and closes with
//! the same character repeated at least as many times. Every closed fence whose
//! info string starts with `mermaid` becomes a [`DiagramBlock`].
//!
//! Other fences are skipped as a whole, so Mermaid examples quoted inside a
//! longer fence are left alone. A fence that never closes is not a block, and
//! as in `CommonMark` it runs to the end of the document, so nothing after it
//! is scanned.

use std::ops::Range;

/// Info string word that marks a diagram fence.
const DIAGRAM_TAG: &str = "mermaid";

/// A fenced diagram region of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// One-based position among the document's diagram blocks.
    pub index: usize,
    /// One-based line number of the opening fence.
    pub line: usize,
    /// Byte offset of the opening fence line.
    pub start: usize,
    /// Byte offset just past the closing fence line, including its line break.
    pub end: usize,
    /// Diagram source between the fences, without the final line break.
    pub source: String,
}

impl DiagramBlock {
    /// Byte range of the whole fenced region.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A line of the document with its byte offsets.
struct Line<'a> {
    start: usize,
    /// Offset past the line terminator.
    end: usize,
    /// Line content without `\n` or `\r\n`.
    content: &'a str,
}

impl Line<'_> {
    /// Offset of the line terminator (end of content).
    fn content_end(&self) -> usize {
        self.start + self.content.len()
    }
}

/// An opening code fence.
struct Fence<'a> {
    ch: char,
    len: usize,
    info: &'a str,
}

impl Fence<'_> {
    fn is_diagram(&self) -> bool {
        self.info
            .split_whitespace()
            .next()
            .is_some_and(|word| word.eq_ignore_ascii_case(DIAGRAM_TAG))
    }
}

/// Find all diagram blocks in `text`, in order of appearance.
///
/// Returns an empty Vec for documents without diagram blocks. Blocks with only
/// whitespace between the fences are not counted.
#[must_use]
pub fn scan(text: &str) -> Vec<DiagramBlock> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(fence) = opening_fence(lines[i].content) else {
            i += 1;
            continue;
        };

        let Some(close) = lines[i + 1..]
            .iter()
            .position(|line| is_closing_fence(line.content, &fence))
            .map(|offset| i + 1 + offset)
        else {
            // Unclosed fence: the rest of the document is its content
            break;
        };

        if fence.is_diagram() {
            let body_start = lines[i].end;
            let body_end = if close == i + 1 {
                body_start
            } else {
                lines[close - 1].content_end()
            };
            let source = &text[body_start..body_end];

            if !source.trim().is_empty() {
                blocks.push(DiagramBlock {
                    index: blocks.len() + 1,
                    line: i + 1,
                    start: lines[i].start,
                    end: lines[close].end,
                    source: source.to_owned(),
                });
            }
        }

        i = close + 1;
    }

    blocks
}

/// Split text into lines, keeping byte offsets.
fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            let content = raw
                .strip_suffix('\n')
                .map_or(raw, |l| l.strip_suffix('\r').unwrap_or(l));
            Line {
                start,
                end: offset,
                content,
            }
        })
        .collect()
}

/// Strip up to three spaces of indentation. Returns `None` for deeper indents.
fn strip_indent(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    (indent <= 3).then(|| &line[indent..])
}

/// Detect an opening fence and its info string.
fn opening_fence(line: &str) -> Option<Fence<'_>> {
    let trimmed = strip_indent(line)?;
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }

    let len = trimmed.chars().take_while(|&c| c == ch).count();
    if len < 3 {
        return None;
    }

    let info = trimmed[len..].trim();
    // Backtick fences cannot carry backticks in their info string
    if ch == '`' && info.contains('`') {
        return None;
    }

    Some(Fence { ch, len, info })
}

/// Check if a line closes the given fence.
///
/// The closing fence must use the same character, be at least as long as the
/// opening fence, and contain nothing else but whitespace.
fn is_closing_fence(line: &str, fence: &Fence<'_>) -> bool {
    let Some(trimmed) = strip_indent(line) else {
        return false;
    };

    let count = trimmed.chars().take_while(|&c| c == fence.ch).count();
    count >= fence.len && trimmed[count..].chars().all(char::is_whitespace)
}
