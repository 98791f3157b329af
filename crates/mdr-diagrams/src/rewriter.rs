//! Markdown rewriting around rendered diagrams.
//!
//! Given the scanned blocks whose images are available, produces the new
//! document text for a [`RenderMode`]:
//!
//! - `Export` returns the text unchanged.
//! - `Replace` swaps each block for an image reference.
//! - `Keep` leaves each block verbatim and follows it with an annotation: a
//!   blank line, an image reference and a marker comment naming the image file.
//!
//! The marker lets later runs recognize their own annotation. A matching marker
//! leaves the text alone, a stale one is replaced, and `Replace` consumes it
//! together with the block it belongs to.

use std::sync::LazyLock;

use regex::Regex;

use crate::consts::{MARKER_PREFIX, MARKER_SUFFIX};
use crate::format::RenderMode;
use crate::scanner::DiagramBlock;

/// Annotation directly after a block: optional blank line, optional image
/// line, then the marker comment.
static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:[ \t]*\r?\n)?(?:[ \t]*!\[[^\]\n]*\]\([^)\n]*\)[ \t]*\r?\n)?[ \t]*{}(\S+?){}[ \t]*(?:\r?\n|$)",
        regex::escape(MARKER_PREFIX),
        regex::escape(MARKER_SUFFIX),
    ))
    .unwrap()
});

/// A block whose image exists and may be referenced from the document.
#[derive(Debug, Clone, Copy)]
pub struct RewriteTarget<'a> {
    pub block: &'a DiagramBlock,
    /// Image file name, recorded in the marker comment.
    pub file_name: &'a str,
    /// Link to the image relative to the document, `/`-separated.
    pub link: &'a str,
}

/// Annotation found after a block.
struct Annotation<'t> {
    len: usize,
    file_name: &'t str,
}

/// Rewrite `text` so that every target block references its image.
///
/// `targets` must be ordered by position and refer to blocks scanned from
/// `text`. Blocks without a target (failed renders) are left untouched.
/// Applying the same targets to the result again yields the same text.
#[must_use]
pub fn rewrite(text: &str, doc_stem: &str, mode: RenderMode, targets: &[RewriteTarget<'_>]) -> String {
    if mode == RenderMode::Export || targets.is_empty() {
        return text.to_owned();
    }

    let alt = alt_text(doc_stem);
    let mut out = String::with_capacity(text.len() + targets.len() * 96);
    let mut cursor = 0;

    for target in targets {
        let block = target.block;
        if block.start < cursor || block.end > text.len() {
            tracing::warn!(index = block.index, "skipping out-of-order diagram block");
            continue;
        }

        out.push_str(&text[cursor..block.start]);
        let block_text = &text[block.span()];
        let eol = if block_text.ends_with("\r\n") { "\r\n" } else { "\n" };
        let existing = annotation_after(text, block.end);

        if mode == RenderMode::Replace {
            out.push_str(&image_line(&alt, target.link));
            out.push_str(eol);
            cursor = block.end + existing.map_or(0, |a| a.len);
            continue;
        }

        out.push_str(block_text);
        match existing {
            Some(annotation) if annotation.file_name == target.file_name => {
                out.push_str(&text[block.end..block.end + annotation.len]);
                cursor = block.end + annotation.len;
            }
            Some(annotation) => {
                push_annotation(&mut out, &alt, target, eol);
                cursor = block.end + annotation.len;
            }
            None => {
                if !block_text.ends_with('\n') {
                    out.push_str(eol);
                }
                push_annotation(&mut out, &alt, target, eol);
                cursor = block.end;
            }
        }
    }

    out.push_str(&text[cursor..]);
    out
}

/// Build the marker comment for an image file.
#[must_use]
pub fn marker(file_name: &str) -> String {
    format!("{MARKER_PREFIX}{file_name}{MARKER_SUFFIX}")
}

fn annotation_after(text: &str, offset: usize) -> Option<Annotation<'_>> {
    let rest = &text[offset..];
    let caps = ANNOTATION_RE.captures(rest)?;
    let whole = caps.get(0)?;
    let file_name = caps.get(1)?.as_str();
    Some(Annotation {
        len: whole.end(),
        file_name,
    })
}

fn push_annotation(out: &mut String, alt: &str, target: &RewriteTarget<'_>, eol: &str) {
    out.push_str(eol);
    out.push_str(&image_line(alt, target.link));
    out.push_str(eol);
    out.push_str(&marker(target.file_name));
    out.push_str(eol);
}

fn image_line(alt: &str, link: &str) -> String {
    format!("![{alt}]({link})")
}

/// Alt text for a document's diagrams. Brackets would end the alt text early.
fn alt_text(doc_stem: &str) -> String {
    let stem: String = doc_stem
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .collect();
    format!("{stem} diagram")
}
