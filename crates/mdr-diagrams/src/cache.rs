//! Content fingerprints and derived image names.
//!
//! There is no cache index: an image is current when a file exists at the name
//! derived from the document stem, the block index and the source fingerprint.
//! [`ImageKey::file_name`] is a pure function of those inputs, so lookups are
//! reproducible across runs and platforms.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::consts::{MAX_STEM_LEN, SHORT_HASH_LEN};
use crate::format::DiagramFormat;

/// SHA-256 fingerprint of a diagram's source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `source`.
    ///
    /// # Hash Format
    ///
    /// Hex-encoded SHA-256 of the source bytes (64 characters).
    #[must_use]
    pub fn of(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Full hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form embedded in image file names.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..SHORT_HASH_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters that determine a diagram's image file name.
#[derive(Debug)]
pub struct ImageKey<'a> {
    /// Document file stem (e.g. `"guide"` for `guide.md`).
    pub stem: &'a str,
    /// One-based block index within the document.
    pub index: usize,
    /// Fingerprint of the block source.
    pub fingerprint: &'a Fingerprint,
    /// Output image format.
    pub format: DiagramFormat,
}

impl ImageKey<'_> {
    /// Derive the image file name: `{stem}-{index}-{short hash}.{ext}`.
    ///
    /// The block index keeps identical diagrams in one document apart.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.{}",
            sanitize_stem(self.stem),
            self.index,
            self.fingerprint.short(),
            self.format.extension()
        )
    }
}

/// Normalize a document stem for use in file names.
///
/// Characters other than Unicode alphanumerics (any script), `.`, `_` and `-`
/// become `-`, leading dots are dropped, and the result is cut to a fixed
/// number of characters. An empty result becomes `diagram`.
#[must_use]
pub fn sanitize_stem(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let truncated: String = cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_STEM_LEN)
        .collect();

    if truncated.is_empty() {
        "diagram".to_owned()
    } else {
        truncated
    }
}

/// Whether a block needs rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// An image already exists at the derived path.
    Skip,
    /// The image is missing or a re-render was forced.
    Render,
}

impl CacheDecision {
    /// Decide based on the presence of `image_path` on disk.
    #[must_use]
    pub fn decide(image_path: &Path, force: bool) -> Self {
        if !force && image_path.is_file() {
            Self::Skip
        } else {
            Self::Render
        }
    }
}
