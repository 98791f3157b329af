//! Image placement and Markdown link computation.

use std::path::{Component, Path, PathBuf};

/// Default directory for shared image output, relative to the working directory.
pub const DEFAULT_SHARED_DIR: &str = "docs/_assets/mermaid";

/// `images_dir` value selecting a per-document image directory.
pub const PER_DOCUMENT_KEYWORD: &str = "per-file";

/// Where rendered images are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    /// One directory for all documents.
    Shared(PathBuf),
    /// `{doc_dir}/{stem}-images/` for each document.
    PerDocument,
    /// A subdirectory of each document's directory. Empty means the document
    /// directory itself.
    Relative(PathBuf),
}

impl Default for ImageLocation {
    fn default() -> Self {
        Self::Shared(PathBuf::from(DEFAULT_SHARED_DIR))
    }
}

impl ImageLocation {
    /// Parse an `images_dir` setting.
    ///
    /// `per-file` selects [`ImageLocation::PerDocument`], `""` and `"."` the
    /// document directory, anything else a subdirectory next to the document.
    #[must_use]
    pub fn from_images_dir(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(PER_DOCUMENT_KEYWORD) || value.eq_ignore_ascii_case("per_file")
        {
            Self::PerDocument
        } else if value.is_empty() || value == "." {
            Self::Relative(PathBuf::new())
        } else {
            Self::Relative(PathBuf::from(value))
        }
    }

    /// Resolve the image directory and link prefix for `document`.
    #[must_use]
    pub fn resolve(&self, document: &Path) -> ResolvedLocation {
        let doc_dir = document.parent().unwrap_or_else(|| Path::new(""));

        match self {
            Self::Shared(dir) => shared(doc_dir, dir),
            Self::PerDocument => {
                let stem = document
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let sub = format!("{stem}-images");
                ResolvedLocation {
                    dir: doc_dir.join(&sub),
                    link_prefix: format!("{sub}/"),
                }
            }
            Self::Relative(sub) if sub.is_absolute() => shared(doc_dir, sub),
            Self::Relative(sub) => {
                let segments = segments(sub);
                if segments.is_empty() {
                    ResolvedLocation {
                        dir: doc_dir.to_path_buf(),
                        link_prefix: String::new(),
                    }
                } else {
                    ResolvedLocation {
                        dir: doc_dir.join(sub),
                        link_prefix: format!("{}/", segments.join("/")),
                    }
                }
            }
        }
    }
}

/// Image directory and link prefix for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Directory the images are written to.
    pub dir: PathBuf,
    /// Path from the document directory to `dir`, `/`-separated with a
    /// trailing slash, or empty.
    link_prefix: String,
}

impl ResolvedLocation {
    /// Path of an image file in this location.
    #[must_use]
    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Markdown link to an image file, relative to the document.
    #[must_use]
    pub fn link(&self, file_name: &str) -> String {
        encode_link(&format!("{}{file_name}", self.link_prefix))
    }
}

fn shared(doc_dir: &Path, dir: &Path) -> ResolvedLocation {
    let rel = relative_dir(&normalize(doc_dir), &normalize(dir));
    ResolvedLocation {
        dir: dir.to_path_buf(),
        link_prefix: if rel.is_empty() {
            rel
        } else {
            format!("{rel}/")
        },
    }
}

/// Make a path absolute against the working directory and fold `.`/`..`
/// lexically.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative `/`-separated path from directory `from` to directory `to`.
///
/// Falls back to `to` itself when the two share no root (different drives).
fn relative_dir(from: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    if common == 0 {
        return to
            .iter()
            .collect::<PathBuf>()
            .to_string_lossy()
            .replace('\\', "/");
    }

    let ups = std::iter::repeat_n("..".to_owned(), from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

/// Path segments of a relative directory, without `.` components.
fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_owned()),
            _ => None,
        })
        .collect()
}

/// Escape characters that would break a Markdown link target.
fn encode_link(link: &str) -> String {
    let mut out = String::with_capacity(link.len());
    for c in link.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            _ => out.push(c),
        }
    }
    out
}
