//! Markdown file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConvertError;
use crate::result::FileFailure;

/// File extensions treated as Markdown (compared case-insensitively).
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Markdown files found under the inputs, plus the inputs that could not be
/// expanded.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Markdown files to convert, sorted and free of duplicates.
    pub files: Vec<PathBuf>,
    /// Missing inputs and unreadable directories.
    pub failures: Vec<FileFailure>,
}

/// Expand input paths into the Markdown files to convert.
///
/// File inputs are kept when they have a Markdown extension. Directory inputs
/// contribute their Markdown files, descending into subdirectories when
/// `recursive` is set. Hidden entries inside directories are skipped.
///
/// An input that does not exist is recorded as
/// [`ConvertError::InputNotFound`] and a directory that cannot be listed as
/// [`ConvertError::ReadDir`]; the remaining inputs are still expanded.
#[must_use]
pub fn discover(inputs: &[PathBuf], recursive: bool) -> Discovery {
    let mut discovery = Discovery::default();

    for input in inputs {
        if input.is_dir() {
            walk(input, recursive, &mut discovery);
        } else if input.is_file() {
            if is_markdown(input) {
                discovery.files.push(input.clone());
            } else {
                tracing::warn!(path = %input.display(), "not a Markdown file, skipping");
            }
        } else {
            tracing::warn!(path = %input.display(), "input not found");
            discovery.failures.push(FileFailure {
                path: input.clone(),
                error: ConvertError::InputNotFound(input.clone()),
            });
        }
    }

    discovery.files.sort();
    discovery.files.dedup();
    discovery
}

fn walk(dir: &Path, recursive: bool, discovery: &mut Discovery) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            tracing::warn!(path = %dir.display(), error = %source, "cannot read directory");
            discovery.failures.push(FileFailure {
                path: dir.to_path_buf(),
                error: ConvertError::ReadDir {
                    path: dir.to_path_buf(),
                    source,
                },
            });
            return;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        if is_dir {
            if recursive {
                walk(&path, recursive, discovery);
            }
        } else if is_markdown(&path) {
            discovery.files.push(path);
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MARKDOWN_EXTENSIONS.iter().any(|m| e.eq_ignore_ascii_case(m)))
}
