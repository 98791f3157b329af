//! Conversion errors.

use std::path::PathBuf;

use mdr_diagrams::RenderError;

/// Error raised while converting Markdown files.
///
/// Fatal errors abort the whole run (see [`ConvertError::is_fatal`]); the rest
/// are recorded against a single file in the run summary.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// An input path given by the user does not exist.
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Failed to list a directory input or one of its subdirectories.
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer cannot be used.
    #[error(transparent)]
    Renderer(#[from] RenderError),

    /// Failed to read a Markdown file.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a Markdown file.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to back up a Markdown file; the file was left as is.
    #[error("failed to back up {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Whether the error stops the run instead of a single file.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Renderer(e) => e.is_fatal(),
            Self::InputNotFound(_)
            | Self::ReadDir { .. }
            | Self::Read { .. }
            | Self::Write { .. }
            | Self::Backup { .. } => false,
        }
    }
}
