//! CLI error types.

use mdr_config::{ConfigError, ProfileError};
use mdr_convert::ConvertError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Profile(#[from] ProfileError),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    /// Every candidate file failed to convert.
    #[error("{0}")]
    Failed(String),
}
