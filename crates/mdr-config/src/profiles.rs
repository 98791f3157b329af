//! Named conversion profiles stored as JSON.
//!
//! The store is a single pretty-printed JSON object mapping profile names to
//! settings:
//!
//! ```json
//! {
//!   "docs": {
//!     "input": "docs",
//!     "recursive": true,
//!     "format": "svg",
//!     "mode": "render_keep",
//!     "per_file_images": true
//!   }
//! }
//! ```
//!
//! Unknown keys are ignored so files written by other tools still load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use mdr_convert::PER_DOCUMENT_KEYWORD;
use serde::{Deserialize, Serialize};

use crate::{CliSettings, ConfigError, parse_format, parse_mode};

/// Profile store filename inside the project directory.
pub const PROFILES_FILENAME: &str = "profiles.json";

/// Saved conversion settings.
///
/// Every field is optional; unset fields leave the configuration alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Input file or directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    /// `png` or `svg`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Shared image output directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    /// Rewrite mode, short or long name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
    /// Place images next to each document instead of `out_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_file_images: Option<bool>,
    /// Subdirectory for per-document images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<String>,
}

impl Profile {
    /// Convert the profile into override settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for an unknown format or mode.
    pub fn to_settings(&self) -> Result<CliSettings, ConfigError> {
        let format = self
            .format
            .as_deref()
            .map(|v| parse_format(v, "profile format"))
            .transpose()?;
        let mode = self
            .mode
            .as_deref()
            .map(|v| parse_mode(v, "profile mode"))
            .transpose()?;

        let images_dir = match self.per_file_images {
            Some(true) => Some(
                self.images_dir
                    .clone()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| PER_DOCUMENT_KEYWORD.to_owned()),
            ),
            Some(false) => None,
            None => self.images_dir.clone(),
        };

        Ok(CliSettings {
            format,
            mode,
            out_dir: self.out_dir.as_deref().map(PathBuf::from),
            images_dir,
            backup: self.backup,
            recursive: self.recursive,
            ..CliSettings::default()
        })
    }
}

/// Profile store error.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Failed to read or write the store.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The store exists but is not a valid profile map.
    #[error("invalid profile store {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// No profile with this name.
    #[error("profile not found: {0}")]
    NotFound(String),
    /// Profile name is empty.
    #[error("profile name cannot be empty")]
    EmptyName,
    /// Profile settings are invalid.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Profiles loaded from a JSON file.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Load the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or invalid file is
    /// logged and also treated as empty; [`save`](Self::save) refuses to
    /// overwrite it.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let profiles = match Self::read(path) {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring profile store");
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            profiles,
        }
    }

    /// Location of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Look up a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if there is no such profile.
    pub fn get(&self, name: &str) -> Result<&Profile, ProfileError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_owned()))
    }

    /// Add or replace a profile. Returns the previous profile of that name.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` for a blank name.
    pub fn insert(&mut self, name: &str, profile: Profile) -> Result<Option<Profile>, ProfileError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(self.profiles.insert(name.to_owned(), profile))
    }

    /// Remove a profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if there is no such profile.
    pub fn remove(&mut self, name: &str) -> Result<Profile, ProfileError> {
        self.profiles
            .remove(name)
            .ok_or_else(|| ProfileError::NotFound(name.to_owned()))
    }

    /// Write the store back to disk as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Parse` if the existing file is not a valid store
    /// and `ProfileError::Io` if it cannot be written.
    pub fn save(&self) -> Result<(), ProfileError> {
        if self.path.exists() {
            Self::read(&self.path)?;
        }

        let io_err = |source| ProfileError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut json = serde_json::to_string_pretty(&self.profiles).map_err(|source| {
            ProfileError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        json.push('\n');
        fs::write(&self.path, json).map_err(io_err)?;

        tracing::info!(path = %self.path.display(), count = self.profiles.len(), "Saved profiles");
        Ok(())
    }

    fn read(path: &Path) -> Result<BTreeMap<String, Profile>, ProfileError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ProfileError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
