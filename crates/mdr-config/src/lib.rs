//! Configuration management for mdr.
//!
//! Parses `mdr.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Named profiles are
//! stored separately in `profiles.json` (see [`ProfileStore`]).
//!
//! Settings are layered: built-in defaults, then the config file, then a
//! profile, then command-line flags. Profiles and flags are both applied as
//! [`CliSettings`] via [`Config::apply_settings`].
//!
//! ## Environment Variable Expansion
//!
//! String values in the `[render]` section support environment variable
//! expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;
mod profiles;

pub use profiles::{PROFILES_FILENAME, Profile, ProfileError, ProfileStore};

use std::path::{Path, PathBuf};
use std::time::Duration;

use mdr_convert::{DEFAULT_SHARED_DIR, ImageLocation};
use mdr_diagrams::{DEFAULT_BACKGROUND, DEFAULT_TIMEOUT, DiagramFormat, RenderMode};
use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "mdr.toml";

/// Project data directory name, next to the config file.
const PROJECT_DIR_NAME: &str = ".mdr";

/// Default per-diagram render timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

/// Settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CliSettings {
    /// Override the `mmdc` executable.
    pub mmdc: Option<PathBuf>,
    /// Override image format.
    pub format: Option<DiagramFormat>,
    /// Override rewrite mode.
    pub mode: Option<RenderMode>,
    /// Override `mmdc` background color.
    pub background: Option<String>,
    /// Override Mermaid theme.
    pub theme: Option<String>,
    /// Override render timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Override shared image output directory.
    pub out_dir: Option<PathBuf>,
    /// Override per-document image placement.
    pub images_dir: Option<String>,
    /// Override backup flag.
    pub backup: Option<bool>,
    /// Override recursive directory scanning.
    pub recursive: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render configuration as written in TOML.
    render: RenderConfigRaw,

    /// Resolved render configuration (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderConfig,
    /// Project directory for mdr data (`.mdr/`).
    #[serde(skip)]
    pub project_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw render configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RenderConfigRaw {
    mmdc: Option<String>,
    format: Option<String>,
    mode: Option<String>,
    background: Option<String>,
    theme: Option<String>,
    timeout_secs: Option<u64>,
    out_dir: Option<String>,
    images_dir: Option<String>,
    backup: Option<bool>,
    recursive: Option<bool>,
}

/// Resolved render configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Explicit `mmdc` executable; discovered when `None`.
    pub mmdc: Option<PathBuf>,
    /// Image format.
    pub format: DiagramFormat,
    /// How documents are rewritten.
    pub mode: RenderMode,
    /// `mmdc` background color.
    pub background: String,
    /// Mermaid theme, `mmdc` default when `None`.
    pub theme: Option<String>,
    /// Per-diagram render timeout in seconds.
    pub timeout_secs: u64,
    /// Shared image output directory.
    pub out_dir: PathBuf,
    /// Per-document image placement; takes precedence over `out_dir`.
    pub images_dir: Option<String>,
    /// Back up documents before overwriting them.
    pub backup: bool,
    /// Scan directories recursively.
    pub recursive: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mmdc: None,
            format: DiagramFormat::default(),
            mode: RenderMode::default(),
            background: DEFAULT_BACKGROUND.to_owned(),
            theme: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            out_dir: PathBuf::from(DEFAULT_SHARED_DIR),
            images_dir: None,
            backup: false,
            recursive: false,
        }
    }
}

impl RenderConfig {
    /// Per-diagram render timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Where images are written.
    #[must_use]
    pub fn image_location(&self) -> ImageLocation {
        match &self.images_dir {
            Some(images_dir) => ImageLocation::from_images_dir(images_dir),
            None => ImageLocation::Shared(self.out_dir.clone()),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.mmdc`").
        field: String,
        /// Error message (e.g., "${`MERMAID_CLI`} not set").
        message: String,
    },
}

/// Parse an image format setting.
pub fn parse_format(value: &str, field: &str) -> Result<DiagramFormat, ConfigError> {
    DiagramFormat::parse(value).ok_or_else(|| {
        ConfigError::Validation(format!("{field} must be png or svg, got {value:?}"))
    })
}

/// Parse a rewrite mode setting.
pub fn parse_mode(value: &str, field: &str) -> Result<RenderMode, ConfigError> {
    RenderMode::parse(value).ok_or_else(|| {
        ConfigError::Validation(format!(
            "{field} must be export, replace or keep, got {value:?}"
        ))
    })
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdr.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_settings(settings)?;
        }

        Ok(config)
    }

    /// Apply override settings and re-validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the result is invalid.
    pub fn apply_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        let render = &mut self.render_resolved;
        if let Some(mmdc) = &settings.mmdc {
            render.mmdc = Some(mmdc.clone());
        }
        if let Some(format) = settings.format {
            render.format = format;
        }
        if let Some(mode) = settings.mode {
            render.mode = mode;
        }
        if let Some(background) = &settings.background {
            render.background.clone_from(background);
        }
        if let Some(theme) = &settings.theme {
            render.theme = Some(theme.clone());
        }
        if let Some(timeout_secs) = settings.timeout_secs {
            render.timeout_secs = timeout_secs;
        }
        if let Some(out_dir) = &settings.out_dir {
            render.out_dir.clone_from(out_dir);
            // An explicit output directory selects shared placement
            render.images_dir = None;
        }
        if let Some(images_dir) = &settings.images_dir {
            render.images_dir = Some(images_dir.clone());
        }
        if let Some(backup) = settings.backup {
            render.backup = backup;
        }
        if let Some(recursive) = settings.recursive {
            render.recursive = recursive;
        }

        self.validate()
    }

    /// Path of the profile store for this configuration.
    #[must_use]
    pub fn profiles_path(&self) -> PathBuf {
        self.project_dir.join(PROFILES_FILENAME)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with the project directory in the working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with the project directory under `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            render: RenderConfigRaw::default(),
            render_resolved: RenderConfig::default(),
            project_dir: base.join(PROJECT_DIR_NAME),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let render = &self.render_resolved;
        if render.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "render.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        if render.background.trim().is_empty() {
            return Err(ConfigError::Validation(
                "render.background cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let render = &mut self.render;
        for (value, field) in [
            (&mut render.mmdc, "render.mmdc"),
            (&mut render.background, "render.background"),
            (&mut render.theme, "render.theme"),
            (&mut render.out_dir, "render.out_dir"),
            (&mut render.images_dir, "render.images_dir"),
        ] {
            if let Some(v) = value {
                *v = expand::expand_env(v, field)?;
            }
        }
        Ok(())
    }

    /// Parse raw values and resolve paths relative to the config directory.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let raw = &self.render;
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.trim().is_empty()).map(str::to_owned);

        let format = match &raw.format {
            Some(v) => parse_format(v, "render.format")?,
            None => DiagramFormat::default(),
        };
        let mode = match &raw.mode {
            Some(v) => parse_mode(v, "render.mode")?,
            None => RenderMode::default(),
        };

        self.render_resolved = RenderConfig {
            mmdc: non_empty(&raw.mmdc).map(|p| resolve_program(config_dir, &p)),
            format,
            mode,
            background: non_empty(&raw.background).unwrap_or_else(|| DEFAULT_BACKGROUND.to_owned()),
            theme: non_empty(&raw.theme),
            timeout_secs: raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            out_dir: config_dir.join(raw.out_dir.as_deref().unwrap_or(DEFAULT_SHARED_DIR)),
            images_dir: raw.images_dir.clone(),
            backup: raw.backup.unwrap_or(false),
            recursive: raw.recursive.unwrap_or(false),
        };
        self.project_dir = config_dir.join(PROJECT_DIR_NAME);

        Ok(())
    }
}

/// Resolve an executable setting: bare names are looked up on `PATH` at run
/// time, paths are relative to the config directory.
fn resolve_program(config_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() || path.components().count() == 1 {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}
