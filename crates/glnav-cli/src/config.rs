//! Configuration for glnav.
//!
//! Provides the [`GlnavConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `GLNAV_CONFIG` environment variable
//! 3. XDG default: `~/.config/glnav/config.toml`
//! 4. Built-in defaults
//!
//! Environment variables such as `GLNAV_GITLAB_URL` and
//! `GLNAV_GITLAB_PRIVATE_TOKEN` override values read from the file.

use std::path::PathBuf;
use std::time::Duration;

use confyg::{Confygery, env};
use glnav_core::traits::ConfigProvider;
use glnav_core::{Error, Result};
use glnav_explorer::picker::{DEFAULT_COMMAND, DEFAULT_HEIGHT, DEFAULT_LAYOUT};
use glnav_explorer::FzfPicker;
use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of every glnav environment variable.
pub const ENV_PREFIX: &str = "GLNAV";
/// Environment variable naming the config file.
pub const ENV_CONFIG: &str = "GLNAV_CONFIG";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlnavConfig {
    /// GitLab connection settings.
    pub gitlab: GitlabConfig,

    /// Picker settings.
    pub picker: PickerConfig,
}

/// GitLab connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlabConfig {
    /// Instance URL, e.g. `https://gitlab.com`.
    pub url: Option<String>,

    /// Personal access token with `api` scope.
    pub private_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(deserialize_with = "seconds")]
    pub timeout_secs: u64,
}

/// Picker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Picker binary.
    pub command: String,

    /// Height passed to `--height`.
    pub height: String,

    /// Layout passed to `--layout`.
    pub layout: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            url: None,
            private_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            height: DEFAULT_HEIGHT.to_string(),
            layout: DEFAULT_LAYOUT.to_string(),
        }
    }
}

/// Accept seconds as an integer (TOML) or a string (environment).
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number of seconds"))),
    }
}

/// Treat blank settings as unset.
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Config loading
// ============================================================================

impl GlnavConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("gitlab");
        env_opts.add_section("picker");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("glnav").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The picker described by the `[picker]` section.
    pub fn picker(&self) -> FzfPicker {
        FzfPicker::new(&self.picker.command)
            .with_height(&self.picker.height)
            .with_layout(&self.picker.layout)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for GlnavConfig {
    fn project_name(&self) -> &str {
        "glnav"
    }

    fn instance_url(&self) -> Result<String> {
        non_blank(&self.gitlab.url).ok_or_else(|| {
            Error::config(
                "Missing GitLab instance URL. Set gitlab.url in the config file \
                 or export GLNAV_GITLAB_URL.",
            )
        })
    }

    fn private_token(&self) -> Result<String> {
        non_blank(&self.gitlab.private_token).ok_or_else(|| {
            Error::config(
                "Missing GitLab personal access token. Set gitlab.private_token in the \
                 config file or export GLNAV_GITLAB_PRIVATE_TOKEN.",
            )
        })
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gitlab.timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
