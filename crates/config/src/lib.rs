#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for lxpkg
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/lxpkg/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;

use lxpkg_errors::{ConfigError, Error};
use lxpkg_types::ColorChoice;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Filesystem roots; unset values fall back to the defaults in [`constants`]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub source_root: Option<PathBuf>,
    pub build_root: Option<PathBuf>,
    pub install_root: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// Build command execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Shell used as `<shell> -c <command>`
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub escalation: EscalationConfig,
}

/// How commands containing `sudo` are run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default)]
    pub mode: EscalationMode,
    /// Front end that replaces `sudo` in `front_end` mode
    #[serde(default = "default_escalation_program")]
    pub program: String,
}

/// Privilege escalation strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMode {
    /// Rewrite `sudo` to the configured front end (polkit-style prompt)
    #[default]
    FrontEnd,
    /// Run privileged commands unchanged
    Passthrough,
}

/// The three filesystem roots the pipeline works against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    /// Tree of descriptor files, read-only for the pipeline
    pub source_tree: PathBuf,
    /// Job scratch space for artifacts and extracted sources
    pub build: PathBuf,
    /// Prefix manifest paths are resolved against
    pub install: PathBuf,
}

impl Roots {
    /// Roots with explicit paths
    pub fn new(
        source_tree: impl Into<PathBuf>,
        build: impl Into<PathBuf>,
        install: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_tree: source_tree.into(),
            build: build.into(),
            install: install.into(),
        }
    }
}

// Default implementations

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            escalation: EscalationConfig::default(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            mode: EscalationMode::FrontEnd,
            program: default_escalation_program(),
        }
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_shell() -> String {
    constants::DEFAULT_SHELL.to_string()
}

fn default_escalation_program() -> String {
    constants::DEFAULT_ESCALATION_PROGRAM.to_string()
}

impl NetworkConfig {
    /// Request timeout as a duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Connect timeout as a duration
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Delay between retries as a duration
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("lxpkg").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value that cannot be parsed.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("LXPKG_SOURCE_ROOT") {
            self.paths.source_root = Some(PathBuf::from(root));
        }
        if let Some(root) = lookup("LXPKG_BUILD_ROOT") {
            self.paths.build_root = Some(PathBuf::from(root));
        }
        if let Some(root) = lookup("LXPKG_INSTALL_ROOT") {
            self.paths.install_root = Some(PathBuf::from(root));
        }

        if let Some(color) = lookup("LXPKG_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "LXPKG_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // "passthrough" keeps sudo; anything else names the front end
        if let Some(escalation) = lookup("LXPKG_ESCALATION") {
            match escalation.trim() {
                "" => {
                    return Err(ConfigError::InvalidValue {
                        field: "LXPKG_ESCALATION".to_string(),
                        value: escalation,
                    }
                    .into())
                }
                "passthrough" => self.build.escalation.mode = EscalationMode::Passthrough,
                program => {
                    self.build.escalation.mode = EscalationMode::FrontEnd;
                    self.build.escalation.program = program.to_string();
                }
            }
        }

        if let Some(timeout) = lookup("LXPKG_NETWORK_TIMEOUT") {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "LXPKG_NETWORK_TIMEOUT".to_string(),
                value: timeout,
            })?;
        }

        Ok(())
    }

    /// Get the source tree root (with default)
    #[must_use]
    pub fn source_root(&self) -> PathBuf {
        self.paths.source_root.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/"))
                .join(constants::DEFAULT_SOURCE_DIR)
        })
    }

    /// Get the build root (defaults to `build/` inside the source root)
    #[must_use]
    pub fn build_root(&self) -> PathBuf {
        self.paths
            .build_root
            .clone()
            .unwrap_or_else(|| self.source_root().join(constants::DEFAULT_BUILD_DIR))
    }

    /// Get the install root (with default)
    #[must_use]
    pub fn install_root(&self) -> PathBuf {
        self.paths
            .install_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_INSTALL_ROOT))
    }

    /// Get the directory debug logs are written to
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::cache_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("lxpkg")
                .join("logs")
        })
    }

    /// Resolve all three filesystem roots
    #[must_use]
    pub fn roots(&self) -> Roots {
        Roots {
            source_tree: self.source_root(),
            build: self.build_root(),
            install: self.install_root(),
        }
    }
}
