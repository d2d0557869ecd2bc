#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for mhub
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/mhub/config.toml)
//! - Environment variables
//! - CLI flags (applied by the caller after `merge_env`)

pub mod constants;

use mhub_errors::{ConfigError, Error};
use mhub_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
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
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub exporters_dir: Option<PathBuf>,
    pub catalog_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
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
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

/// Published catalog and rebuild selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    #[serde(default)]
    pub force_rebuild: bool,
    #[serde(default)]
    pub target_exporter: Option<String>,
}

/// Release host and package repository layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Release repository as `owner/name`
    #[serde(default = "default_github_repo")]
    pub github_repo: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Never written back to disk
    #[serde(default, skip_serializing)]
    pub github_token: Option<String>,
    #[serde(default = "default_supported_distros")]
    pub supported_distros: Vec<String>,
    #[serde(default = "default_deb_codenames")]
    pub deb_codenames: BTreeMap<String, String>,
    #[serde(default = "default_arch_map")]
    pub arch_map: BTreeMap<String, String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            force_rebuild: false,
            target_exporter: None,
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            github_repo: default_github_repo(),
            api_base: default_api_base(),
            github_token: None,
            supported_distros: default_supported_distros(),
            deb_codenames: default_deb_codenames(),
            arch_map: default_arch_map(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter_factor() -> f64 {
    0.1
}

fn default_catalog_url() -> String {
    constants::DEFAULT_CATALOG_URL.to_string()
}

fn default_github_repo() -> String {
    constants::DEFAULT_GITHUB_REPO.to_string()
}

fn default_api_base() -> String {
    constants::GITHUB_API_BASE.to_string()
}

fn default_supported_distros() -> Vec<String> {
    vec!["el8".to_string(), "el9".to_string(), "el10".to_string()]
}

fn default_deb_codenames() -> BTreeMap<String, String> {
    [
        ("ubuntu-22.04", "jammy"),
        ("ubuntu-24.04", "noble"),
        ("debian-12", "bookworm"),
        ("debian-13", "trixie"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_arch_map() -> BTreeMap<String, String> {
    mhub_types::default_arch_map()
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
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
        Ok(config_dir.join("mhub").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
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
    /// If path is provided, loads from that file.
    /// If path is None, uses the default loading behavior.
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

    /// Merge with process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Merge environment overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong shape.
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CATALOG_URL").filter(|v| !v.is_empty()) {
            self.catalog.url = url;
        }

        if let Some(force) = lookup("FORCE_REBUILD") {
            self.catalog.force_rebuild = parse_bool("FORCE_REBUILD", force)?;
        }

        if let Some(target) = lookup("TARGET_EXPORTER") {
            // An empty value means "no filter"; CI passes it unconditionally
            self.catalog.target_exporter = Some(target).filter(|t| !t.is_empty());
        }

        if let Some(token) = lookup("GITHUB_TOKEN").filter(|v| !v.is_empty()) {
            self.repository.github_token = Some(token);
        }

        // MHUB_OUTPUT
        if let Some(output) = lookup("MHUB_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MHUB_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // MHUB_COLOR
        if let Some(color) = lookup("MHUB_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MHUB_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // MHUB_RETRIES
        if let Some(retries) = lookup("MHUB_RETRIES") {
            self.network.retries = retries.parse().map_err(|_| ConfigError::InvalidValue {
                field: "MHUB_RETRIES".to_string(),
                value: retries,
            })?;
        }

        self.validate()
    }

    /// Reject values that would make the network or repository layers misbehave
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for the first bad field.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, value: String| -> Error {
            ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }
            .into()
        };

        if self.network.retries > 10 {
            return Err(invalid("network.retries", self.network.retries.to_string()));
        }
        if !(0.0..=1.0).contains(&self.network.jitter_factor) {
            return Err(invalid(
                "network.jitter_factor",
                self.network.jitter_factor.to_string(),
            ));
        }
        if self.network.backoff_multiplier < 1.0 {
            return Err(invalid(
                "network.backoff_multiplier",
                self.network.backoff_multiplier.to_string(),
            ));
        }
        match self.repository.github_repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {}
            _ => {
                return Err(invalid(
                    "repository.github_repo",
                    self.repository.github_repo.clone(),
                ))
            }
        }

        Ok(())
    }

    /// Directory holding `<name>/manifest.yaml` per exporter
    #[must_use]
    pub fn exporters_dir(&self) -> PathBuf {
        self.paths
            .exporters_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::EXPORTERS_DIR))
    }

    /// Root of the fact store
    #[must_use]
    pub fn catalog_dir(&self) -> PathBuf {
        self.paths
            .catalog_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::CATALOG_DIR))
    }

    /// Where published catalog files and repository metadata are written
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::OUTPUT_DIR))
    }

    /// Package download and metadata cache
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.paths.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("mhub")
        })
    }

    /// Debian codename for a distribution such as `ubuntu-24.04`
    #[must_use]
    pub fn deb_codename(&self, dist: &str) -> Option<&str> {
        self.repository.deb_codenames.get(dist).map(String::as_str)
    }

    /// RPM spelling of an architecture; unknown names pass through
    #[must_use]
    pub fn rpm_arch<'a>(&'a self, arch: &'a str) -> &'a str {
        mhub_types::rpm_arch(&self.repository.arch_map, arch)
    }
}
