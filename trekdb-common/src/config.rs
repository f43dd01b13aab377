//! Configuration loading and root folder resolution
//!
//! Bootstrap settings live in a small TOML file. Every field has a built-in
//! default so a missing file is not an error.
//!
//! # Root Folder Priority
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TREKDB_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TREKDB_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding `data/`, `images/` and `scratch/`
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP port for `serve`
    #[serde(default = "default_port")]
    pub port: u16,

    /// STAPI REST base URL
    #[serde(default = "default_stapi_base_url")]
    pub stapi_base_url: String,

    /// Memory Alpha base URL
    #[serde(default = "default_wiki_base_url")]
    pub wiki_base_url: String,

    /// Spacing between queued wiki requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Attempts per network operation (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base; attempt n waits base * 2^(n-1)
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Max characters sent to the wiki per harvest run
    #[serde(default = "default_enrich_limit")]
    pub enrich_limit: usize,

    /// Cast table path (relative paths resolve against the root folder)
    #[serde(default)]
    pub cast_table: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            port: default_port(),
            stapi_base_url: default_stapi_base_url(),
            wiki_base_url: default_wiki_base_url(),
            request_delay_ms: default_request_delay_ms(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            enrich_limit: default_enrich_limit(),
            cast_table: None,
        }
    }
}

fn default_port() -> u16 {
    5780
}

fn default_stapi_base_url() -> String {
    "https://stapi.co/api/v1/rest".to_string()
}

fn default_wiki_base_url() -> String {
    "https://memory-alpha.fandom.com".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_enrich_limit() -> usize {
    250
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Validate values that have no sensible meaning at zero
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config("max_attempts must be at least 1".to_string()));
        }
        if self.stapi_base_url.trim().is_empty() {
            return Err(Error::Config("stapi_base_url cannot be empty".to_string()));
        }
        if self.wiki_base_url.trim().is_empty() {
            return Err(Error::Config("wiki_base_url cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Load the bootstrap config
///
/// An explicit path must exist. Without one the platform config locations are
/// tried and defaults are used when none exists.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                tracing::debug!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;

    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write the config back to disk atomically
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    crate::atomic::write_atomic(target, content.as_bytes())
}

/// First existing config file for the platform
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("trekdb").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/trekdb/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the root folder (CLI > ENV > TOML > OS default)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("trekdb"))
        .unwrap_or_else(|| PathBuf::from("./trekdb_data"))
}

/// User-Agent sent to STAPI
pub fn get_user_agent() -> String {
    format!(
        "trekdb/{} (+https://github.com/trekdb/trekdb)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Browser-like User-Agent for wiki pages and images (hotlink protection)
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
