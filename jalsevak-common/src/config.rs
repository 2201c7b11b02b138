//! Bootstrap configuration loading and API key resolution
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `JALSEVAK_CONFIG` environment variable
//! 3. `<config_dir>/jalsevak/config.toml`
//! 4. Built-in defaults (fallback)
//!
//! A missing config file is not an error: the service starts with defaults
//! and logs a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "JALSEVAK_CONFIG";

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "JALSEVAK_API_KEY";

/// Default HTTP port for jalsevak-ai
pub const DEFAULT_PORT: u16 = 5730;

/// Default number of items per translation batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Bootstrap configuration loaded from TOML file
///
/// Every section is optional; missing fields take built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP server bind address
    #[serde(default)]
    pub server: ServerConfig,

    /// External model / translation provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Batch translation tuning
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which hosted capability backs translation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Generative model with structured JSON output (expects full language names)
    #[default]
    Gemini,
    /// Cloud Translation v2 (expects ISO language codes)
    CloudTranslate,
}

impl ProviderKind {
    /// Stable name used in logs and health output
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::CloudTranslate => "cloud-translate",
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key (prefer the `JALSEVAK_API_KEY` environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name (Gemini only)
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the provider base URL (tests, proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Client-side rate limit
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            model: default_model(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

/// How batches of one request are dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchSetting {
    /// One batch at a time, each awaited before the next
    #[default]
    Sequential,
    /// Up to `max_in_flight` batches at once
    Concurrent,
}

/// Batch translation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Maximum items per provider call (must be non-zero)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub dispatch: DispatchSetting,

    /// Only used with `dispatch = "concurrent"`
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Per-batch deadline; an expired batch falls back to source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout_secs: Option<u64>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dispatch: DispatchSetting::default(),
            max_in_flight: default_max_in_flight(),
            batch_timeout_secs: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_in_flight() -> usize {
    4
}

impl TomlConfig {
    /// Check values serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.translation.batch_size == 0 {
            return Err(Error::Config(
                "translation.batch_size must be at least 1".to_string(),
            ));
        }
        if self.translation.max_in_flight == 0 {
            return Err(Error::Config(
                "translation.max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.provider.requests_per_minute == 0 {
            return Err(Error::Config(
                "provider.requests_per_minute must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Locate the config file following the resolution priority
///
/// Returns `None` when no candidate exists (defaults apply).
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument (returned even if missing so load reports it)
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// `<config_dir>/jalsevak/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jalsevak").join("config.toml"))
}

/// Load and validate bootstrap configuration
///
/// An explicitly requested file (CLI or environment) must exist. When no file
/// is found the built-in defaults are returned.
pub fn load_toml_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    let config = read_toml_config(&path)?;
    info!("Loaded configuration from {}", path.display());

    #[cfg(unix)]
    if config.provider.api_key.is_some() && check_toml_permissions_loose(&path)? {
        warn!(
            "{} contains an API key but is readable by other users (recommend chmod 600)",
            path.display()
        );
    }

    Ok(config)
}

/// True if group or other permission bits are set on the file
#[cfg(unix)]
pub fn check_toml_permissions_loose(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 != 0)
}

/// Parse and validate a specific TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Write config atomically (temp file + rename)
///
/// The file may contain an API key, so on Unix it is created with mode 0600.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

/// Resolve the provider API key
///
/// **Priority:** ENV → TOML. Blank values are treated as absent.
pub fn resolve_api_key(toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(API_KEY_ENV).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_config
        .provider
        .api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found in both {} and TOML config. Using environment (highest priority).",
            API_KEY_ENV
        );
    }

    if let Some(key) = env_key {
        info!("API key loaded from environment variable");
        return Some(key);
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Some(key);
    }

    warn!(
        "No API key configured. Set {} or provider.api_key; translation and advisory calls will fail",
        API_KEY_ENV
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Standard User-Agent for outbound HTTP clients
pub fn get_user_agent() -> String {
    format!("JalSevak/{}", env!("CARGO_PKG_VERSION"))
}
