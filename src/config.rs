//! Service configuration module.
//!
//! Handles loading, validating, and layering `config.toml`. Stock defaults
//! are the base layer; a `config.toml` in the config directory overrides
//! just the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origins = []          # Allowed browser origins for the public API
//!
//! [storage]
//! data_dir = "data"          # One JSON file per collection
//! media_dir = "media"        # Compressed uploads, served at /media
//!
//! [images]
//! max_width = 1920           # Never upscaled
//! quality = 85               # JPEG quality (1-100)
//! passthrough_below_kib = 500
//! png_max_kib = 1000         # Larger PNGs are re-encoded as JPEG
//!
//! [chat]
//! recent_limit = 20          # Default page size for recent conversations
//! ```
//!
//! ## Credentials
//!
//! The admin bearer token is never read from the file. It comes from the
//! `REALTY_DESK_ADMIN_TOKEN` environment variable; see [`admin_token_from_env`].
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the admin bearer token.
pub const ADMIN_TOKEN_ENV: &str = "REALTY_DESK_ADMIN_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeskConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub images: ImagesConfig,
    pub chat: ChatConfig,
}

impl DeskConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be non-zero".into(),
            ));
        }
        if self.images.max_width == 0 {
            return Err(ConfigError::Validation(
                "images.max_width must be non-zero".into(),
            ));
        }
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.chat.recent_limit == 0 || self.chat.recent_limit > MAX_RECENT_LIMIT {
            return Err(ConfigError::Validation(format!(
                "chat.recent_limit must be 1-{MAX_RECENT_LIMIT}"
            )));
        }
        if self.storage.data_dir.as_os_str().is_empty() || self.storage.media_dir.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "storage directories must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Resolve relative storage paths against the config directory.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.storage.data_dir.is_relative() {
            self.storage.data_dir = base.join(&self.storage.data_dir);
        }
        if self.storage.media_dir.is_relative() {
            self.storage.media_dir = base.join(&self.storage.media_dir);
        }
        self
    }
}

/// Upper bound for any page of recent conversations.
pub const MAX_RECENT_LIMIT: usize = 100;

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty means same-origin only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// On-disk locations for documents and media.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub media_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            media_dir: PathBuf::from("media"),
        }
    }
}

/// Upload compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Files smaller than this are stored as uploaded.
    pub passthrough_below_kib: u32,
    /// PNGs up to this size stay PNG.
    pub png_max_kib: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            quality: 85,
            passthrough_below_kib: 500,
            png_max_kib: 1000,
        }
    }
}

/// Chat endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChatConfig {
    pub recent_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { recent_limit: 20 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DeskConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DeskConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DeskConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// validates, and resolves relative storage paths against `dir`.
pub fn load_config(dir: &Path) -> Result<DeskConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    Ok(resolve_config(base, overlay)?.resolve_paths(dir))
}

/// Read the admin token from the environment.
///
/// Blank values count as unset, which disables the admin API.
pub fn admin_token_from_env() -> Option<String> {
    std::env::var(ADMIN_TOKEN_ENV)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# realty-desk configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# The admin API token is NOT configured here. Set it in the environment:
#   REALTY_DESK_ADMIN_TOKEN=<long random string>
# Without it, every /api/admin route answers 503.

# ---------------------------------------------------------------------------
# HTTP listener
# ---------------------------------------------------------------------------
[server]
host = "127.0.0.1"
port = 8080

# Browser origins allowed to call the API (e.g. the marketing site).
# Empty = same-origin only.
cors_origins = []

# ---------------------------------------------------------------------------
# Storage (relative paths resolve against the config directory)
# ---------------------------------------------------------------------------
[storage]
# One JSON file per collection: properties, portfolio, blog, homepage,
# leads, chats.
data_dir = "data"

# Compressed uploads. Served read-only at /media/<file>.
media_dir = "media"

# ---------------------------------------------------------------------------
# Upload compression
# ---------------------------------------------------------------------------
[images]
# Maximum output width in pixels. Narrower images are never upscaled.
max_width = 1920

# JPEG quality (1 = worst, 100 = best).
quality = 85

# Files smaller than this (KiB) are stored exactly as uploaded.
passthrough_below_kib = 500

# PNGs up to this size (KiB) stay PNG; larger ones become JPEG.
png_max_kib = 1000

# ---------------------------------------------------------------------------
# Chat
# ---------------------------------------------------------------------------
[chat]
# Default number of recent conversations returned (max 100).
recent_limit = 20
"##
}
