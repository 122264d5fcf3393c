//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `anvil.toml`. Stock defaults are
//! overridden by whatever the user file specifies; everything is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [source]
//! api_base = "https://www.worldanvil.com/api/aragorn"
//! # application_key = "..."   # sent as x-application-key
//! # auth_token = "..."        # sent as x-auth-token
//!
//! [images]
//! origin = "https://worldanvil.com"   # prefix for relative image paths
//!
//! [links]
//! classes = ["entity-link", "wa-link"]  # classes of internal reference markers
//! label_key = "WA.OnWA"                 # localization key of the source link suffix
//!
//! [stylesheet]
//! user_class_prefix = "user-css"
//! reserved_class = "world-anvil"
//! file_name = "world-anvil.css"
//! target = "modules/world-anvil/assets"
//! # await_upload_ms = 2000             # await the upload instead of detaching it
//!
//! [upload]
//! # endpoint = "http://localhost:30000/upload"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [images]
//! origin = "https://cdn.example.com"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `anvil.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Where articles are fetched from.
    pub source: SourceConfig,
    /// Embedded image resolution.
    pub images: ImagesConfig,
    /// Cross-reference markers and the source link.
    pub links: LinksConfig,
    /// Display stylesheet rewriting and re-hosting.
    pub stylesheet: StylesheetConfig,
    /// Asset upload endpoint.
    pub upload: UploadConfig,
}

impl PipelineConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = Url::parse(&self.images.origin).map_err(|e| {
            ConfigError::Validation(format!("images.origin is not a valid URL: {e}"))
        })?;
        if origin.cannot_be_a_base() {
            return Err(ConfigError::Validation(
                "images.origin must be an absolute http(s) URL".into(),
            ));
        }
        Url::parse(&self.source.api_base).map_err(|e| {
            ConfigError::Validation(format!("source.api_base is not a valid URL: {e}"))
        })?;
        if self.links.classes.is_empty() {
            return Err(ConfigError::Validation(
                "links.classes must not be empty".into(),
            ));
        }
        if self.links.classes.iter().any(|c| c.is_empty() || c.contains(char::is_whitespace)) {
            return Err(ConfigError::Validation(
                "links.classes entries must be single class names".into(),
            ));
        }
        let stylesheet = &self.stylesheet;
        for (key, value) in [
            ("stylesheet.user_class_prefix", &stylesheet.user_class_prefix),
            ("stylesheet.reserved_class", &stylesheet.reserved_class),
            ("stylesheet.file_name", &stylesheet.file_name),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if stylesheet.file_name.contains('/') {
            return Err(ConfigError::Validation(
                "stylesheet.file_name must be a bare file name".into(),
            ));
        }
        if stylesheet.await_upload_ms == Some(0) {
            return Err(ConfigError::Validation(
                "stylesheet.await_upload_ms must be positive (omit it to detach the upload)".into(),
            ));
        }
        Ok(())
    }
}

/// Article API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL of the article API; articles live at `{api_base}/article/{id}`.
    pub api_base: String,
    /// Application key, sent as `x-application-key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_key: Option<String>,
    /// User token, sent as `x-auth-token`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.worldanvil.com/api/aragorn".to_string(),
            application_key: None,
            auth_token: None,
        }
    }
}

/// Embedded image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Origin that relative image paths are resolved against.
    pub origin: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            origin: "https://worldanvil.com".to_string(),
        }
    }
}

/// Cross-reference and source link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksConfig {
    /// Classes added to every internal reference marker.
    pub classes: Vec<String>,
    /// Localization key of the suffix in the source link's tooltip.
    pub label_key: String,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            classes: vec!["entity-link".to_string(), "wa-link".to_string()],
            label_key: "WA.OnWA".to_string(),
        }
    }
}

/// Stylesheet rewriting and re-hosting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StylesheetConfig {
    /// Class prefix of the user-authored wrappers (`.user-css`, `.user-css-extended`).
    pub user_class_prefix: String,
    /// Class every user selector is folded onto.
    pub reserved_class: String,
    /// File name of the re-hosted sheet.
    pub file_name: String,
    /// Directory (relative to the host's web root) the sheet is uploaded to.
    pub target: String,
    /// Await the upload for at most this long; detached when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_upload_ms: Option<u64>,
}

impl Default for StylesheetConfig {
    fn default() -> Self {
        Self {
            user_class_prefix: "user-css".to_string(),
            reserved_class: "world-anvil".to_string(),
            file_name: "world-anvil.css".to_string(),
            target: "modules/world-anvil/assets".to_string(),
            await_upload_ms: None,
        }
    }
}

/// Upload endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Multipart upload endpoint. Without it assets are written to disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, on top of stock defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `anvil.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# anvil-journal configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Article source
# ---------------------------------------------------------------------------
[source]
# Articles are fetched from {api_base}/article/{id}.
api_base = "https://www.worldanvil.com/api/aragorn"

# Credentials, sent as x-application-key / x-auth-token headers.
# application_key = ""
# auth_token = ""

# ---------------------------------------------------------------------------
# Embedded images
# ---------------------------------------------------------------------------
[images]
# Relative image paths in article bodies are resolved against this origin.
origin = "https://worldanvil.com"

# ---------------------------------------------------------------------------
# Cross-references
# ---------------------------------------------------------------------------
[links]
# Classes put on every internal reference marker.
classes = ["entity-link", "wa-link"]

# Localization key of the "on World Anvil" suffix of the source link.
label_key = "WA.OnWA"

# ---------------------------------------------------------------------------
# Display stylesheet
# ---------------------------------------------------------------------------
[stylesheet]
# User stylesheet selectors starting with this class are folded onto
# reserved_class.
user_class_prefix = "user-css"
reserved_class = "world-anvil"

# Name and directory of the re-hosted stylesheet.
file_name = "world-anvil.css"
target = "modules/world-anvil/assets"

# By default the upload runs detached and the <link> is emitted right away.
# Set a timeout to wait for it instead; on failure the styles are inlined.
# await_upload_ms = 2000

# ---------------------------------------------------------------------------
# Asset upload
# ---------------------------------------------------------------------------
[upload]
# Multipart upload endpoint. Without one, assets are written below the
# output directory.
# endpoint = "http://localhost:30000/upload"
"##
}
