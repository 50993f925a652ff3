//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's `config.toml` in the source directory, then by a
//! small set of environment variables (the media account and folder are
//! usually injected by the hosting platform).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! assets_dir = "assets"      # Copied to <output>/assets
//!
//! [site]
//! title = "Photo Gallery"
//! description = "A photo gallery."
//! og_image = ""              # Absolute URL, omitted when empty
//! intro = ""                 # Markdown shown in the hero panel
//! footer = ""                # Markdown shown in the page footer
//! logo = ""                  # Path under assets_dir, omitted when empty
//! photo_alt = "Gallery photo"
//!
//! [media]
//! cloud_name = ""            # or CLOUDINARY_CLOUD_NAME
//! folder = ""                # or CLOUDINARY_FOLDER
//! delivery_base = "https://res.cloudinary.com"
//! api_base = "https://api.cloudinary.com/v1_1"
//! max_results = 400
//! timeout_secs = 30
//!
//! [placeholder]
//! width = 8
//! quality = 70
//!
//! [grid]
//! width = 720
//! height = 480
//! modal_width = 1280
//!
//! [categories]
//! on_malformed = "fail"      # or "skip"
//!
//! [colors]
//! background = "#000000"
//! text = "#ffffff"
//! text_muted = "#cccccc"
//! panel = "#0284c7"
//! border = "#000000"
//! selected = "#facc15"
//!
//! [processing]
//! max_processes = 4          # Max parallel placeholder fetches (omit for auto)
//! ```
//!
//! API credentials are never read from `config.toml`; they come from
//! `CLOUDINARY_API_KEY` and `CLOUDINARY_API_SECRET` (see [`crate::media`]).
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::MAX_RESULTS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Environment variable naming the media account.
pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
/// Environment variable naming the folder to index.
pub const ENV_FOLDER: &str = "CLOUDINARY_FOLDER";

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory (relative to the source) copied to `<output>/assets`.
    pub assets_dir: String,
    /// Page text and metadata.
    pub site: SiteSection,
    /// Media service account and query settings.
    pub media: MediaConfig,
    /// Blur placeholder rendition settings.
    pub placeholder: PlaceholderConfig,
    /// Grid and modal rendition widths.
    pub grid: GridConfig,
    /// Category extraction policy.
    pub categories: CategoriesConfig,
    /// Page palette.
    pub colors: ColorScheme,
    /// Parallel fetch settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            site: SiteSection::default(),
            media: MediaConfig::default(),
            placeholder: PlaceholderConfig::default(),
            grid: GridConfig::default(),
            categories: CategoriesConfig::default(),
            colors: ColorScheme::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.media.max_results == 0 || self.media.max_results > MAX_RESULTS {
            return Err(ConfigError::Validation(format!(
                "media.max_results must be 1-{MAX_RESULTS}"
            )));
        }
        if self.media.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "media.timeout_secs must be non-zero".into(),
            ));
        }
        if self.placeholder.quality == 0 || self.placeholder.quality > 100 {
            return Err(ConfigError::Validation(
                "placeholder.quality must be 1-100".into(),
            ));
        }
        if self.placeholder.width == 0 {
            return Err(ConfigError::Validation(
                "placeholder.width must be non-zero".into(),
            ));
        }
        if self.grid.width == 0 || self.grid.height == 0 || self.grid.modal_width == 0 {
            return Err(ConfigError::Validation(
                "grid.width, grid.height and grid.modal_width must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides for the media account and folder.
    ///
    /// Takes a lookup function instead of reading `std::env` directly so
    /// tests don't have to mutate the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup(ENV_CLOUD_NAME).filter(|v| !v.is_empty()) {
            self.media.cloud_name = name;
        }
        if let Some(folder) = lookup(ENV_FOLDER).filter(|v| !v.is_empty()) {
            self.media.folder = folder;
        }
    }
}

/// Page text and social metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub title: String,
    pub description: String,
    /// Absolute URL of the social preview image.
    pub og_image: String,
    /// Markdown rendered inside the hero panel, below the category buttons.
    pub intro: String,
    /// Markdown rendered in the page footer.
    pub footer: String,
    /// Logo path relative to the assets directory.
    pub logo: String,
    /// Alt text applied to every grid photo.
    pub photo_alt: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Photo Gallery".to_string(),
            description: "A photo gallery.".to_string(),
            og_image: String::new(),
            intro: String::new(),
            footer: String::new(),
            logo: String::new(),
            photo_alt: "Gallery photo".to_string(),
        }
    }
}

/// Media service account and index query settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    /// Account identifier used in both API and delivery URLs.
    pub cloud_name: String,
    /// Folder whose assets make up the gallery.
    pub folder: String,
    /// Base of public delivery URLs.
    pub delivery_base: String,
    /// Base of the admin/search API.
    pub api_base: String,
    /// Result cap for the index query (at most 400).
    pub max_results: u32,
    /// Per-request timeout for every HTTP call.
    pub timeout_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            folder: String::new(),
            delivery_base: "https://res.cloudinary.com".to_string(),
            api_base: "https://api.cloudinary.com/v1_1".to_string(),
            max_results: MAX_RESULTS,
            timeout_secs: 30,
        }
    }
}

impl MediaConfig {
    /// Fail unless both the account and the folder are known.
    ///
    /// Only the fetch stage needs these; generate runs fine from a manifest.
    pub fn require_account(&self) -> Result<(), ConfigError> {
        if self.cloud_name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "media.cloud_name is not set (config.toml or {ENV_CLOUD_NAME})"
            )));
        }
        if self.folder.is_empty() {
            return Err(ConfigError::Validation(format!(
                "media.folder is not set (config.toml or {ENV_FOLDER})"
            )));
        }
        Ok(())
    }
}

/// Blur placeholder rendition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaceholderConfig {
    /// Rendition width in pixels.
    pub width: u32,
    /// JPEG quality (1-100) for both the rendition and the re-encode.
    pub quality: u32,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            width: 8,
            quality: 70,
        }
    }
}

/// Rendition widths used in the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Width of grid images (`c_scale,w_<width>`).
    pub width: u32,
    /// Nominal height attribute of grid images.
    pub height: u32,
    /// Width of the image shown in the detail view.
    pub modal_width: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 720,
            height: 480,
            modal_width: 1280,
        }
    }
}

/// What to do with an asset whose `public_id` carries no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMalformed {
    /// Abort the build naming the offending asset.
    #[default]
    Fail,
    /// Drop the asset with a warning.
    Skip,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    pub on_malformed: OnMalformed,
}

/// Page palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Page background.
    pub background: String,
    /// Primary text color.
    pub text: String,
    /// Secondary text (intro, footer).
    pub text_muted: String,
    /// Hero panel background.
    pub panel: String,
    /// Photo frame color.
    pub border: String,
    /// Selected category button.
    pub selected: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            background: "#000000".to_string(),
            text: "#ffffff".to_string(),
            text_muted: "#cccccc".to_string(),
            panel: "#0284c7".to_string(),
            border: "#000000".to_string(),
            selected: "#facc15".to_string(),
        }
    }
}

/// Parallel fetch settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrent placeholder fetches.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
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
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
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
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults and validates the result.
/// Environment overrides are applied separately by the caller.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Load config and apply environment overrides from the process environment.
pub fn load_config_with_env(root: &Path) -> Result<SiteConfig, ConfigError> {
    let mut config = load_config(root)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Cloud Gal Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# API credentials are read from the environment only:
#   CLOUDINARY_API_KEY, CLOUDINARY_API_SECRET
# The account and folder may also come from the environment:
#   CLOUDINARY_CLOUD_NAME, CLOUDINARY_FOLDER (these win over this file)

# Directory (relative to the source dir) copied to <output>/assets.
assets_dir = "assets"

# ---------------------------------------------------------------------------
# Page text
# ---------------------------------------------------------------------------
[site]
title = "Photo Gallery"
description = "A photo gallery."
# Absolute URL of the social preview image; omitted when empty.
og_image = ""
# Markdown shown in the hero panel and the footer.
intro = ""
footer = ""
# Logo shown in the hero panel, relative to assets_dir; omitted when empty.
logo = ""
photo_alt = "Gallery photo"

# ---------------------------------------------------------------------------
# Media service
# ---------------------------------------------------------------------------
[media]
cloud_name = ""
folder = ""
delivery_base = "https://res.cloudinary.com"
api_base = "https://api.cloudinary.com/v1_1"
# At most 400.
max_results = 400
timeout_secs = 30

# ---------------------------------------------------------------------------
# Blur placeholders
# ---------------------------------------------------------------------------
[placeholder]
# Rendition width in pixels and JPEG quality (1-100).
width = 8
quality = 70

# ---------------------------------------------------------------------------
# Grid and detail view
# ---------------------------------------------------------------------------
[grid]
width = 720
height = 480
modal_width = 1280

# ---------------------------------------------------------------------------
# Categories
# ---------------------------------------------------------------------------
[categories]
# Assets are categorized by their public id: <n>/<group>-<category>/...
# "fail" aborts the build on a malformed id, "skip" drops the asset.
on_malformed = "fail"

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
[colors]
background = "#000000"
text = "#ffffff"
text_muted = "#cccccc"
panel = "#0284c7"
border = "#000000"
selected = "#facc15"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum concurrent placeholder fetches.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// Generate CSS custom properties from the palette.
pub fn generate_color_css(colors: &ColorScheme) -> String {
    format!(
        r#":root {{
    --color-bg: {background};
    --color-text: {text};
    --color-text-muted: {text_muted};
    --color-panel: {panel};
    --color-border: {border};
    --color-selected: {selected};
}}"#,
        background = colors.background,
        text = colors.text,
        text_muted = colors.text_muted,
        panel = colors.panel,
        border = colors.border,
        selected = colors.selected,
    )
}
