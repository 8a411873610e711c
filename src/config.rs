//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content directory next to the workspace snapshot:
//!
//! ```text
//! content/
//! ├── config.toml          # Site config (optional, overrides stock defaults)
//! ├── posts.json
//! ├── records/
//! └── assets/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "inkfolio"
//! description = ""
//! link = ""                 # Canonical URL, no trailing slash
//! lang = "en-US"
//! # since = 2024            # First year shown in the footer
//!
//! [profile]
//! name = ""
//! role = ""
//! bio = ""                  # Markdown
//! email = ""
//! github = ""
//! linkedin = ""
//!
//! [filter.list]             # Which posts appear in listings
//! accept_status = ["Public"]
//! # accept_type omitted = any type
//!
//! [filter.detail]           # Which posts get a page of their own
//! accept_status = ["Public", "PublicOnDetail"]
//! accept_type = ["Paper", "Post", "Page"]
//!
//! [listing]
//! recent_posts = 5
//! top_tags = 10
//! all_category_label = "All"
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#000000"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#ffffff"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [profile]
//! name = "Ada"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filter::FilterPolicy;
use crate::pipeline::Policies;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file inside the content directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Title, description, canonical link and language.
    pub site: SiteInfo,
    /// Owner shown on the landing page.
    pub profile: ProfileConfig,
    /// Visibility policies for listings and detail pages.
    pub filter: FilterConfig,
    /// How many items listing pages show.
    pub listing: ListingConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation("site.title must not be empty".into()));
        }
        for (name, policy) in [("list", &self.filter.list), ("detail", &self.filter.detail)] {
            if policy.accept_status.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "filter.{name}.accept_status must not be empty"
                )));
            }
            if policy.accept_type.as_ref().is_some_and(|t| t.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "filter.{name}.accept_type must not be empty (omit it to accept any type)"
                )));
            }
        }
        if self.listing.all_category_label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "listing.all_category_label must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The list and detail policies as a pipeline expects them.
    pub fn policies(&self) -> Policies {
        Policies::new(self.filter.list.clone(), self.filter.detail.clone())
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub title: String,
    pub description: String,
    /// Canonical site URL without trailing slash. Empty = relative links only.
    pub link: String,
    /// `lang` attribute of every page.
    pub lang: String,
    /// First year in the footer copyright range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i32>,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "inkfolio".to_string(),
            description: String::new(),
            link: String::new(),
            lang: "en-US".to_string(),
            since: None,
        }
    }
}

/// Landing page profile. Empty fields are not rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    pub name: String,
    pub role: String,
    /// Markdown.
    pub bio: String,
    pub email: String,
    /// GitHub user name.
    pub github: String,
    /// LinkedIn profile id.
    pub linkedin: String,
}

/// Visibility policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    pub list: FilterPolicy,
    pub detail: FilterPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            list: FilterPolicy::list(),
            detail: FilterPolicy::detail(),
        }
    }
}

/// Listing sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Posts shown on the landing page.
    pub recent_posts: usize,
    /// Tags shown on the blog page, most used first.
    pub top_tags: usize,
    /// Label of the category-bar entry that counts every post.
    pub all_category_label: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            recent_posts: 5,
            top_tags: 10,
            all_category_label: "All".to_string(),
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Dates, captions, tag counts.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
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

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the given content directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    let merged = match load_raw_config(dir)? {
        Some(overlay) => merge_toml(stock_defaults_value(), overlay),
        None => stock_defaults_value(),
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    tracing::debug!(dir = %dir.display(), "config loaded");
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# inkfolio configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# This file lives in the content directory, next to posts.json.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
title = "inkfolio"
description = ""
# Canonical URL without trailing slash. Leave empty for relative links only.
link = ""
lang = "en-US"
# First year in the footer copyright range. Omit to show only the current year.
# since = 2024

# ---------------------------------------------------------------------------
# Profile (landing page). Empty fields are not rendered.
# ---------------------------------------------------------------------------
[profile]
name = ""
role = ""
# Markdown.
bio = ""
email = ""
github = ""
linkedin = ""

# ---------------------------------------------------------------------------
# Visibility
# ---------------------------------------------------------------------------
# A post is visible when one of its statuses is in accept_status and one of
# its types is in accept_type. Omitting accept_type accepts every type.
# Statuses: Private, Public, PublicOnDetail. Types: Post, Paper, Page.

# Posts shown in listings (landing page, blog index).
[filter.list]
accept_status = ["Public"]

# Posts that get a page of their own.
[filter.detail]
accept_status = ["Public", "PublicOnDetail"]
accept_type = ["Paper", "Post", "Page"]

# ---------------------------------------------------------------------------
# Listings
# ---------------------------------------------------------------------------
[listing]
# Posts shown on the landing page.
recent_posts = 5
# Tags shown on the blog page, most used first.
top_tags = 10
# Label of the category entry that counts every post.
all_category_label = "All"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
    )
}
