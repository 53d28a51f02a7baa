//! Project configuration for kbsite.
//!
//! Config lives at `<project root>/kbsite.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KbSiteError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "kbsite.toml";

// ---------------------------------------------------------------------------
// Config structs (matching kbsite.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site metadata.
    #[serde(default)]
    pub site: SiteConfig,

    /// Source and output locations, relative to the project root.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Build tuning.
    #[serde(default)]
    pub build: BuildOptions,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Human-readable site name, recorded in the build manifest.
    #[serde(default = "default_site_name")]
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
        }
    }
}

fn default_site_name() -> String {
    "Knowledge Base".into()
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Category/article tree plus `redirects.yml`.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Troubleshooter decision tree.
    #[serde(default = "default_troubleshooter_dir")]
    pub troubleshooter_dir: String,

    /// Image assets (icons live in a subdirectory).
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Where routes, redirects, and copied assets are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            troubleshooter_dir: default_troubleshooter_dir(),
            images_dir: default_images_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_content_dir() -> String {
    "src/content".into()
}
fn default_troubleshooter_dir() -> String {
    "src/troubleshooter".into()
}
fn default_images_dir() -> String {
    "src/assets/images".into()
}
fn default_output_dir() -> String {
    "public".into()
}

/// `[build]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Number of plain-text characters kept in a page excerpt.
    #[serde(default = "default_excerpt_length")]
    pub excerpt_length: usize,

    /// URL prefix for published static assets.
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Directory under `images_dir` holding category icons.
    #[serde(default = "default_icons_directory")]
    pub icons_directory: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            excerpt_length: default_excerpt_length(),
            public_path: default_public_path(),
            icons_directory: default_icons_directory(),
        }
    }
}

fn default_excerpt_length() -> usize {
    200
}
fn default_public_path() -> String {
    "/static".into()
}
fn default_icons_directory() -> String {
    "icons".into()
}

// ---------------------------------------------------------------------------
// Build config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime build configuration with every path resolved.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site name for the manifest.
    pub site_name: String,
    /// Absolute or root-relative content directory.
    pub content_dir: PathBuf,
    /// Troubleshooter source directory.
    pub troubleshooter_dir: PathBuf,
    /// Image source directory.
    pub images_dir: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Excerpt length in characters.
    pub excerpt_length: usize,
    /// Public URL prefix for assets.
    pub public_path: String,
    /// Icon subdirectory name under the images source.
    pub icons_directory: String,
}

impl BuildConfig {
    /// Resolve the configured relative paths against `root`.
    pub fn resolve(config: &AppConfig, root: &Path) -> Self {
        Self {
            site_name: config.site.name.clone(),
            content_dir: root.join(&config.paths.content_dir),
            troubleshooter_dir: root.join(&config.paths.troubleshooter_dir),
            images_dir: root.join(&config.paths.images_dir),
            output_dir: root.join(&config.paths.output_dir),
            excerpt_length: config.build.excerpt_length,
            public_path: config.build.public_path.trim_end_matches('/').to_string(),
            icons_directory: config.build.icons_directory.clone(),
        }
    }
}

impl From<&AppConfig> for BuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self::resolve(config, Path::new("."))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path to the config file for a project root.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the project config. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KbSiteError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| KbSiteError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file into `root`. Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(KbSiteError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KbSiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KbSiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
