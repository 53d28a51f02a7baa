//! Shared types, error model, and configuration for kbsite.
//!
//! This crate is the foundation depended on by all other kbsite crates.
//! It provides:
//! - [`KbSiteError`]: the unified error type
//! - Content graph records ([`Category`], [`Page`], [`IconData`], [`TroubleshooterNode`])
//! - Route and redirect tables ([`Route`], [`Redirect`], [`SiteMap`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildOptions, CONFIG_FILE_NAME, PathsConfig, SiteConfig,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{KbSiteError, Result};
pub use types::{
    ArtifactMeta, Breadcrumb, BuildCounts, BuildManifest, CONTENT_SOURCE, CURRENT_SCHEMA_VERSION,
    Category, CategoryData, FileNode, Frontmatter, IMAGES_SOURCE, IconData, MarkdownRemark,
    NodeId, Page, Redirect, Route, RouteContext, SiteMap, TROUBLESHOOTER_ROOT_SLUG,
    TROUBLESHOOTER_SOURCE, Template, TroubleshooterNode,
};
