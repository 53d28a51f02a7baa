//! Error types for kbsite.
//!
//! Library crates use [`KbSiteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all kbsite build operations.
#[derive(Debug, thiserror::Error)]
pub enum KbSiteError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The content repository is not present at build start.
    #[error(
        "content folder {path:?} does not exist, please run \
         `git submodule update --init --remote --recursive` to download it"
    )]
    ContentMissing { path: PathBuf },

    /// YAML or frontmatter parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Authoring error: a required field or link target is absent.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A sourced file has no parsed sidecar node attached.
    #[error("no {kind} sidecar found for {path}")]
    MissingSidecar { kind: &'static str, path: String },

    /// Node store contract violation (unknown node in a link, etc.).
    #[error("store error: {0}")]
    Store(String),

    /// JSON serialization error while fingerprinting or writing output.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KbSiteError>;

impl KbSiteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for KbSiteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KbSiteError::config("unknown key `paths.foo`");
        assert_eq!(err.to_string(), "config error: unknown key `paths.foo`");

        let err = KbSiteError::validation("category `guides` links to missing page `x/y`");
        assert!(err.to_string().contains("missing page `x/y`"));
    }

    #[test]
    fn content_missing_is_actionable() {
        let err = KbSiteError::ContentMissing {
            path: PathBuf::from("src/content"),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/content"));
        assert!(msg.contains("git submodule update"));
    }

    #[test]
    fn missing_sidecar_names_the_file() {
        let err = KbSiteError::MissingSidecar {
            kind: "MarkdownRemark",
            path: "guides/setup.md".into(),
        };
        assert_eq!(
            err.to_string(),
            "no MarkdownRemark sidecar found for guides/setup.md"
        );
    }
}
