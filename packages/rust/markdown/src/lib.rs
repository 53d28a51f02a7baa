//! Content parsing for the knowledge base.
//!
//! Splits YAML frontmatter from markdown articles, parses `category.yml`
//! files, and reduces markdown bodies to plain-text excerpts.

mod strip;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use kbsite_shared::{CategoryData, Frontmatter, KbSiteError, MarkdownRemark, Result};

/// Appended to every excerpt.
pub const EXCERPT_SUFFIX: &str = "...";

// ---------------------------------------------------------------------------
// Markdown documents
// ---------------------------------------------------------------------------

/// Parse a markdown file into its frontmatter and raw body.
///
/// `origin` names the file in error messages. A file without a leading
/// `---` block has no frontmatter; malformed YAML inside the block is an error.
#[instrument(skip(source))]
pub fn parse_markdown(source: &str, origin: &str) -> Result<MarkdownRemark> {
    let (yaml, body) = split_frontmatter(source);

    let frontmatter = match yaml {
        Some(yaml) => Some(parse_yaml::<Frontmatter>(yaml, origin)?),
        None => None,
    };

    debug!(
        has_frontmatter = frontmatter.is_some(),
        body_len = body.len(),
        "parsed markdown"
    );

    Ok(MarkdownRemark {
        frontmatter,
        raw_markdown_body: body.to_string(),
    })
}

/// Parse a `category.yml` file.
pub fn parse_category_data(source: &str, origin: &str) -> Result<CategoryData> {
    parse_yaml(source, origin)
}

/// Split a leading `---` fenced YAML block from the body.
pub fn split_frontmatter(source: &str) -> (Option<&str>, &str) {
    static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A\u{feff}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
            .expect("valid regex")
    });

    match FRONTMATTER_RE.captures(source) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let yaml = caps.get(1).map_or("", |m| m.as_str());
            (Some(yaml), &source[whole..])
        }
        None => (None, source),
    }
}

/// Deserialize YAML, treating an empty document as all-default.
fn parse_yaml<T>(yaml: &str, origin: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if yaml.trim().is_empty() {
        return Ok(T::default());
    }

    let value: serde_yaml::Value = serde_yaml::from_str(yaml)
        .map_err(|e| KbSiteError::parse(format!("invalid YAML in {origin}: {e}")))?;

    if value.is_null() {
        return Ok(T::default());
    }

    serde_yaml::from_value(value)
        .map_err(|e| KbSiteError::parse(format!("unexpected YAML shape in {origin}: {e}")))
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

/// Reduce markdown to plain prose.
pub fn strip_markdown(md: &str) -> String {
    strip::run_pipeline(md)
}

/// Build a page excerpt: the first `length` characters of the stripped body,
/// line breaks collapsed to single spaces, followed by [`EXCERPT_SUFFIX`].
pub fn excerpt(body: &str, length: usize) -> String {
    static NEWLINES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[\r\n]+").expect("valid regex"));

    let plain = strip_markdown(body);
    let head: String = plain.chars().take(length).collect();

    format!("{}{EXCERPT_SUFFIX}", NEWLINES_RE.replace_all(&head, " "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
