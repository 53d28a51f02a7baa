//! Core domain types for the knowledge-base content graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Current schema version for the build manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Source instance holding categories, articles, and `redirects.yml`.
pub const CONTENT_SOURCE: &str = "content";
/// Source instance holding the troubleshooter tree.
pub const TROUBLESHOOTER_SOURCE: &str = "troubleshooter";
/// Source instance holding image assets.
pub const IMAGES_SOURCE: &str = "images";

/// Slug of the troubleshooter root node.
pub const TROUBLESHOOTER_ROOT_SLUG: &str = "troubleshooter";

// ---------------------------------------------------------------------------
// NodeId
// ---------------------------------------------------------------------------

/// Namespace for deriving node ids from human-readable keys.
const NODE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b62_7369_7465_4e6f_6465_4964_0000_0001);

/// A UUID v5 node identifier, derived deterministically from a key such as
/// `page-guides/setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Derive the id for a node key. The same key always yields the same id.
    pub fn from_key(key: &str) -> Self {
        Self(Uuid::new_v5(&NODE_ID_NAMESPACE, key.as_bytes()))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Sourced nodes
// ---------------------------------------------------------------------------

/// A sourced file. Paths are relative to the source root and use `/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    /// Which source root the file came from (`content`, `troubleshooter`, `images`).
    pub source_instance_name: String,
    /// Directory relative to the source root; empty for the root itself.
    pub relative_directory: String,
    /// Path relative to the source root, including the extension.
    pub relative_path: String,
    /// File stem.
    pub name: String,
    /// Extension without the leading dot.
    pub extension: String,
    /// Absolute directory of the file.
    pub dir: String,
    /// Absolute path of the file.
    pub absolute_path: String,
    /// Published URL for assets that are copied to the output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

/// Frontmatter fields read from articles and troubleshooter nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub date_published: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
}

/// Parsed markdown sidecar of a `.md` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownRemark {
    /// `None` when the file has no leading `---` block.
    pub frontmatter: Option<Frontmatter>,
    /// Markdown body with the frontmatter removed.
    pub raw_markdown_body: String,
}

/// Parsed sidecar of a `category.yml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Slugs of pages from other categories to expose here as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
}

/// Read any YAML scalar as text, so `title: 2019` is the title `2019`.
fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Derived nodes
// ---------------------------------------------------------------------------

/// One step in a root-to-leaf navigation trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub title: String,
    pub slug: String,
}

/// A category derived from a `category.yml` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Relative directory of the `category.yml`.
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
    pub parent_id: Option<NodeId>,
    pub parent_slug: Option<String>,
    pub is_top_level: bool,
    /// Parent's breadcrumbs followed by this category.
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// An article page. Linked copies share `original_slug` with their source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub title: String,
    /// File stem of the backing markdown file.
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub excerpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    pub slug: String,
    /// Slug of the backing file, kept when a link re-homes the page.
    pub original_slug: String,
    pub parent_id: NodeId,
    pub parent_slug: String,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Resolved icon for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconData {
    /// `None` when the category names no icon or the icon has no asset.
    pub icon: Option<String>,
    pub parent_id: NodeId,
}

/// One step of the troubleshooter decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroubleshooterNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: i64,
    pub absolute_path: String,
    pub relative_path: String,
    /// `troubleshooter` for the root, `troubleshooter/<hash8>` otherwise.
    pub slug: String,
    pub parent_id: Option<NodeId>,
    pub parent_slug: Option<String>,
}

impl TroubleshooterNode {
    /// Whether this is the entry point of the tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Route and redirect tables
// ---------------------------------------------------------------------------

/// Page templates known to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    Category,
    Page,
    Troubleshooter,
}

/// Context handed to a template alongside its route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteContext {
    Page {
        slug: String,
        /// Backing markdown file, always resolved through `originalSlug`.
        file: String,
    },
    Troubleshooter {
        slug: String,
        #[serde(rename = "relativePath")]
        relative_path: String,
        #[serde(rename = "noIndex")]
        no_index: bool,
    },
    Category {
        slug: String,
    },
}

/// A routable page: URL path bound to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub template: Template,
    pub context: RouteContext,
}

/// A permanent redirect rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub from_path: String,
    pub to_path: String,
    pub is_permanent: bool,
    pub redirect_in_browser: bool,
}

impl Redirect {
    /// A permanent, browser-applied redirect.
    pub fn permanent(from_path: impl Into<String>, to_path: impl Into<String>) -> Self {
        Self {
            from_path: from_path.into(),
            to_path: to_path.into(),
            is_permanent: true,
            redirect_in_browser: true,
        }
    }
}

/// Everything the registrar produces for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMap {
    pub routes: Vec<Route>,
    pub redirects: Vec<Redirect>,
}

impl SiteMap {
    /// Routes bound to a given template.
    pub fn routes_for(&self, template: Template) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(move |r| r.template == template)
    }
}

// ---------------------------------------------------------------------------
// Build manifest
// ---------------------------------------------------------------------------

/// Node and route counts for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCounts {
    pub categories: usize,
    pub pages: usize,
    pub linked_pages: usize,
    pub troubleshooter_nodes: usize,
    pub routes: usize,
    pub redirects: usize,
}

/// Metadata for a single written output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `manifest.json` written at the root of the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Site name from config.
    pub name: String,
    /// Tool version that produced the output.
    pub tool_version: String,
    /// When the output was written.
    pub generated_at: DateTime<Utc>,
    pub counts: BuildCounts,
    #[serde(default)]
    pub artifacts: Vec<ArtifactMeta>,
}
