//! Node envelope: identity, graph edges, and content fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use kbsite_shared::{
    Category, CategoryData, FileNode, IconData, MarkdownRemark, NodeId, Page, Result,
    TroubleshooterNode,
};

/// Node types held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    MarkdownRemark,
    CategoryData,
    Category,
    Page,
    IconData,
    TroubleshooterNode,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "File",
            Self::MarkdownRemark => "MarkdownRemark",
            Self::CategoryData => "CategoryData",
            Self::Category => "Category",
            Self::Page => "Page",
            Self::IconData => "IconData",
            Self::TroubleshooterNode => "TroubleshooterNode",
        }
    }

    /// Kinds produced by the graph builder rather than by sourcing.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::Category | Self::Page | Self::IconData | Self::TroubleshooterNode
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    File(FileNode),
    MarkdownRemark(MarkdownRemark),
    CategoryData(CategoryData),
    Category(Category),
    Page(Page),
    IconData(IconData),
    TroubleshooterNode(TroubleshooterNode),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::File(_) => NodeKind::File,
            Self::MarkdownRemark(_) => NodeKind::MarkdownRemark,
            Self::CategoryData(_) => NodeKind::CategoryData,
            Self::Category(_) => NodeKind::Category,
            Self::Page(_) => NodeKind::Page,
            Self::IconData(_) => NodeKind::IconData,
            Self::TroubleshooterNode(_) => NodeKind::TroubleshooterNode,
        }
    }

    /// Serialize the record itself (no envelope fields).
    fn to_content(&self) -> Result<String> {
        let content = match self {
            Self::File(d) => serde_json::to_string(d)?,
            Self::MarkdownRemark(d) => serde_json::to_string(d)?,
            Self::CategoryData(d) => serde_json::to_string(d)?,
            Self::Category(d) => serde_json::to_string(d)?,
            Self::Page(d) => serde_json::to_string(d)?,
            Self::IconData(d) => serde_json::to_string(d)?,
            Self::TroubleshooterNode(d) => serde_json::to_string(d)?,
        };
        Ok(content)
    }
}

/// Bookkeeping the store uses for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInternal {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// JSON serialization of the node's data.
    pub content: String,
    /// SHA-256 hex of `content`.
    pub content_digest: String,
}

/// A node in the content graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Human-readable key the id is derived from.
    pub key: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub internal: NodeInternal,
    pub data: NodeData,
}

impl Node {
    /// Build a node with a key-derived id and a fresh fingerprint of `data`.
    ///
    /// Graph edges are not part of the fingerprint, so linking a node never
    /// changes its digest.
    pub fn new(key: impl Into<String>, data: NodeData) -> Result<Self> {
        let key = key.into();
        let content = data.to_content()?;

        Ok(Self {
            id: NodeId::from_key(&key),
            key,
            parent: None,
            children: Vec::new(),
            internal: NodeInternal {
                kind: data.kind(),
                content_digest: content_digest(&content),
                content,
            },
            data,
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.internal.kind
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match &self.data {
            NodeData::File(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_markdown(&self) -> Option<&MarkdownRemark> {
        match &self.data {
            NodeData::MarkdownRemark(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_category_data(&self) -> Option<&CategoryData> {
        match &self.data {
            NodeData::CategoryData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&Category> {
        match &self.data {
            NodeData::Category(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<&Page> {
        match &self.data {
            NodeData::Page(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_icon_data(&self) -> Option<&IconData> {
        match &self.data {
            NodeData::IconData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_troubleshooter(&self) -> Option<&TroubleshooterNode> {
        match &self.data {
            NodeData::TroubleshooterNode(d) => Some(d),
            _ => None,
        }
    }
}

/// SHA-256 hex digest of a string.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsite_shared::Breadcrumb;

    fn category(slug: &str, title: &str) -> Category {
        Category {
            slug: slug.into(),
            title: title.into(),
            description: None,
            icon: None,
            links: None,
            parent_id: None,
            parent_slug: None,
            is_top_level: true,
            breadcrumbs: vec![Breadcrumb {
                title: title.into(),
                slug: slug.into(),
            }],
        }
    }

    #[test]
    fn same_data_same_fingerprint() {
        let a = Node::new("category-billing", NodeData::Category(category("billing", "Billing")))
            .unwrap();
        let b = Node::new("category-billing", NodeData::Category(category("billing", "Billing")))
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.internal.content_digest, b.internal.content_digest);
        assert_eq!(a.internal.content_digest.len(), 64);
    }

    #[test]
    fn different_data_different_fingerprint() {
        let a = Node::new("category-billing", NodeData::Category(category("billing", "Billing")))
            .unwrap();
        let b = Node::new("category-billing", NodeData::Category(category("billing", "Payments")))
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.internal.content_digest, b.internal.content_digest);
    }

    #[test]
    fn content_is_record_json() {
        let node = Node::new("category-billing", NodeData::Category(category("billing", "Billing")))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&node.internal.content).unwrap();
        assert_eq!(value["slug"], "billing");
        assert_eq!(value["isTopLevel"], true);
        assert_eq!(node.kind(), NodeKind::Category);
        assert!(node.as_category().is_some());
        assert!(node.as_page().is_none());
    }

    #[test]
    fn derived_kinds() {
        assert!(NodeKind::Page.is_derived());
        assert!(NodeKind::IconData.is_derived());
        assert!(!NodeKind::File.is_derived());
        assert!(!NodeKind::MarkdownRemark.is_derived());
    }
}
