//! Troubleshooter decision tree.
//!
//! The tree mirrors the troubleshooter source directory: the markdown file at
//! the root directory is the entry point, and the markdown files one directory
//! below a node are its options.

use glob::Pattern;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use kbsite_shared::{
    KbSiteError, NodeId, Result, TROUBLESHOOTER_ROOT_SLUG, TROUBLESHOOTER_SOURCE,
    TroubleshooterNode,
};
use kbsite_storage::{Node, NodeData, NodeKind, NodeStore};

use crate::graph::{directory_matches, directory_pattern, sidecar};

/// Warning recorded when the troubleshooter source has no entry point.
pub const NO_TROUBLESHOOTER_WARNING: &str = "No troubleshooter content found";

/// Shape of the built decision tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TroubleshooterTree {
    pub id: NodeId,
    pub slug: String,
    pub children: Vec<TroubleshooterTree>,
}

impl TroubleshooterTree {
    /// Steps in this subtree, itself included.
    pub fn step_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TroubleshooterTree::step_count)
            .sum::<usize>()
    }
}

/// Build the tree rooted at the markdown file in `root_directory` (relative to
/// the troubleshooter source; `""` is the source root).
///
/// Returns `None` with a warning when no such file exists.
#[instrument(skip_all, fields(root = %root_directory))]
pub fn build_troubleshooter_tree(
    store: &mut dyn NodeStore,
    nodes: &[Node],
    root_directory: &str,
) -> Result<Option<TroubleshooterTree>> {
    let root = nodes.iter().find(|n| {
        n.as_file().is_some_and(|f| {
            f.source_instance_name == TROUBLESHOOTER_SOURCE
                && f.extension == "md"
                && f.relative_directory == root_directory
        })
    });

    let Some(root) = root else {
        warn!("{NO_TROUBLESHOOTER_WARNING}");
        return Ok(None);
    };

    let tree = build_step(store, nodes, root, None)?;
    info!(nodes = tree.step_count(), "troubleshooter tree built");
    Ok(Some(tree))
}

fn build_step(
    store: &mut dyn NodeStore,
    nodes: &[Node],
    file_node: &Node,
    parent: Option<(NodeId, &str)>,
) -> Result<TroubleshooterTree> {
    let Some(file) = file_node.as_file() else {
        return Err(KbSiteError::Store(format!(
            "node {} is not a file",
            file_node.key
        )));
    };

    let remark = sidecar(nodes, file_node, NodeKind::MarkdownRemark)?
        .as_markdown()
        .ok_or_else(|| KbSiteError::MissingSidecar {
            kind: "MarkdownRemark",
            path: file.relative_path.clone(),
        })?;
    let frontmatter = remark.frontmatter.clone().ok_or_else(|| {
        KbSiteError::validation(format!(
            "troubleshooter step `{}` has no frontmatter",
            file.relative_path
        ))
    })?;
    let title = frontmatter.title.ok_or_else(|| {
        KbSiteError::validation(format!(
            "troubleshooter step `{}` has no title",
            file.relative_path
        ))
    })?;

    let slug = match parent {
        None => TROUBLESHOOTER_ROOT_SLUG.to_string(),
        Some(_) => format!("{TROUBLESHOOTER_ROOT_SLUG}/{}", hash8(&file.relative_path)),
    };
    let key = if file.relative_directory.is_empty() {
        "troubleshooter-node-root".to_string()
    } else {
        format!("troubleshooter-node-{}", file.relative_directory)
    };

    let step = TroubleshooterNode {
        title,
        description: frontmatter.description,
        priority: frontmatter.priority.unwrap_or(0),
        absolute_path: file.absolute_path.clone(),
        relative_path: file.relative_path.clone(),
        slug: slug.clone(),
        parent_id: parent.map(|(id, _)| id),
        parent_slug: parent.map(|(_, s)| s.to_string()),
    };

    let node = Node::new(key, NodeData::TroubleshooterNode(step))?;
    let id = node.id;
    store.create_node(node);
    debug!(slug = %slug, path = %file.relative_path, "created troubleshooter step");

    let child_pattern = if file.relative_directory.is_empty() {
        "*".to_string()
    } else {
        format!("{}/*", Pattern::escape(&file.relative_directory))
    };
    let matcher = directory_pattern(&child_pattern)?;

    let child_files = nodes.iter().filter(|n| {
        n.as_file().is_some_and(|f| {
            f.source_instance_name == TROUBLESHOOTER_SOURCE
                && f.extension == "md"
                && directory_matches(&matcher, &f.relative_directory)
        })
    });

    let mut children = Vec::new();
    for child in child_files {
        let subtree = build_step(store, nodes, child, Some((id, slug.as_str())))?;
        store.create_parent_child_link(id, subtree.id)?;
        children.push(subtree);
    }

    Ok(TroubleshooterTree {
        id,
        slug,
        children,
    })
}

/// First 8 hex characters of the SHA-256 of `input`.
fn hash8(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceOptions, source_directory};
    use crate::testing::{article, write};
    use kbsite_storage::{MemoryStore, query};
    use regex::Regex;

    async fn sourced(root: &std::path::Path) -> MemoryStore {
        let mut store = MemoryStore::new();
        let options = SourceOptions {
            public_path: "/static".into(),
        };
        source_directory(&mut store, TROUBLESHOOTER_SOURCE, root, &options)
            .await
            .unwrap();
        store
    }

    fn build(store: &mut MemoryStore) -> Result<Option<TroubleshooterTree>> {
        let nodes = store.get_nodes();
        build_troubleshooter_tree(store, &nodes, "")
    }

    fn decision_tree(root: &std::path::Path) {
        write(root, "index.md", &article("What is wrong?", None, "Pick one."));
        write(root, "wifi/index.md", &article("Wi-Fi", Some(1), "Check the router."));
        write(root, "wifi/slow/index.md", &article("Slow Wi-Fi", None, "Move closer."));
        write(root, "power/index.md", &article("No power", Some(5), "Check the cable."));
    }

    #[tokio::test]
    async fn builds_tree_from_directories() {
        let tmp = tempfile::tempdir().unwrap();
        decision_tree(tmp.path());
        let mut store = sourced(tmp.path()).await;

        let tree = build(&mut store).unwrap().expect("tree");
        assert_eq!(tree.slug, "troubleshooter");
        assert_eq!(tree.step_count(), 4);
        assert_eq!(tree.children.len(), 2);

        let wifi = tree
            .children
            .iter()
            .find(|c| c.children.len() == 1)
            .expect("wifi step");
        let root_node = store.get_node(tree.id).unwrap();
        assert!(root_node.children.contains(&wifi.id));
        assert_eq!(store.get_node(wifi.id).unwrap().parent, Some(tree.id));
    }

    #[tokio::test]
    async fn slugs_have_expected_shape_and_are_stable() {
        let tmp = tempfile::tempdir().unwrap();
        decision_tree(tmp.path());

        let mut first = sourced(tmp.path()).await;
        build(&mut first).unwrap();
        let mut second = sourced(tmp.path()).await;
        build(&mut second).unwrap();

        let shape = Regex::new(r"^troubleshooter/[0-9a-f]{8}$").unwrap();
        let steps = query::all_troubleshooter_nodes(&first);
        for (_, step) in &steps {
            if step.is_root() {
                assert_eq!(step.slug, "troubleshooter");
            } else {
                assert!(shape.is_match(&step.slug), "{}", step.slug);
            }
        }

        let slugs = |store: &MemoryStore| -> Vec<String> {
            query::all_troubleshooter_nodes(store)
                .into_iter()
                .map(|(_, s)| s.slug.clone())
                .collect()
        };
        assert_eq!(slugs(&first), slugs(&second));
    }

    #[tokio::test]
    async fn children_sorted_by_priority_and_default_to_zero() {
        let tmp = tempfile::tempdir().unwrap();
        decision_tree(tmp.path());
        let mut store = sourced(tmp.path()).await;
        build(&mut store).unwrap();

        let titles: Vec<_> = query::troubleshooter_children(&store, "troubleshooter")
            .into_iter()
            .map(|s| (s.title.as_str(), s.priority))
            .collect();
        assert_eq!(titles, [("No power", 5), ("Wi-Fi", 1)]);

        let (_, root) = query::all_troubleshooter_nodes(&store)[0];
        assert_eq!(root.priority, 0);
        assert!(root.parent_slug.is_none());
    }

    #[tokio::test]
    async fn missing_root_builds_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "wifi/index.md", &article("Wi-Fi", None, "x"));
        let mut store = sourced(tmp.path()).await;

        assert!(build(&mut store).unwrap().is_none());
        assert!(query::all_troubleshooter_nodes(&store).is_empty());
    }

    #[tokio::test]
    async fn step_without_title_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "index.md", "---\ndescription: no title\n---\n");
        let mut store = sourced(tmp.path()).await;

        let err = build(&mut store).unwrap_err();
        assert!(err.to_string().contains("`index.md` has no title"));
    }

    #[test]
    fn hash8_is_short_hex() {
        let h = hash8("wifi/index.md");
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, hash8("wifi/index.md"));
        assert_ne!(h, hash8("power/index.md"));
    }
}
