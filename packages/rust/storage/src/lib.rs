//! In-memory node store for the content graph.
//!
//! The [`NodeStore`] trait is the only way build phases read and write
//! nodes. The store is append-only within a build: nodes are created and
//! linked, never deleted.
//!
//! **Snapshot rule:** [`NodeStore::get_nodes`] returns an owned copy. A phase
//! that runs after another phase has written to the store must take a new
//! snapshot instead of reusing an earlier one.

mod node;
pub mod query;

use std::collections::HashMap;

use tracing::debug;

use kbsite_shared::{KbSiteError, NodeId, Result};

pub use node::{Node, NodeData, NodeInternal, NodeKind, content_digest};

/// Graph store contract used by sourcing, graph building, and registration.
pub trait NodeStore {
    /// Insert a node. A node with the same id is replaced (last write wins),
    /// keeping its position and existing edges.
    fn create_node(&mut self, node: Node);

    /// Record `child` under `parent`. Both nodes must already exist.
    fn create_parent_child_link(&mut self, parent: NodeId, child: NodeId) -> Result<()>;

    /// Look up a node by id.
    fn get_node(&self, id: NodeId) -> Option<&Node>;

    /// Owned snapshot of every node, in creation order.
    fn get_nodes(&self) -> Vec<Node>;

    /// Nodes of one kind, in creation order.
    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node>;

    /// Number of nodes held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Primary store handle: a hash map keyed by id plus creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: HashMap<NodeId, Node>,
    order: Vec<NodeId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryStore {
    fn create_node(&mut self, mut node: Node) {
        match self.nodes.get(&node.id) {
            Some(existing) => {
                debug!(key = %node.key, kind = %node.kind(), "replacing node");
                node.children = existing.children.clone();
                node.parent = node.parent.or(existing.parent);
            }
            None => self.order.push(node.id),
        }
        self.nodes.insert(node.id, node);
    }

    fn create_parent_child_link(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&parent) {
            return Err(KbSiteError::Store(format!(
                "cannot link under unknown parent node {parent}"
            )));
        }

        let child_node = self
            .nodes
            .get_mut(&child)
            .ok_or_else(|| KbSiteError::Store(format!("cannot link unknown child node {child}")))?;
        child_node.parent = Some(parent);

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            if !parent_node.children.contains(&child) {
                parent_node.children.push(child);
            }
        }
        Ok(())
    }

    fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn get_nodes(&self) -> Vec<Node> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .cloned()
            .collect()
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| node.kind() == kind)
            .collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsite_shared::CategoryData;

    fn data_node(key: &str, title: &str) -> Node {
        Node::new(
            key,
            NodeData::CategoryData(CategoryData {
                title: Some(title.into()),
                ..Default::default()
            }),
        )
        .unwrap()
    }

    #[test]
    fn create_and_get() {
        let mut store = MemoryStore::new();
        let node = data_node("category-data-a", "A");
        let id = node.id;
        store.create_node(node);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_node(id).unwrap().key, "category-data-a");
        assert_eq!(store.nodes_of_kind(NodeKind::CategoryData).len(), 1);
        assert!(store.nodes_of_kind(NodeKind::Page).is_empty());
    }

    #[test]
    fn snapshot_keeps_creation_order() {
        let mut store = MemoryStore::new();
        for key in ["c", "a", "b"] {
            store.create_node(data_node(key, key));
        }
        let keys: Vec<_> = store.get_nodes().into_iter().map(|n| n.key).collect();
        assert_eq!(keys, ["c", "a", "b"]);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let mut store = MemoryStore::new();
        store.create_node(data_node("a", "A"));
        let before = store.get_nodes();

        store.create_node(data_node("b", "B"));
        assert_eq!(before.len(), 1);
        assert_eq!(store.get_nodes().len(), 2);
    }

    #[test]
    fn link_sets_both_sides() {
        let mut store = MemoryStore::new();
        let parent = data_node("parent", "P");
        let child = data_node("child", "C");
        let (pid, cid) = (parent.id, child.id);
        store.create_node(parent);
        store.create_node(child);

        store.create_parent_child_link(pid, cid).unwrap();
        store.create_parent_child_link(pid, cid).unwrap();

        assert_eq!(store.get_node(pid).unwrap().children, vec![cid]);
        assert_eq!(store.get_node(cid).unwrap().parent, Some(pid));
    }

    #[test]
    fn link_to_unknown_node_fails() {
        let mut store = MemoryStore::new();
        let parent = data_node("parent", "P");
        let pid = parent.id;
        store.create_node(parent);

        let err = store
            .create_parent_child_link(pid, NodeId::from_key("missing"))
            .unwrap_err();
        assert!(matches!(err, KbSiteError::Store(_)));
    }

    #[test]
    fn duplicate_key_last_write_wins() {
        let mut store = MemoryStore::new();
        let parent = data_node("parent", "first");
        let child = data_node("child", "C");
        let (pid, cid) = (parent.id, child.id);
        store.create_node(parent);
        store.create_node(child);
        store.create_parent_child_link(pid, cid).unwrap();

        store.create_node(data_node("parent", "second"));

        assert_eq!(store.len(), 2);
        let parent = store.get_node(pid).unwrap();
        assert_eq!(
            parent.as_category_data().unwrap().title.as_deref(),
            Some("second")
        );
        assert_eq!(parent.children, vec![cid]);
    }
}
