//! Typed read queries over a [`NodeStore`].
//!
//! These mirror the collection queries templates run against the graph
//! (`allCategory`, `allPage`, ...) with field-equality filters and sorting.

use std::cmp::Reverse;

use kbsite_shared::{Category, FileNode, NodeId, Page, TroubleshooterNode};

use crate::{Node, NodeKind, NodeStore};

/// Every category, in creation order.
pub fn all_categories<S: NodeStore + ?Sized>(store: &S) -> Vec<(NodeId, &Category)> {
    store
        .nodes_of_kind(NodeKind::Category)
        .into_iter()
        .filter_map(|n| n.as_category().map(|c| (n.id, c)))
        .collect()
}

/// Every page, linked copies included, in creation order.
pub fn all_pages<S: NodeStore + ?Sized>(store: &S) -> Vec<(NodeId, &Page)> {
    store
        .nodes_of_kind(NodeKind::Page)
        .into_iter()
        .filter_map(|n| n.as_page().map(|p| (n.id, p)))
        .collect()
}

/// Every troubleshooter node, in creation order (root first).
pub fn all_troubleshooter_nodes<S: NodeStore + ?Sized>(
    store: &S,
) -> Vec<(NodeId, &TroubleshooterNode)> {
    store
        .nodes_of_kind(NodeKind::TroubleshooterNode)
        .into_iter()
        .filter_map(|n| n.as_troubleshooter().map(|t| (n.id, t)))
        .collect()
}

/// File nodes matching a predicate.
pub fn files<S, F>(store: &S, predicate: F) -> Vec<&FileNode>
where
    S: NodeStore + ?Sized,
    F: Fn(&FileNode) -> bool,
{
    store
        .nodes_of_kind(NodeKind::File)
        .into_iter()
        .filter_map(Node::as_file)
        .filter(|f| predicate(f))
        .collect()
}

/// First page with the given slug.
pub fn page_by_slug<'a, S: NodeStore + ?Sized>(
    store: &'a S,
    slug: &str,
) -> Option<(NodeId, &'a Page)> {
    all_pages(store).into_iter().find(|(_, p)| p.slug == slug)
}

/// Category by slug.
pub fn category_by_slug<'a, S: NodeStore + ?Sized>(
    store: &'a S,
    slug: &str,
) -> Option<(NodeId, &'a Category)> {
    all_categories(store).into_iter().find(|(_, c)| c.slug == slug)
}

/// Pages listed under a category, highest priority first, then by title.
pub fn pages_in_category<'a, S: NodeStore + ?Sized>(store: &'a S, slug: &str) -> Vec<&'a Page> {
    let mut pages: Vec<&Page> = all_pages(store)
        .into_iter()
        .map(|(_, p)| p)
        .filter(|p| p.parent_slug == slug)
        .collect();
    pages.sort_by(|a, b| {
        b.priority
            .unwrap_or(0)
            .cmp(&a.priority.unwrap_or(0))
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });
    pages
}

/// Options offered below a troubleshooter step, highest priority first.
pub fn troubleshooter_children<'a, S: NodeStore + ?Sized>(
    store: &'a S,
    parent_slug: &str,
) -> Vec<&'a TroubleshooterNode> {
    let mut children: Vec<&TroubleshooterNode> = all_troubleshooter_nodes(store)
        .into_iter()
        .map(|(_, t)| t)
        .filter(|t| t.parent_slug.as_deref() == Some(parent_slug))
        .collect();
    children.sort_by_key(|t| Reverse(t.priority));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, NodeData};
    use kbsite_shared::Breadcrumb;

    fn page(slug: &str, title: &str, parent: &str, priority: Option<i64>) -> Node {
        Node::new(
            format!("page-{slug}"),
            NodeData::Page(Page {
                title: title.into(),
                filename: slug.rsplit('/').next().unwrap_or(slug).into(),
                description: None,
                excerpt: String::new(),
                priority,
                date_published: None,
                date_modified: None,
                slug: slug.into(),
                original_slug: slug.into(),
                parent_id: NodeId::from_key(&format!("category-{parent}")),
                parent_slug: parent.into(),
                breadcrumbs: vec![Breadcrumb {
                    title: title.into(),
                    slug: slug.into(),
                }],
            }),
        )
        .unwrap()
    }

    fn step(slug: &str, parent: Option<&str>, priority: i64) -> Node {
        Node::new(
            format!("troubleshooter-node-{slug}"),
            NodeData::TroubleshooterNode(TroubleshooterNode {
                title: slug.into(),
                description: None,
                priority,
                absolute_path: format!("/t/{slug}.md"),
                relative_path: format!("{slug}.md"),
                slug: slug.into(),
                parent_id: parent.map(|p| NodeId::from_key(&format!("troubleshooter-node-{p}"))),
                parent_slug: parent.map(String::from),
            }),
        )
        .unwrap()
    }

    #[test]
    fn pages_in_category_sorted_by_priority_then_title() {
        let mut store = MemoryStore::new();
        store.create_node(page("a/zeta", "Zeta", "a", None));
        store.create_node(page("a/alpha", "Alpha", "a", None));
        store.create_node(page("a/top", "Top", "a", Some(10)));
        store.create_node(page("b/other", "Other", "b", Some(99)));

        let titles: Vec<_> = pages_in_category(&store, "a")
            .into_iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, ["Top", "Alpha", "Zeta"]);
    }

    #[test]
    fn page_by_slug_finds_match() {
        let mut store = MemoryStore::new();
        store.create_node(page("a/one", "One", "a", None));
        assert!(page_by_slug(&store, "a/one").is_some());
        assert!(page_by_slug(&store, "a/two").is_none());
    }

    #[test]
    fn troubleshooter_children_by_priority_desc() {
        let mut store = MemoryStore::new();
        store.create_node(step("root", None, 0));
        store.create_node(step("low", Some("root"), 1));
        store.create_node(step("high", Some("root"), 5));
        store.create_node(step("nested", Some("high"), 9));

        let slugs: Vec<_> = troubleshooter_children(&store, "root")
            .into_iter()
            .map(|t| t.slug.as_str())
            .collect();
        assert_eq!(slugs, ["high", "low"]);
    }

    #[test]
    fn files_filter() {
        let mut store = MemoryStore::new();
        for (source, path) in [("content", "a/x.md"), ("images", "icons/y.svg")] {
            let (dir, file) = path.rsplit_once('/').unwrap();
            let (name, ext) = file.rsplit_once('.').unwrap();
            store.create_node(
                Node::new(
                    format!("file-{source}-{path}"),
                    NodeData::File(FileNode {
                        source_instance_name: source.into(),
                        relative_directory: dir.into(),
                        relative_path: path.into(),
                        name: name.into(),
                        extension: ext.into(),
                        dir: format!("/root/{source}/{dir}"),
                        absolute_path: format!("/root/{source}/{path}"),
                        public_url: None,
                    }),
                )
                .unwrap(),
            );
        }

        let md = files(&store, |f| f.extension == "md");
        assert_eq!(md.len(), 1);
        assert_eq!(md[0].relative_path, "a/x.md");
    }
}
