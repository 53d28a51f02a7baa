//! Cross-category page links.
//!
//! A category's `links` list names pages that live elsewhere in the tree.
//! Each one is cloned under the linking category with its own slug and
//! breadcrumbs; the original page is left as it is.

use tracing::{debug, info, instrument};

use kbsite_shared::{Breadcrumb, KbSiteError, NodeId, Page, Result};
use kbsite_storage::{Node, NodeData, NodeKind, NodeStore};

/// Create the linked page copies for every category with `links`.
///
/// Must run after the category tree is complete. Reads from a fresh snapshot
/// of the store, so copies created here are never themselves link targets.
#[instrument(skip_all)]
pub fn register_links(store: &mut dyn NodeStore) -> Result<Vec<NodeId>> {
    let snapshot = store.get_nodes();
    let mut created = Vec::new();

    for category_node in snapshot.iter().filter(|n| n.kind() == NodeKind::Category) {
        let Some(category) = category_node.as_category() else {
            continue;
        };
        let Some(links) = &category.links else {
            continue;
        };

        for target in links {
            let page = snapshot
                .iter()
                .filter_map(Node::as_page)
                .find(|p| &p.slug == target)
                .ok_or_else(|| {
                    KbSiteError::validation(format!(
                        "category `{}` links to missing page `{target}`",
                        category.slug
                    ))
                })?;

            let slug = format!("{}/{}", category.slug, page.filename);
            let mut breadcrumbs = category.breadcrumbs.clone();
            breadcrumbs.push(Breadcrumb {
                title: page.title.clone(),
                slug: slug.clone(),
            });

            let linked = Page {
                slug: slug.clone(),
                parent_id: category_node.id,
                parent_slug: category.slug.clone(),
                breadcrumbs,
                ..page.clone()
            };

            let node = Node::new(format!("page-{slug}"), NodeData::Page(linked))?;
            let id = node.id;
            store.create_node(node);
            store.create_parent_child_link(category_node.id, id)?;
            debug!(category = %category.slug, target = %target, slug = %slug, "linked page");
            // Copies sharing a slug share a node; the last write wins.
            if !created.contains(&id) {
                created.push(id);
            }
        }
    }

    info!(count = created.len(), "page links registered");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsite_shared::Category;
    use kbsite_storage::{MemoryStore, query};

    fn crumb(title: &str, slug: &str) -> Breadcrumb {
        Breadcrumb {
            title: title.into(),
            slug: slug.into(),
        }
    }

    fn category(slug: &str, title: &str, links: Option<Vec<&str>>) -> Node {
        Node::new(
            format!("category-{slug}"),
            NodeData::Category(Category {
                slug: slug.into(),
                title: title.into(),
                description: None,
                icon: None,
                links: links.map(|l| l.into_iter().map(String::from).collect()),
                parent_id: None,
                parent_slug: None,
                is_top_level: true,
                breadcrumbs: vec![crumb(title, slug)],
            }),
        )
        .unwrap()
    }

    fn setup() -> (MemoryStore, Node) {
        let mut store = MemoryStore::new();
        let account = category("account", "Account", None);
        let billing = category("billing", "Billing", Some(vec!["account/reset"]));
        let reset = Node::new(
            "page-account/reset",
            NodeData::Page(Page {
                title: "Reset password".into(),
                filename: "reset".into(),
                description: Some("Locked out?".into()),
                excerpt: "Open Settings...".into(),
                priority: Some(3),
                date_published: None,
                date_modified: None,
                slug: "account/reset".into(),
                original_slug: "account/reset".into(),
                parent_id: account.id,
                parent_slug: "account".into(),
                breadcrumbs: vec![
                    crumb("Account", "account"),
                    crumb("Reset password", "account/reset"),
                ],
            }),
        )
        .unwrap();

        store.create_node(account.clone());
        store.create_node(billing.clone());
        store.create_node(reset.clone());
        store.create_parent_child_link(account.id, reset.id).unwrap();
        (store, billing)
    }

    #[test]
    fn linked_copy_is_rooted_at_linking_category() {
        let (mut store, billing) = setup();
        let original_before = query::page_by_slug(&store, "account/reset").unwrap().1.clone();

        let created = register_links(&mut store).unwrap();
        assert_eq!(created.len(), 1);

        let (id, linked) = query::page_by_slug(&store, "billing/reset").unwrap();
        assert_eq!(id, created[0]);
        assert_eq!(linked.original_slug, "account/reset");
        assert_eq!(linked.parent_slug, "billing");
        assert_eq!(linked.parent_id, billing.id);
        assert_eq!(linked.title, "Reset password");
        assert_eq!(
            linked.breadcrumbs,
            vec![crumb("Billing", "billing"), crumb("Reset password", "billing/reset")]
        );
        assert!(store.get_node(billing.id).unwrap().children.contains(&id));

        let original_after = query::page_by_slug(&store, "account/reset").unwrap().1;
        assert_eq!(&original_before, original_after);
    }

    #[test]
    fn repeated_links_create_one_copy() {
        let (mut store, _) = setup();
        let twice = category(
            "billing",
            "Billing",
            Some(vec!["account/reset", "account/reset", "account/reset"]),
        );
        store.create_node(twice);

        let created = register_links(&mut store).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(query::all_pages(&store).len(), 2);
    }

    #[test]
    fn self_link_overwrites_the_original() {
        let (mut store, _) = setup();
        store.create_node(category("account", "Account", Some(vec!["account/reset"])));

        let created = register_links(&mut store).unwrap();
        // account/reset plus the billing copy
        assert_eq!(created.len(), 2);
        assert_eq!(query::all_pages(&store).len(), 2);
        let (_, page) = query::page_by_slug(&store, "account/reset").unwrap();
        assert_eq!(page.slug, page.original_slug);
    }

    #[test]
    fn missing_target_is_rejected() {
        let mut store = MemoryStore::new();
        store.create_node(category("billing", "Billing", Some(vec!["nowhere/page"])));

        let err = register_links(&mut store).unwrap_err();
        assert!(matches!(err, KbSiteError::Validation { .. }));
        assert!(err
            .to_string()
            .contains("category `billing` links to missing page `nowhere/page`"));
    }

    #[test]
    fn categories_without_links_create_nothing() {
        let mut store = MemoryStore::new();
        store.create_node(category("account", "Account", None));
        assert!(register_links(&mut store).unwrap().is_empty());
    }
}
