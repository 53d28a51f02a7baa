//! Category icon resolution.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use kbsite_shared::{IMAGES_SOURCE, IconData, NodeId, Result};
use kbsite_storage::{Node, NodeData, NodeStore, query};

/// Attach an `IconData` child to every category, resolving its icon name
/// against the image assets in `icons_directory`.
///
/// Unknown icon names resolve to `None`. Returns the number of icons attached.
#[instrument(skip_all, fields(icons_directory = %icons_directory))]
pub fn attach_icons(store: &mut dyn NodeStore, icons_directory: &str) -> Result<usize> {
    let urls: HashMap<String, String> = query::files(&*store, |f| {
        f.source_instance_name == IMAGES_SOURCE && f.relative_directory == icons_directory
    })
    .into_iter()
    .filter_map(|f| f.public_url.clone().map(|url| (f.name.clone(), url)))
    .collect();

    let categories: Vec<(NodeId, String, Option<String>)> = query::all_categories(&*store)
        .into_iter()
        .map(|(id, c)| (id, c.slug.clone(), c.icon.clone()))
        .collect();

    for (category_id, slug, icon_name) in &categories {
        let icon = icon_name.as_ref().and_then(|name| urls.get(name).cloned());
        debug!(category = %slug, resolved = icon.is_some(), "attaching icon");

        let node = Node::new(
            format!("icon-data-{slug}"),
            NodeData::IconData(IconData {
                icon,
                parent_id: *category_id,
            }),
        )?;
        let icon_id = node.id;
        store.create_node(node);
        store.create_parent_child_link(*category_id, icon_id)?;
    }

    info!(count = categories.len(), available = urls.len(), "icons attached");
    Ok(categories.len())
}
