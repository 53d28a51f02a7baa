//! Category and page graph construction.
//!
//! Categories mirror the directory tree of `category.yml` files under the
//! content source. Each call to [`build_categories`] handles one directory
//! level; the pattern narrows from `*` to `<parent>/*` as it recurses, so the
//! recursion depth is bounded by the authored directory depth.

use glob::{MatchOptions, Pattern};
use tracing::{debug, info, instrument};

use kbsite_shared::{
    Breadcrumb, CONTENT_SOURCE, Category, FileNode, KbSiteError, NodeId, Page, Result,
};
use kbsite_storage::{Node, NodeData, NodeKind, NodeStore};

/// Tunables for derived page data.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Plain-text characters kept in a page excerpt.
    pub excerpt_length: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            excerpt_length: 200,
        }
    }
}

/// Shape of the category tree as it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTree {
    pub id: NodeId,
    pub slug: String,
    pub pages: Vec<NodeId>,
    pub subcategories: Vec<CategoryTree>,
}

impl CategoryTree {
    /// Categories in this subtree, itself included.
    pub fn category_count(&self) -> usize {
        1 + self
            .subcategories
            .iter()
            .map(CategoryTree::category_count)
            .sum::<usize>()
    }

    /// Pages in this subtree.
    pub fn page_count(&self) -> usize {
        self.pages.len()
            + self
                .subcategories
                .iter()
                .map(CategoryTree::page_count)
                .sum::<usize>()
    }
}

/// Build every category from the top level down.
#[instrument(skip_all)]
pub fn build_category_tree(
    store: &mut dyn NodeStore,
    nodes: &[Node],
    options: &GraphOptions,
) -> Result<Vec<CategoryTree>> {
    let trees = build_categories(store, nodes, "*", None, options)?;

    info!(
        top_level = trees.len(),
        categories = trees.iter().map(CategoryTree::category_count).sum::<usize>(),
        pages = trees.iter().map(CategoryTree::page_count).sum::<usize>(),
        "category tree built"
    );

    Ok(trees)
}

/// Create the categories whose directory matches `pattern`, then their pages
/// and subcategories.
///
/// `nodes` is the snapshot of sourced nodes; it is only read. Derived nodes
/// and edges are written to `store`.
pub fn build_categories(
    store: &mut dyn NodeStore,
    nodes: &[Node],
    pattern: &str,
    parent: Option<(NodeId, &Category)>,
    options: &GraphOptions,
) -> Result<Vec<CategoryTree>> {
    let matcher = directory_pattern(pattern)?;
    let mut built = Vec::new();

    let category_files = nodes.iter().filter(|n| {
        n.as_file().is_some_and(|f| {
            f.source_instance_name == CONTENT_SOURCE
                && f.name == "category"
                && f.extension == "yml"
                && directory_matches(&matcher, &f.relative_directory)
        })
    });

    for file_node in category_files {
        let Some(file) = file_node.as_file() else {
            continue;
        };
        let data = sidecar(nodes, file_node, NodeKind::CategoryData)?
            .as_category_data()
            .cloned()
            .unwrap_or_default();

        let slug = file.relative_directory.clone();
        let title = data.title.ok_or_else(|| {
            KbSiteError::validation(format!("category `{}` has no title", file.relative_path))
        })?;

        let mut breadcrumbs = parent
            .map(|(_, p)| p.breadcrumbs.clone())
            .unwrap_or_default();
        breadcrumbs.push(Breadcrumb {
            title: title.clone(),
            slug: slug.clone(),
        });

        let category = Category {
            slug: slug.clone(),
            title,
            description: data.description,
            icon: data.icon,
            links: data.links,
            parent_id: parent.map(|(id, _)| id),
            parent_slug: parent.map(|(_, p)| p.slug.clone()),
            is_top_level: parent.is_none(),
            breadcrumbs,
        };

        let node = Node::new(format!("category-{slug}"), NodeData::Category(category.clone()))?;
        let id = node.id;
        store.create_node(node);
        debug!(slug = %slug, "created category");

        let pages = build_pages(store, nodes, &Pattern::escape(&slug), (id, &category), options)?;
        for page in &pages {
            store.create_parent_child_link(id, *page)?;
        }

        let subcategories = build_categories(
            store,
            nodes,
            &format!("{}/*", Pattern::escape(&slug)),
            Some((id, &category)),
            options,
        )?;
        for sub in &subcategories {
            store.create_parent_child_link(id, sub.id)?;
        }

        built.push(CategoryTree {
            id,
            slug,
            pages,
            subcategories,
        });
    }

    Ok(built)
}

/// Create a page for every content markdown file whose directory matches
/// `pattern`. The caller links the returned ids under the category.
pub fn build_pages(
    store: &mut dyn NodeStore,
    nodes: &[Node],
    pattern: &str,
    parent: (NodeId, &Category),
    options: &GraphOptions,
) -> Result<Vec<NodeId>> {
    let matcher = directory_pattern(pattern)?;
    let (parent_id, category) = parent;
    let mut ids = Vec::new();

    let markdown_files = nodes.iter().filter(|n| {
        n.as_file().is_some_and(|f| {
            f.source_instance_name == CONTENT_SOURCE
                && f.extension == "md"
                && directory_matches(&matcher, &f.relative_directory)
        })
    });

    for file_node in markdown_files {
        let Some(file) = file_node.as_file() else {
            continue;
        };
        let page = page_from_file(nodes, file_node, file, parent_id, category, options)?;

        let node = Node::new(format!("page-{}", page.slug), NodeData::Page(page))?;
        debug!(key = %node.key, "created page");
        ids.push(node.id);
        store.create_node(node);
    }

    Ok(ids)
}

fn page_from_file(
    nodes: &[Node],
    file_node: &Node,
    file: &FileNode,
    parent_id: NodeId,
    category: &Category,
    options: &GraphOptions,
) -> Result<Page> {
    let remark = sidecar(nodes, file_node, NodeKind::MarkdownRemark)?
        .as_markdown()
        .ok_or_else(|| missing_sidecar("MarkdownRemark", file))?;

    let frontmatter = remark.frontmatter.clone().ok_or_else(|| {
        KbSiteError::validation(format!("page `{}` has no frontmatter", file.relative_path))
    })?;
    let title = frontmatter.title.ok_or_else(|| {
        KbSiteError::validation(format!("page `{}` has no title", file.relative_path))
    })?;

    let slug = file
        .relative_path
        .strip_suffix(".md")
        .unwrap_or(&file.relative_path)
        .to_string();

    let mut breadcrumbs = category.breadcrumbs.clone();
    breadcrumbs.push(Breadcrumb {
        title: title.clone(),
        slug: slug.clone(),
    });

    Ok(Page {
        title,
        filename: file.name.clone(),
        description: frontmatter.description,
        excerpt: kbsite_markdown::excerpt(&remark.raw_markdown_body, options.excerpt_length),
        priority: frontmatter.priority,
        date_published: frontmatter.date_published,
        date_modified: frontmatter.date_modified,
        original_slug: slug.clone(),
        slug,
        parent_id,
        parent_slug: category.slug.clone(),
        breadcrumbs,
    })
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Compile a directory glob. `*` never crosses a `/`.
pub(crate) fn directory_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| KbSiteError::validation(format!("invalid directory pattern `{pattern}`: {e}")))
}

/// Match a relative directory. The source root itself never matches.
pub(crate) fn directory_matches(pattern: &Pattern, directory: &str) -> bool {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    !directory.is_empty() && pattern.matches_with(directory, OPTIONS)
}

/// The parsed child of a sourced file.
pub(crate) fn sidecar<'a>(nodes: &'a [Node], file_node: &Node, kind: NodeKind) -> Result<&'a Node> {
    nodes
        .iter()
        .find(|n| n.parent == Some(file_node.id) && n.kind() == kind)
        .ok_or_else(|| KbSiteError::MissingSidecar {
            kind: kind.as_str(),
            path: file_node
                .as_file()
                .map(|f| f.relative_path.clone())
                .unwrap_or_else(|| file_node.key.clone()),
        })
}

fn missing_sidecar(kind: &'static str, file: &FileNode) -> KbSiteError {
    KbSiteError::MissingSidecar {
        kind,
        path: file.relative_path.clone(),
    }
}
