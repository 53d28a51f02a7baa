//! End-to-end build: source → graph → icons → registration → assemble.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use kbsite_shared::{BuildConfig, BuildCounts, BuildManifest, NodeId, Result, SiteMap};
use kbsite_storage::{MemoryStore, NodeStore, query};

use crate::assembler::{AssembleConfig, AssetCopy};
use crate::diff::{self, NodeDiff};
use crate::graph::{self, CategoryTree, GraphOptions};
use crate::source::{self, SourceReport};
use crate::troubleshooter::{self, NO_TROUBLESHOOTER_WARNING, TroubleshooterTree};
use crate::{icons, links, registrar};

/// The populated content graph.
#[derive(Debug)]
pub struct ContentGraph {
    pub store: MemoryStore,
    pub sourced: SourceReport,
    pub categories: Vec<CategoryTree>,
    pub troubleshooter: Option<TroubleshooterTree>,
    pub linked_pages: Vec<NodeId>,
    pub warnings: Vec<String>,
}

/// A graph with its icons attached and its routes registered.
#[derive(Debug)]
pub struct SitePlan {
    pub graph: ContentGraph,
    pub site: SiteMap,
    pub counts: BuildCounts,
    pub icons: usize,
    pub warnings: Vec<String>,
}

/// Result of [`build_site`].
#[derive(Debug)]
pub struct BuildResult {
    /// Directory the output was written to.
    pub output_dir: PathBuf,
    pub counts: BuildCounts,
    /// Changes since the previous build in the same output directory.
    pub diff: NodeDiff,
    pub warnings: Vec<String>,
    pub manifest: BuildManifest,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting build status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for every non-fatal problem.
    fn warning(&self, message: &str);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn warning(&self, _message: &str) {}
    fn done(&self, _result: &BuildResult) {}
}

/// Source the content and build the category, page, troubleshooter, and
/// link nodes.
#[instrument(skip_all, fields(content = %config.content_dir.display()))]
pub async fn build_graph(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<ContentGraph> {
    let mut store = MemoryStore::new();
    let mut warnings = Vec::new();

    progress.phase("Sourcing content");
    let sourced = source::source_all(&mut store, config).await?;

    progress.phase("Building category tree");
    let sourced_nodes = store.get_nodes();
    let options = GraphOptions {
        excerpt_length: config.excerpt_length,
    };
    let categories = graph::build_category_tree(&mut store, &sourced_nodes, &options)?;

    progress.phase("Building troubleshooter tree");
    let troubleshooter =
        troubleshooter::build_troubleshooter_tree(&mut store, &sourced_nodes, "")?;
    if troubleshooter.is_none() {
        progress.warning(NO_TROUBLESHOOTER_WARNING);
        warnings.push(NO_TROUBLESHOOTER_WARNING.to_string());
    }

    progress.phase("Linking pages");
    let linked_pages = links::register_links(&mut store)?;

    Ok(ContentGraph {
        store,
        sourced,
        categories,
        troubleshooter,
        linked_pages,
        warnings,
    })
}

/// Build the graph, attach icons, and register every route and redirect.
/// Nothing is written to disk.
#[instrument(skip_all)]
pub async fn plan_site(config: &BuildConfig, progress: &dyn ProgressReporter) -> Result<SitePlan> {
    let mut graph = build_graph(config, progress).await?;

    progress.phase("Attaching icons");
    let icons = icons::attach_icons(&mut graph.store, &config.icons_directory)?;

    progress.phase("Registering routes");
    let registration = registrar::register_site(&graph.store, &config.content_dir).await?;
    for warning in &registration.warnings {
        progress.warning(warning);
    }

    let counts = count(&graph, &registration.site);
    let mut warnings = graph.warnings.clone();
    warnings.extend(registration.warnings);

    Ok(SitePlan {
        graph,
        site: registration.site,
        counts,
        icons,
        warnings,
    })
}

/// Run the full build and write the output directory.
#[instrument(skip_all, fields(output = %config.output_dir.display()))]
pub async fn build_site(
    config: &BuildConfig,
    tool_version: &str,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();
    info!(site = %config.site_name, "starting build");

    let plan = plan_site(config, progress).await?;

    progress.phase("Comparing with previous build");
    let records = diff::node_records(&plan.graph.store);
    let previous = diff::load_previous(&config.output_dir);
    let node_diff = diff::diff_nodes(previous.as_deref(), &records);

    progress.phase("Writing output");
    let assemble_config = AssembleConfig {
        output_dir: config.output_dir.clone(),
        site_name: config.site_name.clone(),
        tool_version: tool_version.to_string(),
    };
    let assets = image_assets(&plan.graph.store);
    let assembled = crate::assembler::assemble(
        &assemble_config,
        &plan.site,
        &records,
        &plan.counts,
        &assets,
    )?;

    let result = BuildResult {
        output_dir: assembled.output_dir,
        counts: plan.counts,
        diff: node_diff,
        warnings: plan.warnings,
        manifest: assembled.manifest,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        categories = result.counts.categories,
        pages = result.counts.pages,
        routes = result.counts.routes,
        redirects = result.counts.redirects,
        warnings = result.warnings.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "build complete"
    );

    Ok(result)
}

/// Source the content without building anything, after checking it exists.
pub async fn check_content(config: &BuildConfig) -> Result<SourceReport> {
    let mut store = MemoryStore::new();
    source::source_all(&mut store, config).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn count(graph: &ContentGraph, site: &SiteMap) -> BuildCounts {
    // A link copy whose slug matches its source file overwrote that page
    // and counts as the page itself.
    let (pages, linked_pages): (Vec<_>, Vec<_>) = query::all_pages(&graph.store)
        .into_iter()
        .partition(|(_, page)| page.slug == page.original_slug);
    BuildCounts {
        categories: query::all_categories(&graph.store).len(),
        pages: pages.len(),
        linked_pages: linked_pages.len(),
        troubleshooter_nodes: query::all_troubleshooter_nodes(&graph.store).len(),
        routes: site.routes.len(),
        redirects: site.redirects.len(),
    }
}

fn image_assets(store: &MemoryStore) -> Vec<AssetCopy> {
    query::files(store, |f| f.public_url.is_some())
        .into_iter()
        .filter_map(|f| {
            f.public_url.as_ref().map(|url| AssetCopy {
                source: Path::new(&f.absolute_path).to_path_buf(),
                public_url: url.clone(),
            })
        })
        .collect()
}
