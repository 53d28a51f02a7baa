//! Route and redirect registration.
//!
//! Reads the finished graph and produces the [`SiteMap`] handed to the
//! presentation layer. Registration order: categories, pages (each with its
//! legacy `.html` redirect), troubleshooter steps, then `redirects.yml`.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use kbsite_shared::{KbSiteError, Redirect, Result, Route, RouteContext, SiteMap, Template};
use kbsite_storage::{NodeStore, query};

/// File name of the top-level redirect list in the content directory.
pub const REDIRECTS_FILE: &str = "redirects.yml";

/// Warning recorded when the content directory has no redirect list.
pub const NO_REDIRECTS_WARNING: &str =
    "`redirects.yml` file not found, redirects will not be registered";

/// Routes and redirects plus the non-fatal problems met on the way.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub site: SiteMap,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RedirectsFile {
    redirects: Vec<RedirectEntry>,
}

#[derive(Debug, Deserialize)]
struct RedirectEntry {
    from: String,
    to: String,
}

/// Register everything in the graph, then the redirect list in `content_dir`.
#[instrument(skip_all, fields(content = %content_dir.display()))]
pub async fn register_site<S: NodeStore + ?Sized>(
    store: &S,
    content_dir: &Path,
) -> Result<Registration> {
    let mut registration = Registration::default();
    let site = &mut registration.site;

    register_categories(store, site);
    register_pages(store, site);
    register_troubleshooter_nodes(store, site);

    if let Some(warning) = register_top_level_redirects(content_dir, site).await? {
        registration.warnings.push(warning);
    }

    info!(
        routes = registration.site.routes.len(),
        redirects = registration.site.redirects.len(),
        "site registered"
    );

    Ok(registration)
}

/// One route per category at `/<slug>`.
pub fn register_categories<S: NodeStore + ?Sized>(store: &S, site: &mut SiteMap) {
    for (_, category) in query::all_categories(store) {
        site.routes.push(Route {
            path: format!("/{}", category.slug),
            template: Template::Category,
            context: RouteContext::Category {
                slug: category.slug.clone(),
            },
        });
    }
}

/// One route per page, linked copies included, plus `/<slug>.html` redirects.
///
/// The page context always names the backing file through `originalSlug`.
pub fn register_pages<S: NodeStore + ?Sized>(store: &S, site: &mut SiteMap) {
    for (_, page) in query::all_pages(store) {
        let path = format!("/{}", page.slug);
        site.routes.push(Route {
            path: path.clone(),
            template: Template::Page,
            context: RouteContext::Page {
                slug: page.slug.clone(),
                file: format!("{}.md", page.original_slug),
            },
        });
        site.redirects
            .push(Redirect::permanent(format!("{path}.html"), path));
    }
}

/// One route per troubleshooter step. Only the entry point is indexable.
pub fn register_troubleshooter_nodes<S: NodeStore + ?Sized>(store: &S, site: &mut SiteMap) {
    for (_, step) in query::all_troubleshooter_nodes(store) {
        site.routes.push(Route {
            path: format!("/{}", step.slug),
            template: Template::Troubleshooter,
            context: RouteContext::Troubleshooter {
                slug: step.slug.clone(),
                relative_path: step.relative_path.clone(),
                no_index: !step.is_root(),
            },
        });
    }
}

/// Register the `{from, to}` pairs listed in `<content_dir>/redirects.yml`.
///
/// A missing file is not an error: the warning is returned instead. An
/// empty file registers nothing. Unreadable or malformed files, including
/// one without a `redirects` list, abort the build.
pub async fn register_top_level_redirects(
    content_dir: &Path,
    site: &mut SiteMap,
) -> Result<Option<String>> {
    let path = content_dir.join(REDIRECTS_FILE);

    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{NO_REDIRECTS_WARNING}");
            return Ok(Some(NO_REDIRECTS_WARNING.to_string()));
        }
        Err(e) => return Err(KbSiteError::io(&path, e)),
    };

    let invalid =
        |e: serde_yaml::Error| KbSiteError::parse(format!("invalid {}: {e}", path.display()));
    let document: serde_yaml::Value = serde_yaml::from_str(&text).map_err(invalid)?;
    if document.is_null() {
        debug!(path = %path.display(), "redirects file is empty");
        return Ok(None);
    }
    let file: RedirectsFile = serde_yaml::from_value(document).map_err(invalid)?;

    for entry in &file.redirects {
        debug!(from = %entry.from, to = %entry.to, "registering redirect");
        site.redirects.push(Redirect::permanent(
            format!("/{}", entry.from),
            format!("/{}", entry.to),
        ));
    }

    info!(count = file.redirects.len(), "top-level redirects registered");
    Ok(None)
}
