//! Output directory assembler.
//!
//! Takes the registered site map, node fingerprints, and build counts, then
//! writes the final output directory to disk.

use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use kbsite_shared::{
    ArtifactMeta, BuildCounts, BuildManifest, CURRENT_SCHEMA_VERSION, KbSiteError, Result,
    SiteMap,
};

use crate::diff::{NODES_FILE, NodeRecord, records_json};

/// Route table file name.
pub const ROUTES_FILE: &str = "routes.json";
/// Redirect table file name.
pub const REDIRECTS_JSON_FILE: &str = "redirects.json";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Configuration for output assembly.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// Directory the build writes into.
    pub output_dir: PathBuf,
    /// Site name recorded in the manifest.
    pub site_name: String,
    /// Tool version string.
    pub tool_version: String,
}

/// An image asset to publish at its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCopy {
    pub source: PathBuf,
    pub public_url: String,
}

/// Output from a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    /// Directory that was written.
    pub output_dir: PathBuf,
    /// The manifest that was written.
    pub manifest: BuildManifest,
    /// Number of assets copied.
    pub assets_copied: usize,
}

/// Write the output directory.
///
/// Layout:
/// ```text
/// <output_dir>/
/// ├── routes.json
/// ├── redirects.json
/// ├── nodes.json
/// ├── manifest.json
/// └── static/
///     └── wallet-<hash>.svg
/// ```
///
/// Every JSON file is written to a temp file and renamed into place; the
/// manifest is written last.
#[instrument(skip_all, fields(output = %config.output_dir.display(), routes = site.routes.len()))]
pub fn assemble(
    config: &AssembleConfig,
    site: &SiteMap,
    records: &[NodeRecord],
    counts: &BuildCounts,
    assets: &[AssetCopy],
) -> Result<AssembleResult> {
    let out = &config.output_dir;
    std::fs::create_dir_all(out).map_err(|e| KbSiteError::io(out, e))?;

    info!(path = %out.display(), "assembling output directory");

    let artifacts = vec![
        write_atomic(out, ROUTES_FILE, &to_json(&site.routes)?)?,
        write_atomic(out, REDIRECTS_JSON_FILE, &to_json(&site.redirects)?)?,
        write_atomic(out, NODES_FILE, &records_json(records)?)?,
    ];

    let assets_copied = copy_assets(out, assets)?;

    let manifest = BuildManifest {
        schema_version: CURRENT_SCHEMA_VERSION,
        name: config.site_name.clone(),
        tool_version: config.tool_version.clone(),
        generated_at: Utc::now(),
        counts: counts.clone(),
        artifacts,
    };
    write_atomic(out, MANIFEST_FILE, &to_json(&manifest)?)?;

    info!(
        artifacts = manifest.artifacts.len(),
        assets = assets_copied,
        path = %out.display(),
        "output assembly complete"
    );

    Ok(AssembleResult {
        output_dir: out.clone(),
        manifest,
        assets_copied,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Write `content` to `dir/filename` via a temp file and rename.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<ArtifactMeta> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| KbSiteError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| KbSiteError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %filename, size = content.len(), "wrote artifact");

    Ok(ArtifactMeta {
        filename: filename.to_string(),
        sha256: hash,
        size_bytes: content.len(),
    })
}

/// Copy each asset to `<out>/<public_url>`. Returns the number copied.
fn copy_assets(out: &Path, assets: &[AssetCopy]) -> Result<usize> {
    for asset in assets {
        let target = out.join(asset.public_url.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KbSiteError::io(parent, e))?;
        }
        std::fs::copy(&asset.source, &target).map_err(|e| KbSiteError::io(&asset.source, e))?;
        debug!(url = %asset.public_url, "copied asset");
    }
    Ok(assets.len())
}
