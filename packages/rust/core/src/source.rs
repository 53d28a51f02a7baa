//! Content sourcing: directory trees → File nodes plus parsed sidecars.
//!
//! Each regular file becomes a `File` node. Markdown files get a
//! `MarkdownRemark` child, `category.yml` files a `CategoryData` child, and
//! image assets a content-hashed public URL.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};
use walkdir::{DirEntry, WalkDir};

use kbsite_shared::{
    BuildConfig, CONTENT_SOURCE, FileNode, IMAGES_SOURCE, KbSiteError, Result,
    TROUBLESHOOTER_SOURCE,
};
use kbsite_storage::{Node, NodeData, NodeStore};

/// Options that shape sourced nodes.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// URL prefix for image assets (no trailing slash).
    pub public_path: String,
}

/// Counts of what a sourcing pass created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub files: usize,
    pub markdown: usize,
    pub category_files: usize,
    pub images: usize,
}

impl std::ops::AddAssign for SourceReport {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.markdown += other.markdown;
        self.category_files += other.category_files;
        self.images += other.images;
    }
}

/// Fail the build when the content repository has not been checked out.
pub fn check_content_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(KbSiteError::ContentMissing {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Source the content, troubleshooter, and image directories of a build.
///
/// The content directory is required; the other two are optional.
#[instrument(skip_all, fields(content = %config.content_dir.display()))]
pub async fn source_all(store: &mut dyn NodeStore, config: &BuildConfig) -> Result<SourceReport> {
    check_content_dir(&config.content_dir)?;

    let options = SourceOptions {
        public_path: config.public_path.clone(),
    };

    let mut report = SourceReport::default();
    report += source_directory(store, CONTENT_SOURCE, &config.content_dir, &options).await?;
    report += source_directory(
        store,
        TROUBLESHOOTER_SOURCE,
        &config.troubleshooter_dir,
        &options,
    )
    .await?;
    report += source_directory(store, IMAGES_SOURCE, &config.images_dir, &options).await?;

    info!(
        files = report.files,
        markdown = report.markdown,
        categories = report.category_files,
        images = report.images,
        "sourcing complete"
    );

    Ok(report)
}

/// Walk one source root and create its File and sidecar nodes.
///
/// A missing root sources nothing. Dotfiles and dot-directories are skipped.
pub async fn source_directory(
    store: &mut dyn NodeStore,
    source: &str,
    root: &Path,
    options: &SourceOptions,
) -> Result<SourceReport> {
    let mut report = SourceReport::default();

    if !root.is_dir() {
        debug!(source, root = %root.display(), "source directory absent, nothing to source");
        return Ok(report);
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
            KbSiteError::io(path, source)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let mut file = describe_file(source, root, entry.path());
        let origin = format!("{source}/{}", file.relative_path);

        if source == IMAGES_SOURCE {
            let bytes = tokio::fs::read(entry.path())
                .await
                .map_err(|e| KbSiteError::io(entry.path(), e))?;
            file.public_url = Some(public_url(&options.public_path, &file, &bytes));
            report.images += 1;
        }

        let sidecar = if file.extension == "md" {
            let text = read_text(entry.path()).await?;
            let remark = kbsite_markdown::parse_markdown(&text, &origin)?;
            report.markdown += 1;
            Some(Node::new(
                format!("markdown-{origin}"),
                NodeData::MarkdownRemark(remark),
            )?)
        } else if source == CONTENT_SOURCE && file.name == "category" && file.extension == "yml" {
            let text = read_text(entry.path()).await?;
            let data = kbsite_markdown::parse_category_data(&text, &origin)?;
            report.category_files += 1;
            Some(Node::new(
                format!("category-data-{}", file.relative_path),
                NodeData::CategoryData(data),
            )?)
        } else {
            None
        };

        let file_node = Node::new(format!("file-{origin}"), NodeData::File(file))?;
        let file_id = file_node.id;
        store.create_node(file_node);
        report.files += 1;

        if let Some(sidecar) = sidecar {
            let sidecar_id = sidecar.id;
            store.create_node(sidecar);
            store.create_parent_child_link(file_id, sidecar_id)?;
        }

        debug!(origin = %origin, "sourced file");
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| KbSiteError::io(path, e))
}

/// Describe a file relative to its source root, always with `/` separators.
fn describe_file(source: &str, root: &Path, path: &Path) -> FileNode {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative_path = to_slash(relative);
    let relative_directory = relative.parent().map(to_slash).unwrap_or_default();

    FileNode {
        source_instance_name: source.to_string(),
        relative_directory,
        relative_path,
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        dir: path.parent().map(to_slash).unwrap_or_default(),
        absolute_path: to_slash(path),
        public_url: None,
    }
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `<public_path>/<name>-<hash32>.<ext>`, hashed over the file bytes.
fn public_url(public_path: &str, file: &FileNode, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());

    let mut url = format!("{public_path}/{}-{}", file.name, &digest[..32]);
    if !file.extension.is_empty() {
        url.push('.');
        url.push_str(&file.extension);
    }
    url
}
