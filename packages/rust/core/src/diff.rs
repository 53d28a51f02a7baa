//! Build-to-build change detection over derived node fingerprints.
//!
//! Each build records `[{id, key, kind, contentDigest}]` for its derived
//! nodes in `nodes.json`. The next build compares its fresh fingerprints
//! against that record by key.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use kbsite_shared::{KbSiteError, NodeId, Result};
use kbsite_storage::{NodeKind, NodeStore};

/// File name of the fingerprint record in the output directory.
pub const NODES_FILE: &str = "nodes.json";

/// Fingerprint of one derived node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub key: String,
    pub kind: NodeKind,
    pub content_digest: String,
}

/// Keys grouped by how they changed since the previous build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl NodeDiff {
    /// Whether the two builds produced identical derived nodes.
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Fingerprints of every derived node, in creation order.
pub fn node_records<S: NodeStore + ?Sized>(store: &S) -> Vec<NodeRecord> {
    store
        .get_nodes()
        .into_iter()
        .filter(|n| n.kind().is_derived())
        .map(|n| NodeRecord {
            id: n.id,
            key: n.key,
            kind: n.internal.kind,
            content_digest: n.internal.content_digest,
        })
        .collect()
}

/// Compare fresh fingerprints against the previous build's.
///
/// With no previous record every node counts as added.
pub fn diff_nodes(previous: Option<&[NodeRecord]>, current: &[NodeRecord]) -> NodeDiff {
    let previous = previous.unwrap_or_default();
    let previous_by_key: HashMap<&str, &NodeRecord> =
        previous.iter().map(|r| (r.key.as_str(), r)).collect();
    let current_keys: HashSet<&str> = current.iter().map(|r| r.key.as_str()).collect();

    let mut diff = NodeDiff::default();

    for record in current {
        match previous_by_key.get(record.key.as_str()) {
            Some(old) if old.content_digest == record.content_digest => {
                diff.unchanged.push(record.key.clone());
            }
            Some(_) => diff.changed.push(record.key.clone()),
            None => diff.added.push(record.key.clone()),
        }
    }

    for old in previous {
        if !current_keys.contains(old.key.as_str()) {
            diff.removed.push(old.key.clone());
        }
    }

    info!(
        added = diff.added.len(),
        changed = diff.changed.len(),
        unchanged = diff.unchanged.len(),
        removed = diff.removed.len(),
        "node diff computed"
    );

    diff
}

/// Read the previous build's fingerprints from `output_dir`.
///
/// A missing file means a first build. An unreadable or malformed file is
/// logged and treated the same way, since the diff is informational.
pub fn load_previous(output_dir: &Path) -> Option<Vec<NodeRecord>> {
    let path = output_dir.join(NODES_FILE);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %KbSiteError::io(&path, e), "cannot read previous node record");
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(records) => Some(records),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed previous node record");
            None
        }
    }
}

/// Serialize records the way [`load_previous`] reads them.
pub fn records_json(records: &[NodeRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, digest: &str) -> NodeRecord {
        NodeRecord {
            id: NodeId::from_key(key),
            key: key.into(),
            kind: NodeKind::Page,
            content_digest: digest.into(),
        }
    }

    #[test]
    fn first_build_is_all_added() {
        let current = vec![record("page-a", "1"), record("page-b", "2")];
        let diff = diff_nodes(None, &current);
        assert_eq!(diff.added, ["page-a", "page-b"]);
        assert!(!diff.is_clean());
    }

    #[test]
    fn classifies_changes_by_key() {
        let previous = vec![
            record("page-same", "1"),
            record("page-edited", "2"),
            record("page-gone", "3"),
        ];
        let current = vec![
            record("page-same", "1"),
            record("page-edited", "22"),
            record("page-new", "4"),
        ];

        let diff = diff_nodes(Some(&previous), &current);
        assert_eq!(diff.unchanged, ["page-same"]);
        assert_eq!(diff.changed, ["page-edited"]);
        assert_eq!(diff.added, ["page-new"]);
        assert_eq!(diff.removed, ["page-gone"]);
    }

    #[test]
    fn identical_records_are_clean() {
        let records = vec![record("page-a", "1"), record("category-b", "2")];
        let diff = diff_nodes(Some(&records), &records);
        assert!(diff.is_clean());
        assert_eq!(diff.unchanged.len(), 2);
    }

    #[test]
    fn previous_record_round_trips_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_previous(tmp.path()).is_none());

        let records = vec![record("page-a", "1")];
        std::fs::write(tmp.path().join(NODES_FILE), records_json(&records).unwrap()).unwrap();
        assert_eq!(load_previous(tmp.path()), Some(records));

        std::fs::write(tmp.path().join(NODES_FILE), "{not json").unwrap();
        assert!(load_previous(tmp.path()).is_none());
    }
}
