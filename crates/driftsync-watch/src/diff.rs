//! Snapshot diffing.
//!
//! Key-set algebra over two flat snapshots, plus rename inference:
//! a deleted path whose hash sequence is element-wise identical to a
//! created path's is reported as a rename instead. When several created
//! paths share the same hash sequence the first in iteration order wins;
//! snapshot keys are ordered, so the pairing is deterministic.

use std::path::PathBuf;

use crate::snapshot::{Snapshot, SnapshotEntry};

/// Differences between two snapshots
#[derive(Debug, Clone, Default)]
pub struct DiffReport {
    /// Paths present only in the new snapshot
    pub created: Vec<(PathBuf, SnapshotEntry)>,
    /// Paths present only in the old snapshot
    pub deleted: Vec<(PathBuf, SnapshotEntry)>,
    /// Paths present in both whose entries differ
    pub modified: Vec<(PathBuf, SnapshotEntry)>,
    /// Inferred renames: (old path, new path, entry)
    pub renamed: Vec<(PathBuf, PathBuf, SnapshotEntry)>,
}

impl DiffReport {
    /// Whether the snapshots were identical
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.deleted.is_empty()
            && self.modified.is_empty()
            && self.renamed.is_empty()
    }

    /// Total number of reported changes
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len() + self.deleted.len() + self.modified.len() + self.renamed.len()
    }
}

/// Compare two snapshots.
///
/// `old` is typically the persisted index, `new` a fresh tree walk.
#[must_use]
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffReport {
    let mut deleted = Vec::new();
    let mut modified = Vec::new();
    let mut created = Vec::new();

    for (path, old_entry) in &old.files {
        match new.files.get(path) {
            None => deleted.push((path.clone(), old_entry.clone())),
            Some(new_entry) if new_entry != old_entry => {
                modified.push((path.clone(), new_entry.clone()));
            }
            Some(_) => {}
        }
    }

    for (path, new_entry) in &new.files {
        if !old.files.contains_key(path) {
            created.push((path.clone(), new_entry.clone()));
        }
    }

    // Rename pass: pair deleted and created entries with identical hash
    // sequences. First created match in order wins; multi-way ties are an
    // accepted ambiguity.
    let mut renamed = Vec::new();
    let mut surviving_deleted = Vec::new();
    let mut claimed = vec![false; created.len()];

    for (old_path, old_entry) in deleted {
        let matched = created.iter().enumerate().find(|(i, (_, candidate))| {
            !claimed[*i] && candidate.same_content(&old_entry)
        });

        match matched {
            Some((i, (new_path, new_entry))) => {
                claimed[i] = true;
                renamed.push((old_path, new_path.clone(), new_entry.clone()));
            }
            None => surviving_deleted.push((old_path, old_entry)),
        }
    }

    let created = created
        .into_iter()
        .zip(claimed)
        .filter_map(|(entry, claimed)| (!claimed).then_some(entry))
        .collect();

    DiffReport {
        created,
        deleted: surviving_deleted,
        modified,
        renamed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FileStat;

    fn entry(name: &str, size: u64, hashes: &[&str]) -> SnapshotEntry {
        SnapshotEntry {
            stat: FileStat {
                name: name.to_string(),
                size,
                created: 1_700_000_000,
                modified: 1_700_000_100,
            },
            chunk_hashes: hashes.iter().map(|h| (*h).to_string()).collect(),
        }
    }

    fn snapshot(entries: &[(&str, SnapshotEntry)]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (path, entry) in entries {
            snapshot.upsert(PathBuf::from(path), entry.clone());
        }
        snapshot
    }

    #[test]
    fn test_identical_snapshots_diff_empty() {
        let s = snapshot(&[
            ("/data/a.txt", entry("a.txt", 3, &["h1"])),
            ("/data/sub/b.txt", entry("b.txt", 9, &["h2", "h3"])),
        ]);
        assert!(diff(&s, &s).is_empty());
    }

    #[test]
    fn test_created_and_deleted() {
        let old = snapshot(&[("/data/gone.txt", entry("gone.txt", 1, &["g"]))]);
        let new = snapshot(&[("/data/fresh.txt", entry("fresh.txt", 2, &["f"]))]);

        let report = diff(&old, &new);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.deleted.len(), 1);
        assert!(report.modified.is_empty());
        assert!(report.renamed.is_empty());
        assert_eq!(report.created[0].0, PathBuf::from("/data/fresh.txt"));
        assert_eq!(report.deleted[0].0, PathBuf::from("/data/gone.txt"));
    }

    #[test]
    fn test_modified_on_hash_change() {
        let old = snapshot(&[("/data/f.bin", entry("f.bin", 10, &["aaa"]))]);
        let new = snapshot(&[("/data/f.bin", entry("f.bin", 11, &["bbb"]))]);

        let report = diff(&old, &new);
        assert_eq!(report.modified.len(), 1);
        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());
        // The reported entry is the new state.
        assert_eq!(report.modified[0].1.stat.size, 11);
    }

    #[test]
    fn test_modified_on_stat_change_only() {
        let old = snapshot(&[("/data/f.bin", entry("f.bin", 10, &["aaa"]))]);
        let mut touched = entry("f.bin", 10, &["aaa"]);
        touched.stat.modified += 60;
        let new = snapshot(&[("/data/f.bin", touched)]);

        let report = diff(&old, &new);
        assert_eq!(report.modified.len(), 1);
    }

    #[test]
    fn test_rename_detected() {
        let old = snapshot(&[("/data/old-name.bin", entry("old-name.bin", 8, &["xyz"]))]);
        let new = snapshot(&[("/data/new-name.bin", entry("new-name.bin", 8, &["xyz"]))]);

        let report = diff(&old, &new);
        assert_eq!(report.renamed.len(), 1);
        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());

        let (from, to, _) = &report.renamed[0];
        assert_eq!(from, &PathBuf::from("/data/old-name.bin"));
        assert_eq!(to, &PathBuf::from("/data/new-name.bin"));
    }

    #[test]
    fn test_rename_tie_first_in_order_wins() {
        let old = snapshot(&[("/data/orig.bin", entry("orig.bin", 4, &["dup"]))]);
        let new = snapshot(&[
            ("/data/copy-a.bin", entry("copy-a.bin", 4, &["dup"])),
            ("/data/copy-b.bin", entry("copy-b.bin", 4, &["dup"])),
        ]);

        let report = diff(&old, &new);
        assert_eq!(report.renamed.len(), 1);
        assert_eq!(report.renamed[0].1, PathBuf::from("/data/copy-a.bin"));
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.created[0].0, PathBuf::from("/data/copy-b.bin"));
    }

    #[test]
    fn test_append_is_modified_not_rename() {
        let old = snapshot(&[("/data/log.txt", entry("log.txt", 100, &["h-old"]))]);
        let new = snapshot(&[("/data/log.txt", entry("log.txt", 101, &["h-new"]))]);

        let report = diff(&old, &new);
        assert_eq!(report.modified.len(), 1);
        assert!(report.created.is_empty());
        assert!(report.deleted.is_empty());
        assert!(report.renamed.is_empty());
    }
}
