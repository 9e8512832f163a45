// SPDX-License-Identifier: MIT

//! Dataset Catalog (spec.md §4.1): an in-memory map of dataset id to
//! metadata, mirrored to disk so it survives a restart.
//!
//! Concurrency: a single lock guards the map; disk I/O happens outside the
//! lock, matching the teacher's "mutate in-memory, then best-effort touch
//! disk" discipline (`MaterializedState` in `oj-daemon`). Reads (`get`,
//! `list`) are far more frequent than writes, so the lock is a
//! `parking_lot::RwLock` rather than a plain mutex.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use elytra_core::dataset::validate_row_groups;
use elytra_core::{DatasetId, DatasetMetadata, ElytraError, RowGroup};
use parking_lot::RwLock;

const META_FILE: &str = "meta.json";

pub struct Catalog {
    root: PathBuf,
    datasets: RwLock<HashMap<DatasetId, DatasetMetadata>>,
}

impl Catalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root, datasets: RwLock::new(HashMap::new()) }
    }

    fn dataset_dir(&self, id: &DatasetId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Register a new dataset: assign an id, validate the row groups,
    /// write `meta.json` atomically, then install it in memory
    /// (spec.md §4.1).
    pub fn register(
        &self,
        name: String,
        storage_key: String,
        bucket: String,
        row_groups: Vec<RowGroup>,
        now_ms: i64,
    ) -> Result<DatasetMetadata, ElytraError> {
        validate_row_groups(&row_groups)
            .map_err(|e| ElytraError::InvalidRequest(e.to_string()))?;

        let id = loop {
            let candidate = DatasetId::generate();
            if !self.datasets.read().contains_key(&candidate) && !self.dataset_dir(&candidate).exists() {
                break candidate;
            }
        };

        let public_url = format!("https://{bucket}.s3.amazonaws.com/{storage_key}");
        let metadata = DatasetMetadata {
            id: id.clone(),
            name,
            timestamp: now_ms,
            storage_key,
            storage_bucket: bucket,
            public_url,
            row_groups,
        };

        write_meta_atomically(&self.dataset_dir(&id), &metadata)
            .map_err(|e| ElytraError::Internal(format!("catalog write failed: {e}")))?;

        self.datasets.write().insert(id, metadata.clone());
        Ok(metadata)
    }

    pub fn get(&self, id: &DatasetId) -> Option<DatasetMetadata> {
        self.datasets.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<DatasetMetadata> {
        self.datasets.read().values().cloned().collect()
    }

    /// Remove the in-memory entry and best-effort remove its directory.
    /// Failure to unlink is logged, not propagated — callers only care
    /// that the entry is gone from `list`/`get` (spec.md §4.1).
    pub fn delete(&self, id: &DatasetId) -> bool {
        let removed = self.datasets.write().remove(id).is_some();
        if removed {
            let dir = self.dataset_dir(id);
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(dataset_id = %id, error = %e, "failed to remove dataset directory");
                }
            }
        }
        removed
    }

    /// Scan `{root}/*/meta.json` and load every parseable entry. An entry
    /// that fails to parse is logged and skipped entirely, never
    /// partially merged (spec.md §4.1).
    pub fn restore_from_disk(&self) -> std::io::Result<usize> {
        if !self.root.exists() {
            return Ok(0);
        }
        let mut loaded = 0;
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let meta_path = entry.path().join(META_FILE);
            match std::fs::read(&meta_path) {
                Ok(bytes) => match serde_json::from_slice::<DatasetMetadata>(&bytes) {
                    Ok(metadata) => {
                        self.datasets.write().insert(metadata.id.clone(), metadata);
                        loaded += 1;
                    }
                    Err(e) => {
                        tracing::warn!(path = %meta_path.display(), error = %e, "skipping unparseable dataset metadata");
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %meta_path.display(), error = %e, "failed to read dataset metadata");
                }
            }
        }
        Ok(loaded)
    }
}

/// Write `meta.json` via write-temp-then-rename so a crash mid-write never
/// leaves a half-written file behind for `restore_from_disk` to trip over.
fn write_meta_atomically(dir: &Path, metadata: &DatasetMetadata) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let final_path = dir.join(META_FILE);
    let tmp_path = dir.join(format!("{META_FILE}.tmp"));
    std::fs::write(&tmp_path, serde_json::to_vec_pretty(metadata)?)?;
    std::fs::rename(&tmp_path, &final_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(n: u64) -> Vec<RowGroup> {
        (0..n).map(|id| RowGroup { group_id: id, row_count: 10 }).collect()
    }

    #[test]
    fn register_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let metadata = catalog
            .register("ds".into(), "key".into(), "bucket".into(), groups(3), 1_000)
            .unwrap();
        let fetched = catalog.get(&metadata.id).unwrap();
        assert_eq!(fetched.row_group_count(), 3);
        assert_eq!(fetched.name, "ds");
    }

    #[test]
    fn register_derives_a_public_url_from_bucket_and_storage_key() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let metadata = catalog
            .register("ds".into(), "uploads/ds.parquet".into(), "elytra-datasets".into(), groups(1), 1_000)
            .unwrap();
        assert_eq!(metadata.public_url, "https://elytra-datasets.s3.amazonaws.com/uploads/ds.parquet");
    }

    #[test]
    fn register_rejects_invalid_row_groups() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let err = catalog
            .register("ds".into(), "key".into(), "bucket".into(), vec![], 1_000)
            .unwrap_err();
        assert!(matches!(err, ElytraError::InvalidRequest(_)));
    }

    #[test]
    fn delete_removes_from_list_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let metadata = catalog
            .register("ds".into(), "key".into(), "bucket".into(), groups(1), 1_000)
            .unwrap();
        assert!(catalog.delete(&metadata.id));
        assert!(catalog.get(&metadata.id).is_none());
        assert!(catalog.list().is_empty());
        assert!(!dir.path().join(metadata.id.as_str()).exists());
    }

    #[test]
    fn delete_of_unknown_id_is_a_noop_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        assert!(!catalog.delete(&DatasetId::generate()));
    }

    #[test]
    fn restart_persistence_survives_a_fresh_catalog_instance() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let catalog = Catalog::new(dir.path().to_path_buf());
            catalog
                .register("ds".into(), "key".into(), "bucket".into(), groups(3), 1_000)
                .unwrap()
                .id
        };

        let restarted = Catalog::new(dir.path().to_path_buf());
        restarted.restore_from_disk().unwrap();
        let fetched = restarted.get(&id).unwrap();
        assert_eq!(fetched.row_group_count(), 3);
    }

    #[test]
    fn restore_skips_unparseable_entries_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let bad_dir = dir.path().join("garbage-id");
        std::fs::create_dir_all(&bad_dir).unwrap();
        std::fs::write(bad_dir.join(META_FILE), b"not json").unwrap();

        let catalog = Catalog::new(dir.path().to_path_buf());
        let loaded = catalog.restore_from_disk().unwrap();
        assert_eq!(loaded, 0);
        assert!(catalog.list().is_empty());
    }
}
