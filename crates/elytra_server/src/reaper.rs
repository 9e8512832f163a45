// SPDX-License-Identifier: MIT

//! Reaper (spec.md §4.6): a periodic sweep that evicts datasets older than
//! a configured max age through the Catalog's ordinary `delete` path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;

/// Run the reaper loop until `shutdown` fires. The first sweep happens
/// one `period` after startup, not immediately — a freshly started
/// process has nothing to reap yet.
pub async fn run(
    catalog: Arc<Catalog>,
    data_root: PathBuf,
    max_age: Duration,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => sweep_once(&catalog, &data_root, max_age),
            () = shutdown.cancelled() => return,
        }
    }
}

fn sweep_once(catalog: &Catalog, data_root: &Path, max_age: Duration) {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let cutoff_ms = now_ms.saturating_sub(max_age.as_millis() as i64);

    for dataset in catalog.list() {
        if dataset.timestamp >= cutoff_ms {
            continue;
        }
        let reclaimed = meta_file_size(&data_root.join(dataset.id.as_str()));
        if catalog.delete(&dataset.id) {
            tracing::info!(
                dataset_id = %dataset.id,
                age_ms = now_ms - dataset.timestamp,
                reclaimed_bytes = reclaimed,
                "reaper evicted expired dataset"
            );
        }
    }
}

/// The core never reads the columnar artifact itself, so `meta.json`'s
/// size is the only storage footprint it can honestly report as reclaimed
/// (spec.md §4.6 "Reclaimed bytes are logged").
fn meta_file_size(dataset_dir: &Path) -> u64 {
    std::fs::metadata(dataset_dir.join("meta.json")).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elytra_core::RowGroup;

    fn groups(n: u64) -> Vec<RowGroup> {
        (0..n).map(|id| RowGroup { group_id: id, row_count: 10 }).collect()
    }

    #[test]
    fn sweep_evicts_only_datasets_older_than_max_age() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let now = 1_000_000_i64;

        let old = catalog.register("old".into(), "k".into(), "b".into(), groups(1), now - 10_000).unwrap();
        let fresh = catalog.register("fresh".into(), "k".into(), "b".into(), groups(1), now).unwrap();

        // Max age shorter than the gap between `old` and `now`, longer
        // than the gap between `fresh` and `now`.
        sweep_once_at(&catalog, dir.path(), Duration::from_millis(5_000), now);

        assert!(catalog.get(&old.id).is_none());
        assert!(catalog.get(&fresh.id).is_some());
    }

    #[test]
    fn sweep_is_a_noop_when_nothing_has_expired() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path().to_path_buf());
        let metadata = catalog.register("ds".into(), "k".into(), "b".into(), groups(1), 1_000).unwrap();

        sweep_once_at(&catalog, dir.path(), Duration::from_secs(7_200), 1_500);

        assert!(catalog.get(&metadata.id).is_some());
    }

    /// Test-only variant of `sweep_once` that takes `now_ms` explicitly
    /// instead of reading the wall clock, so the cutoff math is
    /// deterministic.
    fn sweep_once_at(catalog: &Catalog, data_root: &Path, max_age: Duration, now_ms: i64) {
        let cutoff_ms = now_ms.saturating_sub(max_age.as_millis() as i64);
        for dataset in catalog.list() {
            if dataset.timestamp >= cutoff_ms {
                continue;
            }
            let _ = meta_file_size(&data_root.join(dataset.id.as_str()));
            catalog.delete(&dataset.id);
        }
    }
}
