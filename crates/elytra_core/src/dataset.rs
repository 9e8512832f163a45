// SPDX-License-Identifier: MIT

//! Dataset metadata (spec.md §3): the catalog's unit of record.

use serde::{Deserialize, Serialize};

use crate::ids::DatasetId;

/// A contiguous slice of rows in the columnar file, the unit of parallelism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowGroup {
    pub group_id: u64,
    pub row_count: u64,
}

/// Everything the control plane knows about one registered dataset.
///
/// Created once at registration, never mutated, destroyed on explicit
/// delete or age-based eviction (spec.md §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub id: DatasetId,
    pub name: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    pub storage_key: String,
    pub storage_bucket: String,
    pub public_url: String,
    pub row_groups: Vec<RowGroup>,
}

/// Error returned when a caller tries to register row groups that violate
/// the catalog's invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowGroupsError {
    #[error("a dataset must have at least one row group")]
    Empty,
    #[error("row groups must be contiguous starting from 0, got ids {0:?}")]
    NotContiguous(Vec<u64>),
    #[error("row group {0} has a non-positive row count")]
    EmptyRowGroup(u64),
}

/// Validate that `row_groups` is non-empty, contiguous from 0, and every
/// entry has a positive row count (spec.md §3 invariant).
pub fn validate_row_groups(row_groups: &[RowGroup]) -> Result<(), RowGroupsError> {
    if row_groups.is_empty() {
        return Err(RowGroupsError::Empty);
    }
    for (index, group) in row_groups.iter().enumerate() {
        if group.group_id != index as u64 {
            return Err(RowGroupsError::NotContiguous(
                row_groups.iter().map(|g| g.group_id).collect(),
            ));
        }
        if group.row_count == 0 {
            return Err(RowGroupsError::EmptyRowGroup(group.group_id));
        }
    }
    Ok(())
}

impl DatasetMetadata {
    /// Lightweight summary for `GET /api/datasets` (spec.md §6).
    pub fn row_group_count(&self) -> usize {
        self.row_groups.len()
    }
}
