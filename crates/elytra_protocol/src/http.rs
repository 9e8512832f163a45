// SPDX-License-Identifier: MIT

//! REST request/response bodies (spec.md §6). All non-2xx responses carry
//! an [`ErrorBody`].

use elytra_core::{DatasetId, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowGroupInput {
    pub id: u64,
    pub row_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDatasetRequest {
    pub name: String,
    pub storage_key: String,
    pub bucket: String,
    pub row_groups: Vec<RowGroupInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDatasetResponse {
    pub dataset_id: DatasetId,
    pub row_group_count: usize,
}

/// One entry of `GET /api/datasets` (spec.md §6). `format` is always
/// `"parquet"` today — the core never inspects the artifact itself, it
/// only ever hands out the catalog entry it was given at registration
/// (see DESIGN.md for why this field exists at all).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub name: String,
    pub timestamp: i64,
    pub row_group_count: usize,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub api_key: String,
    pub dataset_id: DatasetId,
    pub ops: Vec<Operation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub result: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
