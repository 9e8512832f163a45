// SPDX-License-Identifier: MIT

//! HTTP Surface (spec.md §4.5, §6): thin handlers that validate input
//! shape, call the Catalog or Coordinator, and translate outcomes to
//! status codes via [`ApiError`]. No handler holds state of its own.

use axum::extract::{Path, State};
use axum::Json;
use elytra_core::{DatasetId, ElytraError, RowGroup};
use elytra_protocol::{
    DatasetSummary, DeleteDatasetResponse, JobRequest, JobResponse, RegisterDatasetRequest,
    RegisterDatasetResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/register-dataset`.
pub async fn register_dataset(
    State(state): State<AppState>,
    Json(request): Json<RegisterDatasetRequest>,
) -> Result<Json<RegisterDatasetResponse>, ApiError> {
    let row_groups: Vec<RowGroup> = request
        .row_groups
        .into_iter()
        .map(|g| RowGroup { group_id: g.id, row_count: g.row_count })
        .collect();

    let now_ms = chrono::Utc::now().timestamp_millis();
    let metadata = state.catalog.register(
        request.name,
        request.storage_key,
        request.bucket,
        row_groups,
        now_ms,
    )?;

    Ok(Json(RegisterDatasetResponse {
        dataset_id: metadata.id,
        row_group_count: metadata.row_group_count(),
    }))
}

/// `GET /api/datasets`.
pub async fn list_datasets(State(state): State<AppState>) -> Json<Vec<DatasetSummary>> {
    let mut datasets: Vec<DatasetSummary> = state
        .catalog
        .list()
        .into_iter()
        .map(|d| DatasetSummary {
            id: d.id,
            name: d.name,
            timestamp: d.timestamp,
            row_group_count: d.row_group_count(),
            // The core never inspects the artifact itself, so this is
            // always the one format the conversion collaborator produces.
            format: "parquet".into(),
        })
        .collect();
    datasets.sort_by_key(|d| d.timestamp);
    Json(datasets)
}

/// `DELETE /api/datasets/{id}`.
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDatasetResponse>, ApiError> {
    let dataset_id = DatasetId::from(id);
    if state.catalog.delete(&dataset_id) {
        Ok(Json(DeleteDatasetResponse { ok: true }))
    } else {
        Err(ApiError(ElytraError::DatasetNotFound(dataset_id)))
    }
}

/// `POST /api/jobs`. The `apiKey` is required but, per spec.md §9, never
/// validated by the core — only its presence is checked, before any
/// catalog or registry access.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    if request.api_key.trim().is_empty() {
        return Err(ApiError(ElytraError::MissingToken));
    }

    let dataset = state
        .catalog
        .get(&request.dataset_id)
        .ok_or_else(|| ElytraError::DatasetNotFound(request.dataset_id.clone()))?;

    let workers = state.registry.workers();
    let receiver = state.coordinator.submit(&dataset, request.ops, &workers)?;

    let result = receiver
        .await
        .map_err(|_| ElytraError::Internal("job resolver dropped before completion".into()))??;

    Ok(Json(JobResponse { result }))
}
