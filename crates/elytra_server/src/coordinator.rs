// SPDX-License-Identifier: MIT

//! Job Coordinator (spec.md §4.4): submission, ingestion, and merge.
//!
//! A job's lifecycle is entirely owned by a single `parking_lot::Mutex`
//! around a `HashMap<JobId, JobEntry>`. Merge runs synchronously inside
//! the locked scope right after the final partial lands — it is a pure
//! function over already-in-memory values, so this never blocks on I/O
//! (spec.md §4.4's "must not block on I/O" constraint). The oneshot
//! resolver fires after the lock is released.

use std::collections::HashMap;

use elytra_core::{merge, ChunkId, DatasetMetadata, ElytraError, JobId, JobIdGenerator, Operation};
use elytra_protocol::ServerFrame;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::registry::ConnectionHandle;

struct JobEntry {
    ops: Vec<Operation>,
    partials: Vec<Option<Value>>,
    completed: usize,
    resolver: Option<oneshot::Sender<Result<Value, ElytraError>>>,
}

#[derive(Default)]
pub struct Coordinator {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
    ids: JobIdGenerator,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a dataset against a worker snapshot, dispatch one task per
    /// row group round-robin, and return a future for the merged result
    /// (spec.md §4.4 "Submission").
    pub fn submit(
        &self,
        dataset: &DatasetMetadata,
        ops: Vec<Operation>,
        workers: &[ConnectionHandle],
    ) -> Result<oneshot::Receiver<Result<Value, ElytraError>>, ElytraError> {
        if workers.is_empty() {
            return Err(ElytraError::NoWorkersAvailable);
        }

        let job_id = self.ids.next();
        let task_count = dataset.row_groups.len();
        let (tx, rx) = oneshot::channel();

        self.jobs.lock().insert(
            job_id,
            JobEntry { ops: ops.clone(), partials: vec![None; task_count], completed: 0, resolver: Some(tx) },
        );

        for (index, row_group) in dataset.row_groups.iter().enumerate() {
            let worker = &workers[index % workers.len()];
            worker.send(&ServerFrame::ExecuteChunk {
                job_id,
                chunk_id: ChunkId::new(index),
                row_group_id: row_group.group_id,
                public_url: dataset.public_url.clone(),
                ops: ops.clone(),
            });
        }

        Ok(rx)
    }

    /// `chunk_result` (spec.md §4.4). A job missing from the table means
    /// it already resolved (error, or a prior duplicate) — dropped
    /// silently, matching "late arrival after resolution".
    pub fn ingest_result(&self, job_id: JobId, chunk_id: ChunkId, value: Value) {
        let outcome = {
            let mut jobs = self.jobs.lock();
            let Some(entry) = jobs.get_mut(&job_id) else { return };

            let Some(slot) = entry.partials.get_mut(chunk_id.get()) else {
                tracing::warn!(job_id = %job_id, chunk_id = %chunk_id, "chunk_result for an out-of-range chunk id, ignoring");
                return;
            };
            if slot.is_some() {
                tracing::warn!(job_id = %job_id, chunk_id = %chunk_id, "duplicate chunk_result, ignoring");
                return;
            }
            *slot = Some(value);
            entry.completed += 1;

            if entry.completed < entry.partials.len() {
                return;
            }

            let Some(entry) = jobs.remove(&job_id) else { return };
            let partials: Vec<Value> = entry
                .partials
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();
            (entry.resolver, merge(&entry.ops, partials))
        };

        let (resolver, result) = outcome;
        if let Some(resolver) = resolver {
            let _ = resolver.send(result);
        }
    }

    /// `chunk_error` (spec.md §4.4): resolve the job with the error and
    /// remove it. Any `chunk_result`/`chunk_error` that arrives later for
    /// the same `jobId` simply finds no entry and is dropped.
    pub fn ingest_error(&self, job_id: JobId, _chunk_id: ChunkId, error: String) {
        let entry = self.jobs.lock().remove(&job_id);
        if let Some(mut entry) = entry {
            if let Some(resolver) = entry.resolver.take() {
                let _ = resolver.send(Err(ElytraError::Downstream(error)));
            }
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.jobs.lock().len()
    }
}
