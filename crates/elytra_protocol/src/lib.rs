// SPDX-License-Identifier: MIT

//! Wire contract for Elytra's control plane (spec.md §6): the HTTP
//! surface's request/response bodies and the worker/observer channel's
//! frame types. Pure data — no behavior, no I/O.

pub mod channel;
pub mod http;

pub use channel::{ChunkErrorFrame, ChunkResultFrame, ServerFrame, WorkerFrame};
pub use http::{
    DatasetSummary, DeleteDatasetResponse, ErrorBody, JobRequest, JobResponse,
    RegisterDatasetRequest, RegisterDatasetResponse, RowGroupInput,
};
