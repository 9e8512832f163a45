// SPDX-License-Identifier: MIT

//! Crate-wide error taxonomy (spec.md §7): input, capacity, downstream,
//! internal. The HTTP status-code mapping lives in `elytra-server` (this
//! crate has no `axum` dependency), but the taxonomy itself is shared so
//! the channel surface can report the same errors without an HTTP status
//! attached.

use crate::ids::DatasetId;

#[derive(Debug, thiserror::Error)]
pub enum ElytraError {
    /// Malformed request body, missing required field.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown dataset id.
    #[error("dataset not found: {0}")]
    DatasetNotFound(DatasetId),

    /// Job submitted with no token in the request.
    #[error("missing API token")]
    MissingToken,

    /// No workers registered at submit time.
    #[error("no workers available")]
    NoWorkersAvailable,

    /// A worker reported a per-task failure.
    #[error("worker reported an error: {0}")]
    Downstream(String),

    /// Catalog write failure or an unexpected error during merge.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ElytraError {
    /// Coarse classification, matching spec.md §7's taxonomy. Useful for
    /// metrics/log fields without matching on the full variant.
    pub fn class(&self) -> &'static str {
        match self {
            ElytraError::InvalidRequest(_) | ElytraError::MissingToken => "input",
            ElytraError::DatasetNotFound(_) => "input",
            ElytraError::NoWorkersAvailable => "capacity",
            ElytraError::Downstream(_) => "downstream",
            ElytraError::Internal(_) => "internal",
        }
    }
}
