// SPDX-License-Identifier: MIT

//! Domain types shared by the Elytra control plane.
//!
//! This crate holds no I/O: ids, the dataset model, the operation AST, and
//! the crate-wide error taxonomy. Everything that touches a socket or disk
//! lives in `elytra-server`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod dataset;
pub mod error;
pub mod ids;
pub mod merge;
pub mod operation;

pub use dataset::{DatasetMetadata, RowGroup};
pub use error::ElytraError;
pub use ids::{ChunkId, ConnectionId, DatasetId, JobId, JobIdGenerator};
pub use merge::merge;
pub use operation::{Operation, OperationKind};
