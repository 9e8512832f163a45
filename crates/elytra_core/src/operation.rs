// SPDX-License-Identifier: MIT

//! The pipeline's operation AST (spec.md §3, §4.4, §9 "opaque operation
//! payloads").
//!
//! The control plane never executes an operation; it only ever inspects the
//! *tag* of the terminal operation to pick a merge strategy. Bodies are
//! carried as opaque strings so the core stays decoupled from whatever
//! expression language the worker runtime understands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stage of a pipeline. Every variant carries an opaque payload; only
/// the tag is ever examined by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Map {
        #[serde(rename = "fn")]
        body: String,
    },
    Filter {
        #[serde(rename = "fn")]
        body: String,
    },
    Count,
    #[serde(rename_all = "camelCase")]
    Reduce {
        #[serde(rename = "fn")]
        body: String,
        initial_value: Value,
    },
}

/// The tag of an [`Operation`], used to pick a merge strategy (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Map,
    Filter,
    Count,
    Reduce,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Map { .. } => OperationKind::Map,
            Operation::Filter { .. } => OperationKind::Filter,
            Operation::Count => OperationKind::Count,
            Operation::Reduce { .. } => OperationKind::Reduce,
        }
    }
}

/// The tag of the *last* operation in a pipeline, or `None` for an empty
/// pipeline. The merge policy (spec.md §4.4) dispatches on this alone.
pub fn terminal_kind(ops: &[Operation]) -> Option<OperationKind> {
    ops.last().map(Operation::kind)
}
