// SPDX-License-Identifier: MIT

//! Frames exchanged over the bidirectional worker/observer channel
//! (spec.md §6).

use elytra_core::{ChunkId, JobId, Operation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames the server sends to a worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    #[serde(rename_all = "camelCase")]
    ExecuteChunk {
        job_id: JobId,
        chunk_id: ChunkId,
        row_group_id: u64,
        public_url: String,
        ops: Vec<Operation>,
    },
    Ping,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResultFrame {
    pub job_id: JobId,
    pub chunk_id: ChunkId,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkErrorFrame {
    pub job_id: JobId,
    pub chunk_id: ChunkId,
    pub error: String,
}

/// A decoded frame from a worker (spec.md §4.3's dispatch table), or the
/// reason it couldn't be decoded into one of the recognized kinds.
///
/// Deliberately not a single `#[serde(tag = "type")] enum` derive: the
/// router needs to tell "recognized kind, payload didn't match the
/// expected shape" apart from "unrecognized kind" so it can log usefully,
/// and `worker_progress` is forwarded byte-for-byte rather than
/// round-tripped through a typed struct (see [`WorkerFrame::Progress`]).
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerFrame {
    ChunkResult(ChunkResultFrame),
    ChunkError(ChunkErrorFrame),
    /// Free-form telemetry, kept as the raw JSON value it arrived as so it
    /// can be rebroadcast to observers verbatim (spec.md §4.3, §6).
    Progress(Value),
    Pong,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameParseError {
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("frame has no \"type\" field")]
    MissingType,
    #[error("unrecognized frame type: {0}")]
    UnknownType(String),
    #[error("frame of type \"{kind}\" has the wrong shape: {reason}")]
    WrongShape { kind: String, reason: String },
}

impl WorkerFrame {
    /// Parse a single inbound text frame. Per spec.md §4.3, malformed
    /// frames and unrecognized kinds are never fatal to the connection —
    /// callers log the returned error and drop the frame.
    pub fn parse(raw: &str) -> Result<WorkerFrame, FrameParseError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| FrameParseError::WrongShape { kind: "<unparseable>".into(), reason: e.to_string() })?;
        let object = value.as_object().ok_or(FrameParseError::NotAnObject)?;
        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(FrameParseError::MissingType)?;

        match kind {
            "chunk_result" => serde_json::from_value(value.clone())
                .map(WorkerFrame::ChunkResult)
                .map_err(|e| FrameParseError::WrongShape { kind: kind.into(), reason: e.to_string() }),
            "chunk_error" => serde_json::from_value(value.clone())
                .map(WorkerFrame::ChunkError)
                .map_err(|e| FrameParseError::WrongShape { kind: kind.into(), reason: e.to_string() }),
            "worker_progress" => Ok(WorkerFrame::Progress(value)),
            "pong" => Ok(WorkerFrame::Pong),
            other => Err(FrameParseError::UnknownType(other.to_string())),
        }
    }
}
