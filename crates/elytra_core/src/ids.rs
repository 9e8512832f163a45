// SPDX-License-Identifier: MIT

//! Opaque identifiers for datasets, jobs, chunks, and connections.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Alphabet used for generated dataset ids: lowercase/uppercase letters and
/// digits, no ambiguous-looking characters.
const DATASET_ID_ALPHABET: [char; 57] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'i', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '-',
];

const DATASET_ID_LEN: usize = 10;

/// Opaque dataset identifier, a short random string (spec.md §3).
///
/// Stable across process restarts: the id is part of the persisted
/// `meta.json` and doubles as the directory name under the data root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(String);

impl DatasetId {
    /// Generate a fresh random id. Collision with an existing id is the
    /// caller's responsibility to detect (the catalog retries).
    pub fn generate() -> Self {
        Self(nanoid::nanoid!(DATASET_ID_LEN, &DATASET_ID_ALPHABET))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DatasetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonically increasing job identifier, process-local (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues job ids starting at 1, so `0` can mean "no job" in logs and tests.
#[derive(Debug)]
pub struct JobIdGenerator {
    next: AtomicU64,
}

impl Default for JobIdGenerator {
    fn default() -> Self {
        Self { next: AtomicU64::new(1) }
    }
}

impl JobIdGenerator {
    pub fn next(&self) -> JobId {
        JobId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of a task within a job, equal to the task's position in the
/// dataset's row-group order (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(usize);

impl ChunkId {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to a live connection on accept (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_ids_are_unique_enough_to_not_collide_in_practice() {
        let a = DatasetId::generate();
        let b = DatasetId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), DATASET_ID_LEN);
    }

    #[test]
    fn job_ids_start_at_one_and_increase() {
        let gen = JobIdGenerator::default();
        assert_eq!(gen.next().get(), 1);
        assert_eq!(gen.next().get(), 2);
        assert_eq!(gen.next().get(), 3);
    }

    #[test]
    fn chunk_id_round_trips_through_json_as_a_bare_number() {
        let id = ChunkId::new(4);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "4");
        let back: ChunkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
