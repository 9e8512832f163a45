// SPDX-License-Identifier: MIT

//! Process configuration (spec.md §6), resolved once at startup from CLI
//! flags or environment variables (the teacher's `env.rs` convention,
//! generalized with `clap`'s `env` attribute so every field has a single
//! source of truth for its default).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "elytrad", about = "Elytra control plane")]
pub struct Config {
    /// HTTP + WebSocket bind port.
    #[arg(long, env = "ELYTRA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Root directory for the dataset catalog's on-disk mirror.
    #[arg(long, env = "ELYTRA_DATA_ROOT", default_value = "./data/datasets")]
    pub data_root: PathBuf,

    /// Datasets older than this are evicted by the reaper.
    #[arg(long, env = "ELYTRA_DATASET_MAX_AGE_SECS", default_value_t = 7_200)]
    pub dataset_max_age_secs: u64,

    /// How often the reaper sweeps the catalog for expired datasets.
    #[arg(long, env = "ELYTRA_REAPER_PERIOD_SECS", default_value_t = 1_800)]
    pub reaper_period_secs: u64,

    /// Period of the connection registry's ping/pong liveness tick.
    #[arg(long, env = "ELYTRA_LIVENESS_PERIOD_MS", default_value_t = 30_000)]
    pub liveness_period_ms: u64,
}

impl Config {
    pub fn dataset_max_age(&self) -> Duration {
        Duration::from_secs(self.dataset_max_age_secs)
    }

    pub fn reaper_period(&self) -> Duration {
        Duration::from_secs(self.reaper_period_secs)
    }

    pub fn liveness_period(&self) -> Duration {
        Duration::from_millis(self.liveness_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::parse_from(["elytrad"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.dataset_max_age_secs, 7_200);
        assert_eq!(config.reaper_period_secs, 1_800);
        assert_eq!(config.liveness_period_ms, 30_000);
    }
}
