//! Configuration for leader-side quorum tracking.
//!
//! Hierarchical loading in three layers, later layers overriding earlier:
//! 1. Default values from code
//! 2. Configuration file named by `CONFIG_PATH` (if set)
//! 3. Environment variables with the `QUORUM__` prefix

use std::env;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Tunables consumed when a leader epoch is created.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuorumConfig {
    /// How long a follower may go without a successful fetch before it gives
    /// up on the leader. The leader's own check-quorum timeout is derived
    /// from this value.
    pub fetch_timeout_ms: u64,

    /// Maximum number of records buffered per data batch before a drain is
    /// forced.
    pub max_batch_records: usize,

    /// How long a non-empty data batch may linger before it becomes
    /// drainable.
    pub batch_linger_ms: u64,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 2_000,
            max_batch_records: 1_024,
            batch_linger_ms: 25,
        }
    }
}

impl QuorumConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Callers must run `validate()` once all overrides are applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("QUORUM")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self> {
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::Message("fetch_timeout_ms must be positive".to_string()).into());
        }
        if self.max_batch_records == 0 {
            return Err(ConfigError::Message("max_batch_records must be positive".to_string()).into());
        }
        Ok(self)
    }
}
