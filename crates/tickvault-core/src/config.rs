//! Runtime configuration for the core service.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snapshot::DEFAULT_RETENTION;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

/// Service configuration; every field has a usable default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Directory holding the snapshot log and the holiday table.
    pub data_dir: PathBuf,
    /// Budget for a single live fetch before falling back to cache.
    pub fetch_timeout_ms: u64,
    /// Snapshots retained per instrument.
    pub snapshot_retention: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            snapshot_retention: DEFAULT_RETENTION,
        }
    }
}

impl CoreConfig {
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("snapshots.json")
    }

    pub fn holiday_path(&self) -> PathBuf {
        self.data_dir.join("holidays.json")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: CoreConfig = serde_json::from_str(r#"{"data_dir": "/tmp/tickvault"}"#)
            .expect("partial config parses");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tickvault"));
        assert_eq!(config.fetch_timeout_ms, DEFAULT_FETCH_TIMEOUT_MS);
        assert_eq!(config.snapshot_retention, DEFAULT_RETENTION);
    }

    #[test]
    fn derived_paths_live_under_the_data_dir() {
        let config = CoreConfig::with_data_dir("/var/lib/tickvault");
        assert_eq!(
            config.snapshot_path(),
            PathBuf::from("/var/lib/tickvault/snapshots.json")
        );
        assert_eq!(
            config.holiday_path(),
            PathBuf::from("/var/lib/tickvault/holidays.json")
        );
    }
}
