//! Durable, time-indexed snapshot cache.
//!
//! One ordered sequence of snapshots per instrument, appended while markets
//! are open and read back as the fallback source when they are not. The log
//! is persisted as a JSON file after each write; a corrupt file on load is
//! replaced by an empty cache rather than failing startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::domain::{InstrumentCode, Snapshot};
use crate::error::StoreError;

/// Snapshots kept per instrument: two days of hourly captures with margin.
pub const DEFAULT_RETENTION: usize = 48;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotLog {
    instruments: BTreeMap<InstrumentCode, Vec<Snapshot>>,
}

#[derive(Debug)]
struct StoreInner {
    log: SnapshotLog,
    retention: usize,
    path: Option<PathBuf>,
}

impl StoreInner {
    /// Insert preserving non-decreasing `captured_at` order, then prune the
    /// oldest entries past the retention bound.
    fn record(&mut self, snapshot: Snapshot) {
        let entries = self
            .log
            .instruments
            .entry(snapshot.code.clone())
            .or_default();

        let position = entries.partition_point(|s| s.captured_at <= snapshot.captured_at);
        entries.insert(position, snapshot);

        if entries.len() > self.retention {
            let excess = entries.len() - self.retention;
            entries.drain(..excess);
        }
    }

    fn latest_before(&self, code: &InstrumentCode, at: OffsetDateTime) -> Option<Snapshot> {
        self.log
            .instruments
            .get(code)?
            .iter()
            .rev()
            .find(|snapshot| snapshot.captured_at <= at)
            .cloned()
    }

    fn snapshot_count(&self) -> usize {
        self.log.instruments.values().map(Vec::len).sum()
    }

    /// Flush the whole log through a temp file + rename so readers never
    /// observe a partially written state. Runs under the caller's write
    /// guard, which keeps flushes single-writer; the file I/O is async so
    /// a flush suspends rather than blocks the runtime.
    async fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let encoded = serde_json::to_string_pretty(&self.log)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, encoded)
            .await
            .map_err(|source| StoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(())
    }
}

/// Thread-safe snapshot store shared by the resolver and the capture task.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl SnapshotStore {
    /// Volatile store, used by tests and mock runs.
    pub fn in_memory() -> Self {
        Self::with_inner(SnapshotLog::default(), DEFAULT_RETENTION, None)
    }

    /// Open a persisted store, loading any prior state from `path`.
    ///
    /// Corrupt or unreadable state is logged and discarded; the store then
    /// starts empty. Only `record` failures surface as errors.
    pub fn open(path: &Path, retention: usize) -> Self {
        if let Some(parent) = path.parent() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                tracing::warn!(
                    path = %parent.display(),
                    %error,
                    "could not create the data directory; persistence will fail"
                );
            }
        }

        let log = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<SnapshotLog>(&raw) {
                Ok(log) => log,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "snapshot log is corrupt; starting with an empty cache"
                    );
                    SnapshotLog::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => SnapshotLog::default(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "snapshot log is unreadable; starting with an empty cache"
                );
                SnapshotLog::default()
            }
        };

        Self::with_inner(log, retention.max(1), Some(path.to_path_buf()))
    }

    fn with_inner(log: SnapshotLog, retention: usize, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                log,
                retention,
                path,
            })),
        }
    }

    /// Append a snapshot and flush the log.
    ///
    /// Safe to call at a fixed cadence: retention pruning bounds growth, and
    /// the write lock gives the append a single-writer discipline.
    pub async fn record(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        let mut store = self.inner.write().await;
        store.record(snapshot);
        store.persist().await
    }

    /// Most recent snapshot with `captured_at <= at`, or `None` if the
    /// instrument was never captured that early.
    pub async fn latest_before(
        &self,
        code: &InstrumentCode,
        at: OffsetDateTime,
    ) -> Option<Snapshot> {
        let store = self.inner.read().await;
        store.latest_before(code, at)
    }

    /// Total snapshots across all instruments.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.snapshot_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
