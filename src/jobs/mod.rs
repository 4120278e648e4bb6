//! Background indexing job tracking.
//!
//! There is exactly one job slot: `Idle -> Running -> Idle`. A start request
//! while Running is rejected, never queued. Progress is a snapshot read, safe
//! to poll at sub-second intervals.

pub mod runner;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::collection::Collection;
use crate::index::IndexStoreError;

pub use runner::IndexingJobRunner;

/// Completed runs retained in the execution history, oldest dropped first.
pub const HISTORY_RETENTION: usize = 10;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("an indexing run is already in progress")]
    AlreadyRunning,

    /// The collection root cannot be enumerated. The run fails before it
    /// starts rather than committing an empty map over existing entries.
    #[error("collection root {path} for {collection} cannot be enumerated")]
    RootUnavailable {
        collection: Collection,
        path: PathBuf,
    },

    /// The completed run's map could not be persisted. The previous index is
    /// unchanged and no history record is written.
    #[error("failed to commit the index")]
    Commit(#[source] IndexStoreError),
}

/// Observable job state, as returned by `status()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum JobStatus {
    #[serde(rename_all = "camelCase")]
    Idle {
        last_completed_at: Option<DateTime<Utc>>,
        execution_history: Vec<RunSummary>,
    },
    #[serde(rename_all = "camelCase")]
    Running {
        collection: Collection,
        total_items: usize,
        completed_items: usize,
        current_item_key: Option<String>,
        started_at: DateTime<Utc>,
        last_updated_at: DateTime<Utc>,
    },
}

impl JobStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running { .. })
    }
}

/// Summary of one completed run.
///
/// `items_processed` counts every item the run visited, success or failure;
/// `items_indexed` counts the entries actually committed. The difference is
/// the number of classification failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub collection: Collection,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub items_processed: usize,
    pub items_indexed: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryFile {
    #[serde(default)]
    executions: Vec<RunSummary>,
}

/// Load the durable execution history. A missing file is an empty history;
/// an unreadable one is surfaced so startup can log it and carry on.
pub fn load_history(path: &Path) -> Result<Vec<RunSummary>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file: HistoryFile =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file.executions)
}

/// Append a run summary, dropping the oldest beyond the retention cap.
pub fn append_history(path: &Path, history: &mut Vec<RunSummary>, summary: RunSummary) -> Result<()> {
    history.push(summary);
    if history.len() > HISTORY_RETENTION {
        let excess = history.len() - HISTORY_RETENTION;
        history.drain(..excess);
    }

    crate::stores::write_json_atomic(
        path,
        &HistoryFile {
            executions: history.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn summary(n: usize) -> RunSummary {
        RunSummary {
            collection: Collection::ReferencePhotos,
            completed_at: Utc::now(),
            duration_seconds: n as f64,
            items_processed: n,
            items_indexed: n,
        }
    }

    #[test]
    fn test_history_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexer_history.json");

        let mut history = load_history(&path).unwrap();
        assert!(history.is_empty());

        append_history(&path, &mut history, summary(1)).unwrap();
        append_history(&path, &mut history, summary(2)).unwrap();

        let reloaded = load_history(&path).unwrap();
        assert_eq!(reloaded, history);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_history_retention_drops_oldest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("indexer_history.json");

        let mut history = Vec::new();
        for n in 0..HISTORY_RETENTION + 3 {
            append_history(&path, &mut history, summary(n)).unwrap();
        }

        assert_eq!(history.len(), HISTORY_RETENTION);
        assert_eq!(history[0].items_processed, 3);
    }
}
