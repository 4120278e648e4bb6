//! The indexing job runner: drives scanner + classifier over one collection
//! and commits the result to the index store.
//!
//! The runner is an explicit state object shared by value (all fields are
//! cheap clones or `Arc`s); the worker thread is the single writer of the
//! running state, everyone else reads snapshots via `status()`. The working
//! map is committed all-or-nothing at run completion: an interrupted run
//! leaves the previous index untouched.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{error, info, warn};

use super::{append_history, load_history, JobError, JobStatus, RunSummary};
use crate::classifier::ImageClassifier;
use crate::collection::Collection;
use crate::config::CollectionsConfig;
use crate::index::{CollectionIndex, IndexStore};
use crate::scanner::{self, ScannedImage};

#[derive(Debug, Clone)]
enum InnerState {
    Idle {
        last_completed_at: Option<DateTime<Utc>>,
    },
    Running {
        collection: Collection,
        total_items: usize,
        completed_items: usize,
        current_item_key: Option<String>,
        started_at: DateTime<Utc>,
        last_updated_at: DateTime<Utc>,
    },
}

#[derive(Clone)]
pub struct IndexingJobRunner {
    state: Arc<Mutex<InnerState>>,
    history: Arc<Mutex<Vec<RunSummary>>>,
    store: IndexStore,
    classifier: Arc<dyn ImageClassifier>,
    collections: CollectionsConfig,
    extensions: Vec<String>,
    history_path: std::path::PathBuf,
}

impl IndexingJobRunner {
    /// Interrupted runs are not resumed: the runner always starts Idle, with
    /// only the durable history carried over from previous processes.
    pub fn new(
        store: IndexStore,
        classifier: Arc<dyn ImageClassifier>,
        collections: CollectionsConfig,
        extensions: Vec<String>,
        history_path: std::path::PathBuf,
    ) -> Self {
        let history = load_history(&history_path).unwrap_or_else(|e| {
            warn!(error = %e, "could not load indexer history, starting empty");
            Vec::new()
        });
        let last_completed_at = history.last().map(|s| s.completed_at);

        Self {
            state: Arc::new(Mutex::new(InnerState::Idle { last_completed_at })),
            history: Arc::new(Mutex::new(history)),
            store,
            classifier,
            collections,
            extensions,
            history_path,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, InnerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<RunSummary>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the current state; pure read, safe to poll frequently.
    pub fn status(&self) -> JobStatus {
        match &*self.lock_state() {
            InnerState::Idle { last_completed_at } => JobStatus::Idle {
                last_completed_at: *last_completed_at,
                execution_history: self.lock_history().clone(),
            },
            InnerState::Running {
                collection,
                total_items,
                completed_items,
                current_item_key,
                started_at,
                last_updated_at,
            } => JobStatus::Running {
                collection: *collection,
                total_items: *total_items,
                completed_items: *completed_items,
                current_item_key: current_item_key.clone(),
                started_at: *started_at,
                last_updated_at: *last_updated_at,
            },
        }
    }

    /// Start a full reindex of `collection` on a dedicated thread. Returns as
    /// soon as the state has transitioned; rejects if a run is in flight.
    pub fn start(&self, collection: Collection) -> Result<(), JobError> {
        let images = self.begin(collection)?;

        let runner = self.clone();
        std::thread::spawn(move || {
            // Commit failures are logged inside execute; the background
            // path has no caller to return them to.
            let _ = runner.execute(collection, images);
        });

        Ok(())
    }

    /// Run a full reindex synchronously (used by the CLI indexer).
    pub fn run_blocking(&self, collection: Collection) -> Result<RunSummary, JobError> {
        let images = self.begin(collection)?;
        self.execute(collection, images)
    }

    /// Gate + transition. The scan happens before the transition so
    /// `total_items` is correct from the first status poll.
    fn begin(&self, collection: Collection) -> Result<Vec<ScannedImage>, JobError> {
        let root = self.collections.root(collection).to_path_buf();
        if !root.is_dir() {
            return Err(JobError::RootUnavailable { collection, path: root });
        }
        let images = scanner::scan(&root, &self.extensions);

        let mut state = self.lock_state();
        if matches!(*state, InnerState::Running { .. }) {
            return Err(JobError::AlreadyRunning);
        }

        let now = Utc::now();
        *state = InnerState::Running {
            collection,
            total_items: images.len(),
            completed_items: 0,
            current_item_key: None,
            started_at: now,
            last_updated_at: now,
        };

        info!(collection = %collection, total = images.len(), "indexing run started");
        Ok(images)
    }

    fn execute(
        &self,
        collection: Collection,
        images: Vec<ScannedImage>,
    ) -> Result<RunSummary, JobError> {
        let run_timer = Instant::now();
        let total = images.len();
        let mut entries = CollectionIndex::new();

        for (processed, image) in images.into_iter().enumerate() {
            match std::fs::read(&image.path) {
                Ok(bytes) => match self.classifier.classify(&bytes) {
                    Ok(attributes) => {
                        entries.insert(image.relative_key.clone(), attributes);
                    }
                    Err(e) => {
                        // Skipped items are simply absent from the index and
                        // retried on the next run.
                        warn!(
                            key = %image.relative_key,
                            error = %e,
                            "classification failed, skipping item"
                        );
                    }
                },
                Err(e) => {
                    warn!(key = %image.relative_key, error = %e, "unreadable image, skipping item");
                }
            }

            let mut state = self.lock_state();
            if let InnerState::Running {
                completed_items,
                current_item_key,
                last_updated_at,
                ..
            } = &mut *state
            {
                *completed_items = processed + 1;
                *current_item_key = Some(image.relative_key);
                *last_updated_at = Utc::now();
            }
        }

        let items_indexed = entries.len();
        if let Err(e) = self.store.replace_collection(collection, entries) {
            error!(collection = %collection, error = %e, "failed to commit index");
            // The run did not complete; only durable history counts.
            let last_completed_at = self.lock_history().last().map(|s| s.completed_at);
            *self.lock_state() = InnerState::Idle { last_completed_at };
            return Err(JobError::Commit(e));
        }

        let completed_at = Utc::now();
        let summary = RunSummary {
            collection,
            completed_at,
            duration_seconds: run_timer.elapsed().as_secs_f64(),
            items_processed: total,
            items_indexed,
        };

        {
            let mut history = self.lock_history();
            if let Err(e) = append_history(&self.history_path, &mut history, summary.clone()) {
                warn!(error = %e, "could not persist indexer history");
            }
        }

        *self.lock_state() = InnerState::Idle {
            last_completed_at: Some(completed_at),
        };

        info!(
            collection = %collection,
            processed = summary.items_processed,
            indexed = summary.items_indexed,
            seconds = summary.duration_seconds,
            "indexing run finished"
        );

        Ok(summary)
    }
}
