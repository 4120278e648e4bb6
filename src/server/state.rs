use anyhow::Result;
use std::sync::Arc;

use crate::classifier::{AttributeClassifier, ClipEncoder};
use crate::config::Config;
use crate::index::IndexStore;
use crate::jobs::IndexingJobRunner;
use crate::stores::{DrawnStore, SkillsStore};

/// Application state shared by all handlers.
pub struct AppState {
    pub config: Config,
    pub store: IndexStore,
    pub runner: IndexingJobRunner,
    pub skills: SkillsStore,
    pub drawn: DrawnStore,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let store = IndexStore::new(config.index_path());
        let skills = SkillsStore::new(config.skills_path());
        let drawn = DrawnStore::new(config.metadata_path());

        // The classifier picks up the skill vocabulary at startup; runs
        // started after a vocabulary edit use it on the next process start.
        let vocabulary = skills.load()?;
        let classifier = Arc::new(AttributeClassifier::new(
            ClipEncoder::new(&config.classifier.models_dir),
            vocabulary,
            config.classifier.skill_threshold,
        ));

        let runner = IndexingJobRunner::new(
            store.clone(),
            classifier,
            config.collections.clone(),
            config.scanner.image_extensions.clone(),
            config.history_path(),
        );

        Ok(Arc::new(AppState {
            config,
            store,
            runner,
            skills,
            drawn,
        }))
    }
}
