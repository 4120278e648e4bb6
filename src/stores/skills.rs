//! The skill vocabulary: an ordered list of art skills used as the
//! classifier's suggestion labels and as a warmup/reference filter.

use anyhow::{Context, Result};
use std::path::PathBuf;
use thiserror::Error;

/// Built-in vocabulary used until the user edits their own list.
pub const DEFAULT_SKILLS: [&str; 13] = [
    "Perspective",
    "Foreshortening",
    "Drapery",
    "Proportion",
    "Anatomy",
    "Gesture",
    "Composition",
    "Value",
    "Color Harmony",
    "Light And Shadow",
    "Texture",
    "Form",
    "Balance",
];

fn default_vocabulary() -> Vec<String> {
    DEFAULT_SKILLS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Error)]
pub enum SkillsError {
    #[error("skill already exists: {0}")]
    AlreadyExists(String),

    #[error("skill not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct SkillsStore {
    path: PathBuf,
}

impl SkillsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the vocabulary, falling back to the built-in list when no file
    /// exists yet or the stored list has been emptied. The classifier scores
    /// against this list and a committed index entry always carries at least
    /// one skill, so the vocabulary must never be empty.
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(default_vocabulary());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let skills: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        if skills.is_empty() {
            return Ok(default_vocabulary());
        }
        Ok(skills)
    }

    pub fn add(&self, skill: &str) -> Result<Vec<String>, SkillsError> {
        let mut skills = self.load()?;
        if skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            return Err(SkillsError::AlreadyExists(skill.to_string()));
        }
        skills.push(skill.to_string());
        super::write_json_atomic(&self.path, &skills)?;
        Ok(skills)
    }

    pub fn remove(&self, skill: &str) -> Result<Vec<String>, SkillsError> {
        let mut skills = self.load()?;
        let before = skills.len();
        skills.retain(|s| !s.eq_ignore_ascii_case(skill));
        if skills.len() == before {
            return Err(SkillsError::NotFound(skill.to_string()));
        }
        super::write_json_atomic(&self.path, &skills)?;
        Ok(skills)
    }
}
