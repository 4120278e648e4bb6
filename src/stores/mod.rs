//! Flat JSON record stores consumed by the core pipeline.
//!
//! These hold the skill vocabulary (classifier prompt set, warmup filter) and
//! the per-image drawn metadata (filter predicate and sort key). They share
//! the index store's rename-on-write discipline.

pub mod drawn;
pub mod skills;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

pub use drawn::{DrawnRecord, DrawnStore};
pub use skills::{SkillsError, SkillsStore, DEFAULT_SKILLS};

/// Serialize `value` to `path` via a sibling temp file and atomic rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;

    Ok(())
}
