//! Standalone CLI indexer.
//!
//! Runs a full reindex of one collection (or all of them) in the foreground
//! and exits, sharing the index files with the server via the data directory.
//!
//! ## Usage
//!
//! ```bash
//! atelier-indexer                          # Reindex every collection
//! atelier-indexer --collection reference-photos   # Reindex just one
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use atelier::classifier::{AttributeClassifier, ClipEncoder};
use atelier::collection::Collection;
use atelier::config::Config;
use atelier::index::IndexStore;
use atelier::jobs::IndexingJobRunner;
use atelier::stores::SkillsStore;

struct IndexerArgs {
    /// Single collection to reindex; all of them when absent.
    collection: Option<Collection>,
    config_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = parse_args()?;

    init_logging()?;

    let config = match &args.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let store = IndexStore::new(config.index_path());
    let vocabulary = SkillsStore::new(config.skills_path()).load()?;

    // Download and load the models up front; a bad model cache fails here
    // rather than mid-run.
    let encoder = ClipEncoder::new(&config.classifier.models_dir);
    encoder.ensure_ready()?;

    let classifier = Arc::new(AttributeClassifier::new(
        encoder,
        vocabulary,
        config.classifier.skill_threshold,
    ));

    let runner = IndexingJobRunner::new(
        store,
        classifier,
        config.collections.clone(),
        config.scanner.image_extensions.clone(),
        config.history_path(),
    );

    let targets: Vec<Collection> = match args.collection {
        Some(collection) => vec![collection],
        None => Collection::ALL.to_vec(),
    };

    for collection in targets {
        let root = config.collections.root(collection);
        if !root.exists() {
            warn!(collection = %collection, root = %root.display(), "root missing, skipping");
            continue;
        }

        let summary = runner
            .run_blocking(collection)
            .with_context(|| format!("indexing {}", collection))?;

        info!(
            collection = %collection,
            processed = summary.items_processed,
            indexed = summary.items_indexed,
            seconds = summary.duration_seconds,
            "run complete"
        );
        println!(
            "{}: {} of {} images indexed in {:.1}s",
            collection, summary.items_indexed, summary.items_processed, summary.duration_seconds
        );
    }

    Ok(())
}

fn parse_args() -> Result<IndexerArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut collection = None;
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--collection" | "-C" => {
                if i + 1 < args.len() {
                    collection = Some(args[i + 1].parse::<Collection>()?);
                    i += 1;
                } else {
                    eprintln!("Error: --collection requires a name argument");
                    std::process::exit(1);
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Ok(IndexerArgs {
        collection,
        config_path,
    })
}

fn print_help() {
    println!(
        r#"atelier-indexer - Foreground photo indexer for atelier

USAGE:
    atelier-indexer [OPTIONS]

OPTIONS:
    --collection, -C NAME   Reindex one collection (my-photos, reference-photos, my-art)
    --config, -c PATH       Path to config file
    --help, -h              Show this help message

ENVIRONMENT:
    ATELIER_LOG             Log level (trace, debug, info, warn, error)

Without --collection, every configured collection is reindexed in turn.
Results land in the same photo_index.json the server reads.
"#
    );
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::prelude::*;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::new(
            std::env::var("ATELIER_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
