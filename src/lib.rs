//! Atelier: a personal art-practice hub.
//!
//! The core of the crate is the photo indexing pipeline: the [`scanner`]
//! enumerates collection roots, the [`classifier`] assigns attribute tuples
//! via CLIP zero-shot matching, the [`jobs`] runner drives a full collection
//! pass in the background, and the [`index`] store persists the result for
//! the [`filter`] engine. The [`warmup`] planner and the JSON [`stores`] feed
//! the drawing-session side of the application.

pub mod classifier;
pub mod collection;
pub mod config;
pub mod filter;
pub mod index;
pub mod jobs;
pub mod logging;
pub mod scanner;
pub mod server;
pub mod stores;
pub mod warmup;
