//! AI attribute classification for one image at a time.
//!
//! Each attribute axis is resolved by zero-shot comparison of the image
//! embedding against a fixed set of natural-language label prompts; the
//! axis's winning label is the one with the highest confidence. Skills are
//! scored against the full vocabulary and the top 1-4 above a confidence
//! threshold are kept, confidence-descending.

pub mod clip;

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::index::{GenderPresentation, ImageAttributes, Lighting, SubjectType};

pub use clip::{cosine_similarity, ClipEncoder};

/// A classification failure is per-image: the caller skips the item and must
/// not record an index entry, so a later reindex can retry.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("could not decode image")]
    BadImage(#[from] image::ImageError),

    #[error("model inference failed")]
    Inference(#[source] anyhow::Error),
}

/// The seam between the job runner and the vision models.
pub trait ImageClassifier: Send + Sync {
    fn classify(&self, image_bytes: &[u8]) -> Result<ImageAttributes, ClassifierError>;
}

const SUBJECT_PROMPTS: &[(&str, SubjectType)] = &[
    ("a photo of a person", SubjectType::People),
    ("a photo of a group of people", SubjectType::People),
    ("a photo of an animal", SubjectType::Animals),
    ("a photo of a building", SubjectType::Buildings),
    ("a photo of a landscape", SubjectType::Landscapes),
    ("a photo of a still life arrangement", SubjectType::All),
    ("a photo of an everyday object", SubjectType::All),
];

const GENDER_PROMPTS: &[(&str, GenderPresentation)] = &[
    ("a photo of a woman", GenderPresentation::Female),
    ("a photo of a man", GenderPresentation::Male),
    ("a photo with no people in it", GenderPresentation::All),
];

const LIGHTING_PROMPTS: &[(&str, Lighting)] = &[
    ("a brightly lit photo", Lighting::Bright),
    ("a dark, low-light photo", Lighting::Dark),
    ("a photo with strong contrast between light and shadow", Lighting::HighContrast),
    ("a vivid, colorful photo", Lighting::Colorful),
];

/// CLIP-backed classifier. Model sessions are lazy and process-wide; creating
/// this struct is cheap and does not touch the network.
pub struct AttributeClassifier {
    encoder: ClipEncoder,
    skill_vocabulary: Vec<String>,
    skill_threshold: f32,
    // Label prompts repeat for every image of a run; cache their embeddings.
    text_cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl AttributeClassifier {
    pub fn new(encoder: ClipEncoder, skill_vocabulary: Vec<String>, skill_threshold: f32) -> Self {
        Self {
            encoder,
            skill_vocabulary,
            skill_threshold,
            text_cache: Mutex::new(HashMap::new()),
        }
    }

    fn text_embedding(&self, prompt: &str) -> Result<Vec<f32>, ClassifierError> {
        {
            let cache = self.text_cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(embedding) = cache.get(prompt) {
                return Ok(embedding.clone());
            }
        }

        let embedding = self
            .encoder
            .embed_text(prompt)
            .map_err(ClassifierError::Inference)?;

        let mut cache = self.text_cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(prompt.to_string(), embedding.clone());
        Ok(embedding)
    }

    /// Per-label confidences for an image embedding against a prompt set.
    fn confidences<'a>(
        &self,
        image_embedding: &[f32],
        prompts: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<f32>, ClassifierError> {
        let mut similarities = Vec::new();
        for prompt in prompts {
            let text = self.text_embedding(prompt)?;
            similarities.push(cosine_similarity(image_embedding, &text));
        }
        Ok(clip::softmax_scores(&similarities))
    }

    fn skill_prompt(skill: &str) -> String {
        format!("a reference image for practicing {}", skill.to_lowercase())
    }
}

impl ImageClassifier for AttributeClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<ImageAttributes, ClassifierError> {
        let img = image::load_from_memory(image_bytes)?;

        let image_embedding = self
            .encoder
            .embed_image(&img)
            .map_err(ClassifierError::Inference)?;

        let subject_scores =
            self.confidences(&image_embedding, SUBJECT_PROMPTS.iter().map(|(p, _)| *p))?;
        let subject_type = winning_label(&subject_scores, SUBJECT_PROMPTS);

        // The gender axis only means anything for people.
        let gender_presentation = if subject_type == SubjectType::People {
            let scores =
                self.confidences(&image_embedding, GENDER_PROMPTS.iter().map(|(p, _)| *p))?;
            winning_label(&scores, GENDER_PROMPTS)
        } else {
            GenderPresentation::All
        };

        let lighting_scores =
            self.confidences(&image_embedding, LIGHTING_PROMPTS.iter().map(|(p, _)| *p))?;
        let lighting = winning_label(&lighting_scores, LIGHTING_PROMPTS);

        let skill_prompts: Vec<String> = self
            .skill_vocabulary
            .iter()
            .map(|s| Self::skill_prompt(s))
            .collect();
        let skill_scores =
            self.confidences(&image_embedding, skill_prompts.iter().map(|s| s.as_str()))?;
        let skills = select_skills(&skill_scores, &self.skill_vocabulary, self.skill_threshold);

        Ok(ImageAttributes {
            subject_type,
            gender_presentation,
            lighting,
            skills,
        })
    }
}

/// The axis label whose prompt scored highest.
fn winning_label<T: Copy>(scores: &[f32], prompts: &[(&str, T)]) -> T {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = i;
        }
    }
    prompts[best].1
}

/// Top 1-4 vocabulary labels above `threshold`, confidence-descending. A
/// successfully classified image never gets zero skills: when nothing clears
/// the threshold the single best label is kept regardless.
fn select_skills(scores: &[f32], vocabulary: &[String], threshold: f32) -> Vec<String> {
    const MAX_SKILLS: usize = 4;

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut skills: Vec<String> = ranked
        .iter()
        .take(MAX_SKILLS)
        .filter(|(_, score)| *score >= threshold)
        .map(|(i, _)| vocabulary[*i].clone())
        .collect();

    if skills.is_empty() {
        if let Some((best, _)) = ranked.first() {
            skills.push(vocabulary[*best].clone());
        }
    }

    skills
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_winning_label_picks_highest_score() {
        let scores = [0.1, 0.6, 0.3];
        let prompts: &[(&str, SubjectType)] = &[
            ("a", SubjectType::People),
            ("b", SubjectType::Animals),
            ("c", SubjectType::Landscapes),
        ];
        assert_eq!(winning_label(&scores, prompts), SubjectType::Animals);
    }

    #[test]
    fn test_select_skills_ranked_and_capped() {
        let vocabulary = vocab(&["Anatomy", "Gesture", "Value", "Form", "Drapery"]);
        let scores = [0.30, 0.05, 0.25, 0.20, 0.15];
        let skills = select_skills(&scores, &vocabulary, 0.1);
        assert_eq!(skills, vec!["Anatomy", "Value", "Form", "Drapery"]);
    }

    #[test]
    fn test_select_skills_threshold_filters() {
        let vocabulary = vocab(&["Anatomy", "Gesture", "Value"]);
        let scores = [0.8, 0.15, 0.05];
        let skills = select_skills(&scores, &vocabulary, 0.1);
        assert_eq!(skills, vec!["Anatomy", "Gesture"]);
    }

    #[test]
    fn test_select_skills_never_empty() {
        let vocabulary = vocab(&["Anatomy", "Gesture"]);
        let scores = [0.04, 0.06];
        let skills = select_skills(&scores, &vocabulary, 0.1);
        assert_eq!(skills, vec!["Gesture"]);
    }

    #[test]
    fn test_skill_prompt_phrasing() {
        assert_eq!(
            AttributeClassifier::skill_prompt("Light And Shadow"),
            "a reference image for practicing light and shadow"
        );
    }
}
