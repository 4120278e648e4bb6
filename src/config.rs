use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::collection::Collection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the photo index, run history and JSON stores.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub collections: CollectionsConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_photos_root")]
    pub my_photos: PathBuf,

    #[serde(default = "default_reference_root")]
    pub reference_photos: PathBuf,

    #[serde(default = "default_art_root")]
    pub my_art: PathBuf,
}

impl CollectionsConfig {
    /// The single configured root for a collection. All relative keys in the
    /// photo index are derived from these roots by the scanner.
    pub fn root(&self, collection: Collection) -> &Path {
        match collection {
            Collection::MyPhotos => &self.my_photos,
            Collection::ReferencePhotos => &self.reference_photos,
            Collection::MyArt => &self.my_art,
        }
    }
}

fn default_photos_root() -> PathBuf {
    PathBuf::from("sample_images/photos")
}

fn default_reference_root() -> PathBuf {
    PathBuf::from("sample_images/reference")
}

fn default_art_root() -> PathBuf {
    PathBuf::from("sample_images/artwork")
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            my_photos: default_photos_root(),
            reference_photos: default_reference_root(),
            my_art: default_art_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "png".to_string(),
        "gif".to_string(),
        "bmp".to_string(),
        "webp".to_string(),
    ]
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Where downloaded ONNX models are cached.
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Minimum softmax confidence for a skill suggestion to be kept.
    #[serde(default = "default_skill_threshold")]
    pub skill_threshold: f32,
}

fn default_models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("atelier/models")
}

fn default_skill_threshold() -> f32 {
    0.1
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            skill_threshold: default_skill_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atelier")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            collections: CollectionsConfig::default(),
            scanner: ScannerConfig::default(),
            classifier: ClassifierConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("atelier")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("photo_index.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("indexer_history.json")
    }

    pub fn skills_path(&self) -> PathBuf {
        self.data_dir.join("skills.json")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join("metadata.json")
    }
}
