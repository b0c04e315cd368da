use crate::error::OcrError;
use std::path::{Path, PathBuf};

/// Construction parameters for a recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Requested recognition languages (ISO 639-1)
    pub languages: Vec<String>,
    /// Ask for hardware acceleration when the backend has it
    pub use_gpu: bool,
    /// Directory holding the stock detection and recognition models
    pub model_dir: PathBuf,
    /// Directory searched first for user-supplied networks
    pub network_dir: PathBuf,
    pub detection_model: String,
    pub recognition_model: String,
    /// Fetch missing models over the network
    pub download_enabled: bool,
    /// Report model loading at info level instead of debug
    pub verbose: bool,
}

impl EngineOptions {
    /// Same options with hardware acceleration switched off (used for PDF batches)
    pub fn without_gpu(&self) -> Self {
        Self {
            use_gpu: false,
            ..self.clone()
        }
    }
}

/// Trait that all OCR engines must implement
pub trait TextRecognizer {
    /// Returns the engine identifier (e.g., "ocrs")
    fn name(&self) -> &'static str;

    /// Recognize an image file and return one fragment per detected text line,
    /// in reading order. An empty vector means the engine found no text.
    fn read_text(&self, path: &Path) -> Result<Vec<String>, OcrError>;
}

/// Builds configured engines. Separate from `TextRecognizer` so that the
/// processor controls when models get loaded.
pub trait EngineBuilder {
    fn build(&self, options: &EngineOptions) -> Result<Box<dyn TextRecognizer>, OcrError>;
}

/// Outcome of a successful OCR operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    NoText,
}

impl Extraction {
    /// Join recognized fragments with newlines; no fragments means no text.
    pub fn from_fragments(fragments: Vec<String>) -> Self {
        if fragments.is_empty() {
            Self::NoText
        } else {
            Self::Text(fragments.join("\n"))
        }
    }
}
