//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. Models are read from the cache
//! directories and only fetched from the network when downloads are enabled.

use crate::engine::{EngineOptions, TextRecognizer};
use crate::error::OcrError;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Public bucket hosting the stock ocrs models
const MODEL_BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";

/// File extension of serialized rten models
const MODEL_EXTENSION: &str = "rten";

/// ocrs recognizes the Latin alphabet only
const SUPPORTED_LANGUAGES: &[&str] = &["en"];

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Load the detection and recognition models named in `options`
    pub fn new(options: &EngineOptions) -> Result<Self, OcrError> {
        if let Some(language) = options
            .languages
            .iter()
            .find(|l| !SUPPORTED_LANGUAGES.contains(&l.as_str()))
        {
            return Err(OcrError::InitializationError(format!(
                "Unsupported language '{}' (supported: {})",
                language,
                SUPPORTED_LANGUAGES.join(", ")
            )));
        }

        if options.use_gpu {
            // rten executes on the CPU; treat the request as a hint, as other engines do
            // when no accelerator is present.
            tracing::debug!("Hardware acceleration requested but not available, using CPU");
        }

        let detection_model_path = locate_model(options, &options.detection_model)?;
        let recognition_model_path = locate_model(options, &options.recognition_model)?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        if options.verbose {
            tracing::info!(
                "ocrs engine initialized (detection: {:?}, recognition: {:?})",
                detection_model_path,
                recognition_model_path
            );
        } else {
            tracing::debug!("ocrs engine initialized");
        }

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn read_text(&self, path: &Path) -> Result<Vec<String>, OcrError> {
        let img = image::open(path)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to load image: {}", e)))?;

        // Convert to RGB8 (HWC format, which is what ImageSource::from_bytes expects)
        let rgb_img = img.into_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::ProcessingError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let fragments: Vec<String> = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                line.words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.trim().is_empty())
            .collect();

        tracing::debug!(
            "Recognized {} text lines in {:?} ({}x{})",
            fragments.len(),
            path,
            dimensions.0,
            dimensions.1
        );

        Ok(fragments)
    }
}

/// File name for a model, accepting names given with or without the extension
fn model_file_name(name: &str) -> String {
    if Path::new(name)
        .extension()
        .is_some_and(|ext| ext == MODEL_EXTENSION)
    {
        name.to_string()
    } else {
        format!("{}.{}", name, MODEL_EXTENSION)
    }
}

/// Find a model in the network directory, then the model directory. Falls back
/// to downloading into the model directory when that is allowed.
fn locate_model(options: &EngineOptions, name: &str) -> Result<PathBuf, OcrError> {
    let file_name = model_file_name(name);

    for dir in [&options.network_dir, &options.model_dir] {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            tracing::debug!("Using cached model from {:?}", candidate);
            return Ok(candidate);
        }
    }

    if !options.download_enabled {
        return Err(OcrError::InitializationError(format!(
            "Model {} not found in {:?} and downloads are disabled",
            file_name, options.model_dir
        )));
    }

    let target = options.model_dir.join(&file_name);
    let url = format!("{}/{}", MODEL_BASE_URL, file_name);
    tracing::info!("Downloading {} (this may take a moment)...", file_name);
    download_file(&url, &target)?;
    tracing::info!("Downloaded {} to {:?}", file_name, target);

    Ok(target)
}

/// Download a file from URL to path using ureq. The body lands in a temporary
/// file next to the target and is renamed into place once complete.
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download model: {}", e)))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut partial = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create model file: {}", e))
    })?;

    let mut reader = response.into_body().into_reader();
    std::io::copy(&mut reader, &mut partial).map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;
    partial
        .flush()
        .map_err(|e| OcrError::InitializationError(format!("Failed to write model file: {}", e)))?;

    partial
        .persist(path)
        .map_err(|e| OcrError::InitializationError(format!("Failed to store model file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_in(model_dir: &Path, network_dir: &Path) -> EngineOptions {
        EngineOptions {
            languages: vec!["en".to_string()],
            use_gpu: false,
            model_dir: model_dir.to_path_buf(),
            network_dir: network_dir.to_path_buf(),
            detection_model: "text-detection".to_string(),
            recognition_model: "text-recognition".to_string(),
            download_enabled: false,
            verbose: false,
        }
    }

    #[test]
    fn test_model_file_name_adds_extension() {
        assert_eq!(model_file_name("text-recognition"), "text-recognition.rten");
        assert_eq!(model_file_name("custom.rten"), "custom.rten");
    }

    #[test]
    fn test_network_dir_takes_precedence() {
        let models = tempfile::tempdir().unwrap();
        let networks = tempfile::tempdir().unwrap();
        std::fs::write(models.path().join("text-recognition.rten"), b"stock").unwrap();
        std::fs::write(networks.path().join("text-recognition.rten"), b"custom").unwrap();

        let options = options_in(models.path(), networks.path());
        let found = locate_model(&options, "text-recognition").unwrap();
        assert_eq!(found, networks.path().join("text-recognition.rten"));
    }

    #[test]
    fn test_falls_back_to_model_dir() {
        let models = tempfile::tempdir().unwrap();
        let networks = tempfile::tempdir().unwrap();
        std::fs::write(models.path().join("text-detection.rten"), b"stock").unwrap();

        let options = options_in(models.path(), networks.path());
        let found = locate_model(&options, "text-detection").unwrap();
        assert_eq!(found, models.path().join("text-detection.rten"));
    }

    #[test]
    fn test_missing_model_without_download_fails() {
        let models = tempfile::tempdir().unwrap();
        let options = options_in(models.path(), models.path());

        let err = locate_model(&options, "text-detection").unwrap_err();
        assert!(matches!(err, OcrError::InitializationError(_)));
        assert!(err.to_string().contains("text-detection.rten"));
        assert!(err.to_string().contains("downloads are disabled"));
    }

    #[test]
    fn test_unsupported_language_rejected_before_model_lookup() {
        let models = tempfile::tempdir().unwrap();
        let mut options = options_in(models.path(), models.path());
        options.languages = vec!["en".to_string(), "ja".to_string()];

        let err = OcrsEngine::new(&options).err().unwrap();
        assert!(err.to_string().contains("Unsupported language 'ja'"));
    }

    #[test]
    fn test_missing_models_fail_engine_construction() {
        let models = tempfile::tempdir().unwrap();
        let options = options_in(models.path(), models.path());

        let err = OcrsEngine::new(&options).err().unwrap();
        assert!(err
            .to_string()
            .starts_with("Failed to initialize OCR engine: Model text-detection.rten"));
    }
}
