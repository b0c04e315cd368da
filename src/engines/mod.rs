//! OCR engine implementations
//!
//! Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

use crate::engine::{EngineBuilder, EngineOptions, TextRecognizer};
use crate::error::OcrError;

/// Builds whichever engine this binary was compiled with
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEngineBuilder;

impl EngineBuilder for DefaultEngineBuilder {
    #[cfg(feature = "engine-ocrs")]
    fn build(&self, options: &EngineOptions) -> Result<Box<dyn TextRecognizer>, OcrError> {
        let engine = ocrs::OcrsEngine::new(options)?;
        tracing::debug!("Built {} engine", engine.name());
        Ok(Box::new(engine))
    }

    #[cfg(not(feature = "engine-ocrs"))]
    fn build(&self, _options: &EngineOptions) -> Result<Box<dyn TextRecognizer>, OcrError> {
        Err(OcrError::InitializationError(
            "No OCR engines available. Build with --features engine-ocrs".to_string(),
        ))
    }
}
