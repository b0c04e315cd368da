use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("The file {} does not exist.", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to process image: {0}")]
    ProcessingError(String),

    #[error("Failed to render PDF: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// The underlying message without the variant's prefix
    pub fn detail(&self) -> String {
        match self {
            OcrError::InitializationError(msg)
            | OcrError::ProcessingError(msg)
            | OcrError::RenderError(msg) => msg.clone(),
            OcrError::Io(e) => e.to_string(),
            OcrError::NotFound(_) => self.to_string(),
        }
    }
}
