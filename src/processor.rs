//! File dispatch and the image / PDF recognition flows

use crate::engine::{EngineBuilder, EngineOptions, Extraction};
use crate::envelope::Envelope;
use crate::environment::StderrSilencer;
use crate::error::OcrError;
use crate::rasterizer::PageRasterizer;
use image::ImageFormat;
use std::path::Path;

/// Which flow an input file takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// `.pdf` (any case) is a PDF; everything else goes to the engine as an image
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.to_string_lossy().eq_ignore_ascii_case("pdf") => Self::Pdf,
            _ => Self::Image,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "PDF",
        }
    }

    /// Convert an operation outcome into the caller-facing envelope
    pub fn envelope(self, outcome: Result<Extraction, OcrError>) -> Envelope {
        match outcome {
            Ok(Extraction::Text(text)) => Envelope::success(text),
            Ok(Extraction::NoText) => {
                Envelope::error(format!("No text detected in the {}.", self.label()))
            }
            Err(e @ OcrError::NotFound(_)) => Envelope::error(format!("Error: {}", e)),
            Err(e) => Envelope::error(format!(
                "Error processing {}: {}",
                self.label(),
                e.detail()
            )),
        }
    }
}

/// Runs one input file through recognition
pub struct FileProcessor<B, R> {
    builder: B,
    rasterizer: R,
    options: EngineOptions,
    quiet_stderr: bool,
}

impl<B: EngineBuilder, R: PageRasterizer> FileProcessor<B, R> {
    pub fn new(builder: B, rasterizer: R, options: EngineOptions, quiet_stderr: bool) -> Self {
        Self {
            builder,
            rasterizer,
            options,
            quiet_stderr,
        }
    }

    /// Dispatch on extension and produce the envelope. Never fails.
    pub fn process(&self, path: &Path) -> Envelope {
        let kind = DocumentKind::from_path(path);
        tracing::info!("Processing {:?} as {}", path, kind.label());

        let outcome = match kind {
            DocumentKind::Pdf => self.ocr_pdf(path),
            DocumentKind::Image => self.ocr_image(path),
        };

        if let Err(e) = &outcome {
            tracing::warn!("OCR of {:?} failed: {}", path, e);
        }

        kind.envelope(outcome)
    }

    /// Recognize a single image file
    pub fn ocr_image(&self, path: &Path) -> Result<Extraction, OcrError> {
        if !path.exists() {
            return Err(OcrError::NotFound(path.to_path_buf()));
        }

        let _quiet = StderrSilencer::engage(self.quiet_stderr);

        let engine = self.builder.build(&self.options)?;
        let fragments = engine.read_text(path)?;

        Ok(Extraction::from_fragments(fragments))
    }

    /// Render every page of a PDF and recognize them in page order
    pub fn ocr_pdf(&self, path: &Path) -> Result<Extraction, OcrError> {
        if !path.exists() {
            return Err(OcrError::NotFound(path.to_path_buf()));
        }

        let workdir = tempfile::Builder::new().prefix("ocr-pages-").tempdir()?;
        let _quiet = StderrSilencer::engage(self.quiet_stderr);

        let mut pages = self.rasterizer.rasterize(path, workdir.path())?;
        pages.sort_by_key(|page| page.number);

        let engine = self.builder.build(&self.options.without_gpu())?;

        let mut page_texts = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            let image_path = workdir.path().join(format!("page_{}.png", index));
            page.image
                .save_with_format(&image_path, ImageFormat::Png)
                .map_err(|e| {
                    OcrError::RenderError(format!("Failed to save page {}: {}", page.number, e))
                })?;

            let fragments = engine.read_text(&image_path)?;
            tracing::debug!("Page {}: {} text lines", page.number, fragments.len());

            if !fragments.is_empty() {
                page_texts.push(fragments.join("\n"));
            }
        }

        Ok(Extraction::from_fragments(page_texts))
    }
}
