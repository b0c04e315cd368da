//! PDF page rasterization
//!
//! Pages are rendered by poppler's `pdftoppm` into a caller-owned directory and
//! loaded back as in-memory images, ordered by page number.

use crate::error::OcrError;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name prefix handed to the renderer
const PAGE_PREFIX: &str = "page";

/// One rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number
    pub number: u32,
    pub image: DynamicImage,
}

/// Converts a PDF document into page images
pub trait PageRasterizer {
    /// Render every page of `pdf`, using `output_dir` for any intermediate
    /// files. Pages are returned in page order.
    fn rasterize(&self, pdf: &Path, output_dir: &Path) -> Result<Vec<RenderedPage>, OcrError>;
}

/// Renders pages by running `pdftoppm -png`
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        Self {
            program: program.into(),
            dpi,
        }
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, output_dir: &Path) -> Result<Vec<RenderedPage>, OcrError> {
        tracing::debug!("Rendering {:?} at {} dpi", pdf, self.dpi);

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(output_dir.join(PAGE_PREFIX))
            .output()
            .map_err(|e| {
                OcrError::RenderError(format!("Failed to run {}: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RenderError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let mut page_files = collect_page_files(output_dir)?;
        page_files.sort_by_key(|(number, _)| *number);

        let mut pages = Vec::with_capacity(page_files.len());
        for (number, path) in page_files {
            let image = image::open(&path).map_err(|e| {
                OcrError::RenderError(format!("Failed to load rendered page {}: {}", number, e))
            })?;
            pages.push(RenderedPage { number, image });
        }

        if let Some(expected) = page_count(pdf) {
            if expected != pages.len() {
                tracing::warn!(
                    "Rendered {} pages but document declares {}",
                    pages.len(),
                    expected
                );
            }
        }

        tracing::debug!("Rendered {} pages from {:?}", pages.len(), pdf);

        Ok(pages)
    }
}

/// List renderer output in `dir` as (page number, path) pairs
fn collect_page_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>, OcrError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(page_number)
        {
            files.push((number, path));
        }
    }
    Ok(files)
}

/// Parse the page number out of a renderer file name such as `page-07.png`.
/// The zero padding width depends on the page count, so the number is compared
/// numerically rather than by name.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// Page count from the document structure, if it can be read
fn page_count(pdf: &Path) -> Option<usize> {
    match lopdf::Document::load(pdf) {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            tracing::debug!("Could not read page tree of {:?}: {}", pdf, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_parses_padded_names() {
        assert_eq!(page_number("page-1.png"), Some(1));
        assert_eq!(page_number("page-07.png"), Some(7));
        assert_eq!(page_number("page-112.png"), Some(112));
    }

    #[test]
    fn test_page_number_ignores_other_files() {
        assert_eq!(page_number("page_0.png"), None);
        assert_eq!(page_number("page-1.ppm"), None);
        assert_eq!(page_number("cover-1.png"), None);
        assert_eq!(page_number("page-x.png"), None);
    }

    #[test]
    fn test_collect_page_files_skips_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page-10.png"), b"").unwrap();
        std::fs::write(dir.path().join("page-02.png"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let mut files = collect_page_files(dir.path()).unwrap();
        files.sort_by_key(|(number, _)| *number);

        let numbers: Vec<u32> = files.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![2, 10]);
    }

    #[test]
    fn test_missing_renderer_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let rasterizer = PdftoppmRasterizer::new(dir.path().join("no-such-pdftoppm"), 200);
        let err = rasterizer.rasterize(&pdf, dir.path()).unwrap_err();
        assert!(matches!(err, OcrError::RenderError(_)));
        assert!(err.to_string().contains("Failed to run"));
    }

    #[test]
    fn test_page_count_of_unreadable_pdf_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        std::fs::write(&pdf, b"not a pdf").unwrap();
        assert_eq!(page_count(&pdf), None);
    }
}
