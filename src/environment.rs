//! Process environment set-up
//!
//! Creates the model cache directories, exports their locations for child
//! processes, and provides a scoped guard that silences standard error while
//! the recognition engine runs.

use crate::error::OcrError;
use std::path::{Path, PathBuf};

/// Directory name for recognition model files under the cache root
pub const RECOGNITION_CACHE_DIR: &str = "easyocr_cache";
/// Directory name for auxiliary model files under the cache root
pub const AUXILIARY_CACHE_DIR: &str = "huggingface_cache";

/// Resolved cache directories. Immutable once prepared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    pub root: PathBuf,
    pub recognition: PathBuf,
    pub auxiliary: PathBuf,
}

impl CacheLayout {
    /// Lay out the caches under `root`, resolving a relative root against the
    /// current working directory.
    pub fn under(root: &Path) -> Result<Self, OcrError> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        Ok(Self {
            recognition: root.join(RECOGNITION_CACHE_DIR),
            auxiliary: root.join(AUXILIARY_CACHE_DIR),
            root,
        })
    }
}

/// Create the cache directories (no error if they already exist) and export
/// their locations to the process environment.
pub fn prepare(root: &Path) -> Result<CacheLayout, OcrError> {
    let layout = create_cache_dirs(root)?;

    export_process_env(&layout);

    tracing::debug!(
        "Cache directories ready under {:?} (recognition: {:?}, auxiliary: {:?})",
        layout.root,
        layout.recognition,
        layout.auxiliary
    );

    Ok(layout)
}

fn create_cache_dirs(root: &Path) -> Result<CacheLayout, OcrError> {
    let layout = CacheLayout::under(root)?;

    std::fs::create_dir_all(&layout.recognition)?;
    std::fs::create_dir_all(&layout.auxiliary)?;

    Ok(layout)
}

/// Child processes (the PDF renderer) inherit these.
fn export_process_env(layout: &CacheLayout) {
    std::env::set_var("HOME", &layout.recognition);
    std::env::set_var("EASYOCR_CACHE_DIR", &layout.recognition);
    std::env::set_var("TRANSFORMERS_CACHE", &layout.auxiliary);
}

/// Redirects standard error to the null device until dropped.
///
/// Engines and their native dependencies write warnings straight to file
/// descriptor 2, bypassing `tracing`. The guard swaps the descriptor and puts
/// the original back on drop, so every exit path of the guarded scope restores it.
pub struct StderrSilencer {
    #[cfg(unix)]
    saved: Option<libc::c_int>,
}

#[cfg(unix)]
impl StderrSilencer {
    pub fn engage(enabled: bool) -> Self {
        use std::io::Write;
        use std::os::unix::io::AsRawFd;

        if !enabled {
            return Self { saved: None };
        }

        let _ = std::io::stderr().flush();

        let devnull = match std::fs::OpenOptions::new().write(true).open("/dev/null") {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Cannot open null device, leaving stderr attached: {}", e);
                return Self { saved: None };
            }
        };

        let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
        if saved < 0 {
            tracing::warn!("Cannot duplicate stderr, leaving it attached");
            return Self { saved: None };
        }

        if unsafe { libc::dup2(devnull.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
            unsafe { libc::close(saved) };
            tracing::warn!("Cannot redirect stderr, leaving it attached");
            return Self { saved: None };
        }

        Self { saved: Some(saved) }
    }

    #[cfg(test)]
    pub fn is_engaged(&self) -> bool {
        self.saved.is_some()
    }
}

#[cfg(unix)]
impl Drop for StderrSilencer {
    fn drop(&mut self) {
        use std::io::Write;

        if let Some(saved) = self.saved.take() {
            let _ = std::io::stderr().flush();
            unsafe {
                libc::dup2(saved, libc::STDERR_FILENO);
                libc::close(saved);
            }
        }
    }
}

#[cfg(not(unix))]
impl StderrSilencer {
    pub fn engage(enabled: bool) -> Self {
        if enabled {
            tracing::debug!("stderr suppression is only available on unix targets");
        }
        Self {}
    }

    #[cfg(test)]
    pub fn is_engaged(&self) -> bool {
        false
    }
}

/// Tests that swap descriptor 2 hold this so their guards never interleave.
#[cfg(test)]
pub(crate) static STDERR_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Device and inode behind descriptor 2
#[cfg(all(test, unix))]
pub(crate) fn stderr_identity() -> (u64, u64) {
    let mut stat: libc::stat = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::fstat(libc::STDERR_FILENO, &mut stat) };
    assert_eq!(rc, 0);
    (stat.st_dev as u64, stat.st_ino as u64)
}
