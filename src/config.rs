use crate::engine::EngineOptions;
use crate::environment::CacheLayout;
use crate::Args;
use std::path::PathBuf;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub cache_root: PathBuf,
    pub cpu_only: bool,
    pub detection_model: String,
    pub recognition_model: String,
    pub allow_download: bool,
    pub quiet_stderr: bool,
    pub verbose: bool,
    pub dpi: u32,
    pub pdftoppm: PathBuf,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            input: args.path,
            cache_root: args.cache_root,
            cpu_only: args.cpu_only,
            detection_model: args.detection_model,
            recognition_model: args.recognition_model,
            allow_download: args.allow_download,
            quiet_stderr: args.quiet_stderr,
            verbose: args.verbose,
            dpi: args.dpi,
            pdftoppm: args.pdftoppm,
        }
    }
}

impl Config {
    /// Engine options for single images. PDF runs override the acceleration flag.
    pub fn engine_options(&self, layout: &CacheLayout) -> EngineOptions {
        EngineOptions {
            languages: vec!["en".to_string()],
            use_gpu: !self.cpu_only,
            model_dir: layout.recognition.clone(),
            network_dir: layout.recognition.clone(),
            detection_model: self.detection_model.clone(),
            recognition_model: self.recognition_model.clone(),
            download_enabled: self.allow_download,
            verbose: self.verbose,
        }
    }
}
