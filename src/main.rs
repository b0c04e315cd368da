use clap::error::ErrorKind;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod engine;
mod engines;
mod envelope;
mod environment;
mod error;
mod processor;
mod rasterizer;

use envelope::Envelope;

/// Exit status for an unusable command line
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "ocr-text-extractor")]
#[command(about = "Extract text from an image or PDF and print it as JSON")]
#[command(version)]
pub struct Args {
    /// Image or PDF file to read
    #[arg(allow_hyphen_values = true)]
    pub path: Option<PathBuf>,

    /// Anything after the path is accepted and ignored
    #[arg(hide = true, allow_hyphen_values = true, trailing_var_arg = true)]
    pub ignored: Vec<String>,

    /// Directory holding the model caches
    #[arg(long, env = "OCR_CACHE_ROOT", default_value = ".")]
    pub cache_root: PathBuf,

    /// Disable hardware acceleration for single images (PDFs always run on CPU)
    #[arg(long, env = "OCR_CPU_ONLY")]
    pub cpu_only: bool,

    /// Text detection model name, looked up as <name>.rten in the cache
    #[arg(long, env = "OCR_DETECTION_MODEL", default_value = "text-detection")]
    pub detection_model: String,

    /// Text recognition model name, looked up as <name>.rten in the cache
    #[arg(long, env = "OCR_RECOGNITION_MODEL", default_value = "text-recognition")]
    pub recognition_model: String,

    /// Download missing models instead of failing
    #[arg(long, env = "OCR_ALLOW_DOWNLOAD")]
    pub allow_download: bool,

    /// Silence standard error while the engine runs
    #[arg(long, env = "OCR_QUIET_STDERR")]
    pub quiet_stderr: bool,

    /// Log engine model loading at info level
    #[arg(long, env = "OCR_VERBOSE")]
    pub verbose: bool,

    /// Resolution used when rendering PDF pages
    #[arg(long, env = "OCR_PDF_DPI", default_value = "200")]
    pub dpi: u32,

    /// pdftoppm executable used to render PDF pages
    #[arg(long, env = "OCR_PDFTOPPM", default_value = "pdftoppm")]
    pub pdftoppm: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                emit(&Envelope::error(e.to_string().trim()))?;
                return Ok(ExitCode::from(EXIT_USAGE));
            }
        },
    };

    // Logs go to stderr; stdout carries only the envelope
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if !args.ignored.is_empty() {
        tracing::warn!("Ignoring extra arguments: {:?}", args.ignored);
    }

    let config = config::Config::from(args);

    tracing::debug!("Starting ocr-text-extractor v{}", env!("CARGO_PKG_VERSION"));

    let (envelope, exit) = run(&config);
    emit(&envelope)?;

    Ok(exit)
}

fn run(config: &config::Config) -> (Envelope, ExitCode) {
    let layout = match environment::prepare(&config.cache_root) {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!("Cannot prepare cache directories: {}", e);
            return (
                Envelope::error(format!("Error preparing cache directories: {}", e)),
                ExitCode::SUCCESS,
            );
        }
    };

    let Some(input) = config.input.as_deref() else {
        return (
            Envelope::error("No file path provided"),
            ExitCode::from(EXIT_USAGE),
        );
    };

    let processor = processor::FileProcessor::new(
        engines::DefaultEngineBuilder,
        rasterizer::PdftoppmRasterizer::new(config.pdftoppm.clone(), config.dpi),
        config.engine_options(&layout),
        config.quiet_stderr,
    );

    let envelope = processor.process(input);
    tracing::info!("Finished {:?} (success: {})", input, envelope.is_success());

    (envelope, ExitCode::SUCCESS)
}

fn emit(envelope: &Envelope) -> anyhow::Result<()> {
    let json = envelope.to_json()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", json)?;
    stdout.flush()?;
    Ok(())
}
