use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use reel_slicer::{config::Config, pipeline::SlicingEngine, video::FfmpegEngine};

#[derive(Parser)]
#[command(
    name = "reel-slicer",
    version,
    about = "Cut a folder of videos into vertical short-form clips",
    long_about = "Reel-Slicer reframes every video in a folder to 9:16 around its most detailed region, then cuts it into 3-15 second clips ready for short-form platforms."
)]
struct Cli {
    /// Folder containing the source videos
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Folder the clips are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of videos processed at once (0 = one per CPU)
    #[arg(short = 'j', long)]
    parallel_jobs: Option<usize>,

    /// Plan the clips without encoding anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<reel_slicer::SlicerError>() {
            Some(slicer_error) => error!("{}", slicer_error.user_message()),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    info!("Starting Reel-Slicer v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(cwd) = std::env::current_dir() {
        info!("Current working directory: {}", cwd.display());
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(input) = cli.input {
        config.paths.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.paths.output_dir = output;
    }
    if let Some(jobs) = cli.parallel_jobs {
        config.batch.parallel_jobs = jobs;
    }
    if cli.dry_run {
        config.batch.dry_run = true;
    }

    if let Some(path) = cli.write_config {
        config.validate()?;
        config.save_to_file(&path)?;
        info!("Configuration written to {:?}", path);
        return Ok(());
    }

    info!("Input: {:?}", config.paths.input_dir);
    info!("Output: {:?}", config.paths.output_dir);

    let slicer = SlicingEngine::new(config, FfmpegEngine::new()?)?;
    let report = slicer.run()?;

    let failed = report.failed().count();
    if failed > 0 {
        warn!("{} of {} videos failed", failed, report.results.len());
    }
    info!("Done! {} clips saved to {:?}", report.clips_written(), slicer.config().paths.output_dir);
    Ok(())
}
