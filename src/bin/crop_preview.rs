// Render the smart-crop decision for one video as a PNG: the sampled frame
// with the kept window outlined and everything outside it dimmed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reel_slicer::{
    config::Config,
    reframe::plan_reframe,
    video::{CropWindow, FfmpegEngine, Frame, MediaEngine, OpenClip},
};

#[derive(Parser)]
#[command(name = "crop-preview", version, about = "Preview the vertical crop chosen for a video")]
struct Cli {
    /// Source video
    video: PathBuf,

    /// PNG to write
    #[arg(short, long, default_value = "crop_preview.png")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timestamp to sample, overrides the configured one (seconds)
    #[arg(short, long)]
    at: Option<f64>,
}

const OUTLINE: [u8; 3] = [255, 64, 64];
const OUTLINE_WIDTH: u32 = 4;

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(at) = cli.at {
        config.reframe.sample_time = at;
    }

    let engine = FfmpegEngine::new()?;
    let opened = OpenClip::open(&engine, &cli.video)?;
    let clip = opened.clip();

    let plan = plan_reframe(&engine, clip, &config.reframe)?;
    let mut frame = engine.get_frame(clip, config.reframe.sample_time)?;

    match plan.crop {
        Some(window) => {
            info!(
                "{}x{} -> crop ({}, {})..({}, {}), output {}x{}",
                clip.width, clip.height, window.x1, window.y1, window.x2, window.y2, plan.output.0, plan.output.1
            );
            draw_crop(&mut frame, &window);
        }
        None => info!("{}x{} already has the target ratio, output {}x{}", clip.width, clip.height, plan.output.0, plan.output.1),
    }

    frame
        .save_png(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!("Preview saved to {:?}", cli.output);
    Ok(())
}

/// Dim pixels outside `window` and outline its border
fn draw_crop(frame: &mut Frame, window: &CropWindow) {
    let (x1, y1) = (window.x1, window.y1);
    let x2 = window.x2.min(frame.width());
    let y2 = window.y2.min(frame.height());

    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let inside = x >= x1 && x < x2 && y >= y1 && y < y2;
            if !inside {
                let [r, g, b] = frame.get_pixel(x, y);
                frame.set_pixel(x, y, [r / 3, g / 3, b / 3]);
                continue;
            }

            let on_border = x < x1 + OUTLINE_WIDTH
                || x + OUTLINE_WIDTH >= x2
                || y < y1 + OUTLINE_WIDTH
                || y + OUTLINE_WIDTH >= y2;
            if on_border {
                frame.set_pixel(x, y, OUTLINE);
            }
        }
    }
}
