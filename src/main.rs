use anyhow::{Context, Result};
use clap::Parser;
use gonogo_core::{Color, Mode, Shape};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod settings;

use app::App;
use settings::Settings;

/// Go/no-go reaction time test.
#[derive(Debug, Parser)]
#[command(name = "gonogo", version, about)]
pub struct Cli {
    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub participant: Option<String>,

    /// icon or color
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Drawn at random from the shape set when omitted
    #[arg(long)]
    pub target_shape: Option<Shape>,

    /// Drawn at random from the color set when omitted
    #[arg(long)]
    pub target_color: Option<Color>,

    /// Targets per session, and the same number of distractors
    #[arg(short, long)]
    pub trials: Option<usize>,

    #[arg(long)]
    pub response_window_ms: Option<u64>,

    #[arg(long)]
    pub inter_trial_ms: Option<u64>,

    #[arg(long)]
    pub briefing_ms: Option<u64>,

    #[arg(long)]
    pub stimulus_size_px: Option<u32>,

    #[arg(long, value_delimiter = ',')]
    pub shapes: Option<Vec<Shape>>,

    #[arg(long, value_delimiter = ',')]
    pub colors: Option<Vec<Color>>,

    /// Makes the stimulus sequence reproducible
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// TrueType/OpenType font for on-screen text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let settings = Settings::load(&cli).context("failed to load settings")?;
    info!(
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        participant = %settings.participant,
        mode = %settings.mode,
        "starting go/no-go session"
    );

    App::new(settings)?.run()
}
