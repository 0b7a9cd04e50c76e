//! Layered settings: built-in defaults, optional TOML file, `GONOGO_*`
//! environment variables, then command-line flags.

use crate::Cli;
use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use gonogo_core::{Color, Mode, SessionError, Shape};
use gonogo_experiment::{RandomPool, SessionConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub participant: String,
    pub mode: Mode,
    pub target_shape: Option<Shape>,
    pub target_color: Option<Color>,
    pub trials: usize,
    pub response_window_ms: u64,
    pub inter_trial_ms: u64,
    pub briefing_ms: u64,
    pub stimulus_size_px: u32,
    pub shapes: Vec<Shape>,
    pub colors: Vec<Color>,
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub font_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            participant: String::new(),
            mode: session.mode,
            target_shape: None,
            target_color: None,
            trials: session.trials_per_class,
            response_window_ms: session.response_window_ms,
            inter_trial_ms: session.inter_trial_delay_ms,
            briefing_ms: 3000,
            stimulus_size_px: 200,
            shapes: session.shapes,
            colors: session.colors,
            seed: None,
            output_dir: PathBuf::from("results"),
            font_path: None,
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("GONOGO")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("shapes")
                .with_list_parse_key("colors"),
        );

        let mut settings: Settings = builder
            .build()
            .context("failed to read configuration sources")?
            .try_deserialize()
            .context("invalid configuration")?;
        settings.apply(cli);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&mut self, cli: &Cli) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut self.participant, &cli.participant);
        set(&mut self.mode, &cli.mode);
        set(&mut self.trials, &cli.trials);
        set(&mut self.response_window_ms, &cli.response_window_ms);
        set(&mut self.inter_trial_ms, &cli.inter_trial_ms);
        set(&mut self.briefing_ms, &cli.briefing_ms);
        set(&mut self.stimulus_size_px, &cli.stimulus_size_px);
        set(&mut self.shapes, &cli.shapes);
        set(&mut self.colors, &cli.colors);
        set(&mut self.output_dir, &cli.output_dir);
        if cli.target_shape.is_some() {
            self.target_shape = cli.target_shape;
        }
        if cli.target_color.is_some() {
            self.target_color = cli.target_color;
        }
        if cli.seed.is_some() {
            self.seed = cli.seed;
        }
        if cli.font.is_some() {
            self.font_path = cli.font.clone();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.participant.trim().is_empty() {
            bail!("a participant id is required (--participant or GONOGO_PARTICIPANT)");
        }
        if self.stimulus_size_px == 0 {
            bail!("stimulus size must be positive");
        }
        // Any drawn target lies in its domain, so the draw cannot change the outcome.
        self.session_config(&mut RandomPool::new(StdRng::seed_from_u64(0)))
            .context("invalid session parameters")?;
        Ok(())
    }

    /// Session parameters, drawing any unset target from its domain.
    pub fn session_config<R: Rng>(
        &self,
        pool: &mut RandomPool<R>,
    ) -> Result<SessionConfig, SessionError> {
        let target_shape = match self.target_shape {
            Some(shape) => shape,
            None => pool.sample(&self.shapes)?,
        };
        let target_color = match self.target_color {
            Some(color) => color,
            None => pool.sample(&self.colors)?,
        };
        let config = SessionConfig {
            mode: self.mode,
            target_shape,
            target_color,
            trials_per_class: self.trials,
            response_window_ms: self.response_window_ms,
            inter_trial_delay_ms: self.inter_trial_ms,
            shapes: self.shapes.clone(),
            colors: self.colors.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
