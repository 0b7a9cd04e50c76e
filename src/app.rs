use crate::settings::Settings;
use anyhow::{Context, Result};
use ab_glyph::FontVec;
use gonogo_core::{SessionPhase, SessionSummary};
use gonogo_experiment::{CsvReporter, EngineStatus, RandomPool, ResponseOutcome, TrialEngine};
use gonogo_render::{SkiaRenderer, load_font};
use gonogo_timing::MonotonicClock;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

type Engine = TrialEngine<MonotonicClock, SkiaRenderer, CsvReporter>;

pub struct App {
    settings: Settings,
    pool: RandomPool<StdRng>,
    font: Option<FontVec>,

    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    engine: Option<Engine>,

    phase: SessionPhase,
    briefing_until: Option<Instant>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let font = settings
            .font_path
            .as_deref()
            .map(load_font)
            .transpose()
            .context("failed to load caption font")?;
        if font.is_none() {
            warn!("no font configured (--font), instructions and results will not be shown");
        }

        Ok(Self {
            settings,
            pool: RandomPool::new(rng),
            font,
            window: None,
            pixels: None,
            engine: None,
            phase: SessionPhase::default(),
            briefing_until: None,
            scale_factor: 1.0,
            refresh_rate: None,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!("Press SPACE on the target, ESC to quit");
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Go/No-Go")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale_factor = self.scale_factor,
            refresh_hz = ?self.refresh_rate,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);

        let mut renderer = SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            self.settings.stimulus_size_px,
        )?;
        renderer.set_font(self.font.take());
        self.start_session(MonotonicClock::new(), renderer)?;

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    /// Builds a fresh sequence and enters the briefing.
    fn start_session(&mut self, clock: MonotonicClock, mut renderer: SkiaRenderer) -> Result<()> {
        let config = self.settings.session_config(&mut self.pool)?;
        let reporter = CsvReporter::new(
            self.settings.participant.clone(),
            self.settings.output_dir.clone(),
            config.clone(),
        );
        let instruction = config.instruction();
        info!(%instruction, trials = config.total_trials(), "session prepared");

        renderer.set_caption(Some(instruction));
        self.engine = Some(TrialEngine::prepare(
            config,
            &mut self.pool,
            clock,
            renderer,
            reporter,
        )?);
        self.phase = SessionPhase::Briefing;
        self.briefing_until =
            Some(Instant::now() + Duration::from_millis(self.settings.briefing_ms));
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        let Some(engine) = self.engine.take() else {
            return Ok(());
        };
        let (_, mut renderer, _) = engine.into_parts();
        renderer.set_caption(None);
        renderer.set_banner(None);
        info!("restarting session");
        self.start_session(MonotonicClock::new(), renderer)
    }

    fn begin_testing(&mut self) -> Result<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        let reminder = engine.config().instruction();
        let renderer = engine.renderer_mut();
        renderer.set_caption(None);
        renderer.set_banner(Some(reminder));
        engine.start()?;
        self.phase = self.phase.next().unwrap_or(SessionPhase::Testing);
        self.briefing_until = None;
        debug!("briefing over, testing started");
        Ok(())
    }

    fn enter_debrief(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let summary = engine.summary().copied().unwrap_or_else(|| {
            SessionSummary::from_log(engine.log())
        });
        let stats = engine.clock().frame_stats();
        info!(
            samples = stats.samples,
            mean_ms = stats.average_frame_time_ns / 1e6,
            jitter_ms = stats.jitter_ns / 1e6,
            min_ms = stats.min_frame_time_ns / 1e6,
            max_ms = stats.max_frame_time_ns / 1e6,
            fps = stats.effective_fps,
            "frame timing"
        );
        engine.renderer_mut().set_banner(None);
        engine.renderer_mut().set_caption(Some(format!(
            "Average Reaction Time: {:.2} ms\nTotal Errors: {}\n\nR to restart, SPACE or ESC to quit",
            summary.mean_correct_reaction_time_ms, summary.total_errors
        )));
        self.phase = self.phase.next().unwrap_or(SessionPhase::Debrief);
    }

    /// Advances the briefing timer and the engine's timers.
    fn update(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::Briefing => {
                if self.briefing_until.is_some_and(|t| Instant::now() >= t) {
                    self.begin_testing()?;
                }
            }
            SessionPhase::Testing => {
                let Some(engine) = self.engine.as_mut() else {
                    return Ok(());
                };
                let pumped = engine.pump();
                if engine.is_finished() {
                    self.enter_debrief();
                }
                pumped?;
            }
            SessionPhase::Debrief => {}
        }
        Ok(())
    }

    fn snapshot(&self) -> (SessionPhase, Option<EngineStatus>) {
        (self.phase, self.engine.as_ref().map(Engine::status))
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(engine)) = (self.pixels.as_mut(), self.engine.as_mut()) else {
            return Ok(());
        };
        let start = Instant::now();
        engine.renderer_mut().render_frame(pixels.frame_mut())?;
        pixels.render()?;
        engine.clock_mut().record_frame(start.elapsed());
        Ok(())
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match (code, self.phase) {
            (KeyCode::Escape, _) | (KeyCode::Space, SessionPhase::Debrief) => {
                self.cleanup_and_exit(event_loop)
            }
            (KeyCode::Space, phase) if phase.allows_input() => {
                let Some(engine) = self.engine.as_mut() else {
                    return;
                };
                let outcome = engine.on_response();
                if engine.is_finished() {
                    self.enter_debrief();
                }
                match outcome {
                    Ok(ResponseOutcome::Accepted(result)) => debug!(?result, "response"),
                    Ok(ResponseOutcome::Ignored) => debug!("response outside a window"),
                    Err(e) => error!(error = %e, "response handling failed"),
                }
            }
            (KeyCode::KeyR, SessionPhase::Debrief) => {
                if let Err(e) = self.restart() {
                    error!(error = %e, "failed to restart session");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(engine) = &mut self.engine {
            engine
                .renderer_mut()
                .resize(new_size.width, new_size.height);
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn schedule_wakeup(&self, event_loop: &ActiveEventLoop) {
        let deadline = match self.phase {
            SessionPhase::Briefing => self.briefing_until,
            SessionPhase::Testing => self
                .engine
                .as_ref()
                .and_then(|e| e.clock().next_deadline_instant()),
            SessionPhase::Debrief => None,
        };
        event_loop.set_control_flow(match deadline {
            Some(at) => ControlFlow::WaitUntil(at),
            None => ControlFlow::Wait,
        });
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        if let Some(engine) = &self.engine {
            if !engine.is_finished() {
                let status = engine.status();
                warn!(
                    completed = status.completed,
                    total = status.total,
                    "session aborted, results not saved"
                );
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let before = self.snapshot();
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!(error = %e, "render failed");
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::Resized(size) => {
                self.handle_resize(size);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
        if self.snapshot() != before {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let before = self.snapshot();
        if let Err(e) = self.update() {
            error!(error = %e, "session update failed");
        }
        if self.snapshot() != before {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
        self.schedule_wakeup(event_loop);
    }
}
