use crate::builder::StimulusSetBuilder;
use crate::config::SessionConfig;
use crate::pool::RandomPool;
use crate::trial::{ActiveTrial, TrialTimestamps};
use gonogo_core::{
    Renderer, Reporter, SessionError, SessionLog, SessionSummary, Stimulus, TrialResult,
    TrialState,
};
use gonogo_timing::{Expiry, TimerHandle, TimerKind, TrialClock};
use rand::Rng;
use tracing::{debug, info, trace};

/// What happened to a response signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Accepted(TrialResult),
    /// Arrived outside a response window: before start, after the timeout
    /// fired, during the inter-trial delay, or after the session finished.
    Ignored,
}

/// Read-only snapshot of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    pub state: TrialState,
    /// Index of the stimulus being presented or the one just scored.
    pub cursor: usize,
    pub total: usize,
    pub completed: usize,
    pub current: Option<Stimulus>,
}

#[derive(Debug, Clone, Copy)]
enum EngineEvent {
    Response,
    Timer(Expiry),
}

/// Drives a session through the stimulus sequence.
///
/// The engine advances only on three events: a response signal
/// ([`on_response`](Self::on_response)), the response window expiring, and
/// the inter-trial delay expiring. Timer expiries are collected from the
/// clock by [`pump`](Self::pump); the owner calls it whenever the clock's
/// next deadline may have passed.
pub struct TrialEngine<C, R, P>
where
    C: TrialClock,
    R: Renderer,
    P: Reporter,
{
    config: SessionConfig,
    stimuli: Vec<Stimulus>,
    cursor: usize,
    state: TrialState,
    current: Option<ActiveTrial>,
    pending_delay: Option<TimerHandle>,
    log: SessionLog,
    summary: Option<SessionSummary>,
    clock: C,
    renderer: R,
    reporter: P,
}

impl<C, R, P> TrialEngine<C, R, P>
where
    C: TrialClock,
    R: Renderer,
    P: Reporter,
{
    /// Creates an idle engine over an already built sequence.
    pub fn new(
        config: SessionConfig,
        stimuli: Vec<Stimulus>,
        clock: C,
        renderer: R,
        reporter: P,
    ) -> Self {
        let log = SessionLog::with_capacity(stimuli.len());
        Self {
            config,
            stimuli,
            cursor: 0,
            state: TrialState::Idle,
            current: None,
            pending_delay: None,
            log,
            summary: None,
            clock,
            renderer,
            reporter,
        }
    }

    /// Validates the configuration, builds the stimulus set and returns an
    /// idle engine.
    pub fn prepare<G: Rng>(
        config: SessionConfig,
        pool: &mut RandomPool<G>,
        clock: C,
        renderer: R,
        reporter: P,
    ) -> Result<Self, SessionError> {
        let stimuli = StimulusSetBuilder::new(&config).build(pool)?;
        Ok(Self::new(config, stimuli, clock, renderer, reporter))
    }

    /// Idle → Presenting for the first stimulus.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != TrialState::Idle {
            return Err(SessionError::NotIdle);
        }
        self.config.validate()?;
        info!(
            mode = %self.config.mode,
            trials = self.stimuli.len(),
            "session started"
        );
        if self.stimuli.is_empty() {
            return self.finish();
        }
        self.present();
        Ok(())
    }

    /// Response signal from the input source, timestamped on receipt.
    ///
    /// Timers that are already due are dispatched first, so a response at or
    /// after the end of the response window is ignored.
    pub fn on_response(&mut self) -> Result<ResponseOutcome, SessionError> {
        self.pump()?;
        self.handle_event(EngineEvent::Response)
    }

    /// Dispatches every timer the clock reports as expired. Returns how many
    /// fired, including stale ones.
    pub fn pump(&mut self) -> Result<usize, SessionError> {
        let mut fired = 0;
        while let Some(expiry) = self.clock.next_expired() {
            fired += 1;
            self.handle_event(EngineEvent::Timer(expiry))?;
        }
        Ok(fired)
    }

    fn handle_event(&mut self, event: EngineEvent) -> Result<ResponseOutcome, SessionError> {
        match (self.state, event) {
            (TrialState::Presenting, EngineEvent::Response) => {
                let Some(trial) = self.current.as_mut() else {
                    return Ok(ResponseOutcome::Ignored);
                };
                // Cancel before touching anything else so the window cannot
                // also score this trial.
                self.clock.cancel(trial.timeout);
                trial.timestamps.response_ns = Some(self.clock.now());
                self.state = TrialState::Responded;
                let result = self.score();
                self.settle();
                Ok(ResponseOutcome::Accepted(result))
            }

            (state, EngineEvent::Response) => {
                debug!(?state, "response ignored");
                Ok(ResponseOutcome::Ignored)
            }

            (TrialState::Presenting, EngineEvent::Timer(expiry))
                if expiry.kind == TimerKind::ResponseWindow
                    && self
                        .current
                        .as_ref()
                        .is_some_and(|t| t.timeout == expiry.handle) =>
            {
                self.state = TrialState::TimedOut;
                self.score();
                self.settle();
                Ok(ResponseOutcome::Ignored)
            }

            (TrialState::Settling, EngineEvent::Timer(expiry))
                if expiry.kind == TimerKind::InterTrial
                    && self.pending_delay == Some(expiry.handle) =>
            {
                self.pending_delay = None;
                self.advance()?;
                Ok(ResponseOutcome::Ignored)
            }

            (state, EngineEvent::Timer(expiry)) => {
                trace!(?state, ?expiry, "stale timer ignored");
                Ok(ResponseOutcome::Ignored)
            }
        }
    }

    fn present(&mut self) {
        let stimulus = self.stimuli[self.cursor];
        self.renderer.draw(stimulus.shape, stimulus.color);
        let presented_ns = self.clock.now();
        let timeout = self.clock.arm_timeout(self.config.response_window());
        self.current = Some(ActiveTrial {
            index: self.cursor,
            stimulus,
            timestamps: TrialTimestamps {
                presented_ns,
                response_ns: None,
            },
            timeout,
        });
        self.state = TrialState::Presenting;
        debug!(
            trial = self.cursor,
            shape = %stimulus.shape,
            color = %stimulus.color,
            "stimulus presented"
        );
    }

    /// Scores the current trial from its actual attributes and appends the
    /// result. A response is an error on a non-matching stimulus; an omission
    /// is an error on a matching one.
    fn score(&mut self) -> TrialResult {
        let Some(trial) = self.current.take() else {
            unreachable!("scoring requires a presented trial");
        };
        let c = &self.config;
        let is_target = trial
            .stimulus
            .matches_target(c.mode, c.target_shape, c.target_color);
        let reaction_time_ms = trial.timestamps.reaction_time_ms();
        let result = TrialResult {
            shape: trial.stimulus.shape,
            color: trial.stimulus.color,
            reaction_time_ms,
            is_error: match reaction_time_ms {
                Some(_) => !is_target,
                None => is_target,
            },
        };
        self.log.push(result);
        info!(
            trial = trial.index,
            outcome = ?self.state,
            rt_ms = ?result.reaction_time_ms,
            error = result.is_error,
            "trial scored"
        );
        result
    }

    fn settle(&mut self) {
        self.renderer.clear();
        self.state = TrialState::Settling;
        self.pending_delay = Some(self.clock.arm_delay(self.config.inter_trial_delay()));
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        self.cursor += 1;
        if self.cursor >= self.stimuli.len() {
            self.finish()
        } else {
            self.present();
            Ok(())
        }
    }

    fn finish(&mut self) -> Result<(), SessionError> {
        self.state = TrialState::Finished;
        let summary = SessionSummary::from_log(&self.log);
        self.summary = Some(summary);
        info!(
            trials = self.log.len(),
            mean_rt_ms = summary.mean_correct_reaction_time_ms,
            errors = summary.total_errors,
            "session finished"
        );
        self.reporter.session_finished(&self.log, &summary)?;
        Ok(())
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state,
            cursor: self.cursor,
            total: self.stimuli.len(),
            completed: self.log.len(),
            current: self.current.as_ref().map(|t| t.stimulus),
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TrialState::Finished
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Available once the session has finished.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// Hands back the collaborators so a new session can reuse them.
    pub fn into_parts(self) -> (C, R, P) {
        (self.clock, self.renderer, self.reporter)
    }
}
