use gonogo_core::{Color, Mode, SessionError, Shape};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable description of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: Mode,
    pub target_shape: Shape,
    pub target_color: Color,
    /// Number of targets, and separately of distractors.
    pub trials_per_class: usize,
    pub response_window_ms: u64,
    pub inter_trial_delay_ms: u64,
    /// Shape domain stimuli are drawn from.
    pub shapes: Vec<Shape>,
    /// Color domain stimuli are drawn from.
    pub colors: Vec<Color>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Icon,
            target_shape: Shape::Circle,
            target_color: Color::Red,
            trials_per_class: 10,
            response_window_ms: 2000,
            inter_trial_delay_ms: 500,
            shapes: Shape::ALL.to_vec(),
            colors: Color::ALL.to_vec(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.trials_per_class == 0 {
            return Err(invalid("trial count must be positive"));
        }
        if self.response_window_ms == 0 {
            return Err(invalid("response window must be positive"));
        }
        if self.shapes.is_empty() {
            return Err(invalid("shape set is empty"));
        }
        if self.colors.is_empty() {
            return Err(invalid("color set is empty"));
        }
        if has_repeats(&self.shapes) {
            return Err(invalid("shape set lists a shape more than once"));
        }
        if has_repeats(&self.colors) {
            return Err(invalid("color set lists a color more than once"));
        }
        match self.mode {
            Mode::Icon if !self.shapes.contains(&self.target_shape) => Err(invalid(format!(
                "target shape '{}' is not in the shape set",
                self.target_shape
            ))),
            Mode::Color if !self.colors.contains(&self.target_color) => Err(invalid(format!(
                "target color '{}' is not in the color set",
                self.target_color
            ))),
            _ => Ok(()),
        }
    }

    pub fn total_trials(&self) -> usize {
        self.trials_per_class * 2
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window_ms)
    }

    pub fn inter_trial_delay(&self) -> Duration {
        Duration::from_millis(self.inter_trial_delay_ms)
    }

    /// Goal message shown before the first stimulus.
    pub fn instruction(&self) -> String {
        match self.mode {
            Mode::Icon => format!(
                "Press SPACE when you see the target shape: {}. Ignore the color.",
                self.target_shape
            ),
            Mode::Color => format!(
                "Press SPACE when you see the target color: {}. Ignore the shape.",
                self.target_color
            ),
        }
    }
}

fn has_repeats<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, v)| items[..i].contains(v))
}

fn invalid(reason: impl Into<String>) -> SessionError {
    SessionError::InvalidConfig(reason.into())
}
