use crate::category::{Color, Shape};
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which stimulus dimension decides whether a response is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Respond to the target shape, ignore the color.
    Icon,
    /// Respond to the target color, ignore the shape.
    Color,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Icon => "icon",
            Mode::Color => "color",
        })
    }
}

impl FromStr for Mode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "icon" | "shape" => Ok(Mode::Icon),
            "color" | "colour" => Ok(Mode::Color),
            other => Err(ParseError::UnknownMode(other.to_string())),
        }
    }
}

/// Generation-time label. Scoring never reads it; see [`Stimulus::matches_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Target,
    NonTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub role: Role,
    pub shape: Shape,
    pub color: Color,
}

impl Stimulus {
    pub fn new(role: Role, shape: Shape, color: Color) -> Self {
        Self { role, shape, color }
    }

    /// True when the stimulus carries the target attribute on the dimension
    /// `mode` selects. The other dimension is ignored.
    pub fn matches_target(&self, mode: Mode, target_shape: Shape, target_color: Color) -> bool {
        match mode {
            Mode::Icon => self.shape == target_shape,
            Mode::Color => self.color == target_color,
        }
    }
}
