//! The two closed stimulus domains.
//!
//! Both categories are flat sets: membership and uniform sampling are the only
//! operations the experiment needs, so neither type carries an ordering.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Arrow,
    Minus,
    #[serde(rename = "X", alias = "x")]
    Cross,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Arrow,
        Shape::Minus,
        Shape::Cross,
    ];

    /// Name used in instructions and exported records.
    pub fn name(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Arrow => "arrow",
            Shape::Minus => "minus",
            Shape::Cross => "X",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Shape {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Shape::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownShape(needle.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
}

impl Color {
    pub const ALL: [Color; 5] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Orange,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Color::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseError::UnknownColor(needle.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back_to_the_same_value() {
        for shape in Shape::ALL {
            assert_eq!(shape.name().parse::<Shape>().unwrap(), shape);
        }
        for color in Color::ALL {
            assert_eq!(color.to_string().parse::<Color>().unwrap(), color);
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("x".parse::<Shape>().unwrap(), Shape::Cross);
        assert_eq!(" Circle ".parse::<Shape>().unwrap(), Shape::Circle);
        assert_eq!("ORANGE".parse::<Color>().unwrap(), Color::Orange);
    }

    #[test]
    fn unknown_names_fail_fast() {
        assert_eq!(
            "hexagon".parse::<Shape>(),
            Err(ParseError::UnknownShape("hexagon".into()))
        );
        assert_eq!(
            "purple".parse::<Color>(),
            Err(ParseError::UnknownColor("purple".into()))
        );
    }

    #[test]
    fn serde_uses_exported_names() {
        assert_eq!(serde_json::to_string(&Shape::Cross).unwrap(), "\"X\"");
        assert_eq!(serde_json::to_string(&Color::Green).unwrap(), "\"green\"");
        let shape: Shape = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(shape, Shape::Cross);
    }
}
