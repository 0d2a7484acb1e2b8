use serde::{Deserialize, Serialize};

use crate::layer::symbol::{Paint, SubStyle, Symbol};
use crate::Color;

/// Renders points as filled circles with a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleSymbol {
    /// Fill color of the circle.
    pub color: Color,
    /// Radius of the circle in pixels.
    pub radius: f64,
    /// Color of the stroke.
    pub stroke_color: Color,
    /// Width of the stroke in pixels.
    pub stroke_width: f64,
}

impl Default for CircleSymbol {
    fn default() -> Self {
        Self {
            color: Color::BLUE,
            radius: 8.0,
            stroke_color: Color::WHITE,
            stroke_width: 2.0,
        }
    }
}

impl CircleSymbol {
    /// Creates a new symbol with default white stroke.
    pub fn new(color: Color, radius: f64) -> Self {
        Self {
            color,
            radius,
            ..Default::default()
        }
    }
}

impl Symbol for CircleSymbol {
    fn passes(&self) -> Vec<(SubStyle, Paint)> {
        vec![(
            SubStyle::Circle,
            Paint::Circle {
                color: self.color,
                radius: self.radius,
                stroke_color: self.stroke_color,
                stroke_width: self.stroke_width,
            },
        )]
    }

    fn click_target(&self) -> SubStyle {
        SubStyle::Circle
    }
}
