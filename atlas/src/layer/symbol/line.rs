use serde::{Deserialize, Serialize};

use crate::layer::symbol::{Paint, SubStyle, Symbol};
use crate::Color;

/// Renders line strings as solid lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSymbol {
    /// Color of the line.
    pub color: Color,
    /// Width of the line in pixels.
    pub width: f64,
    /// Opacity from 0 to 1.
    pub opacity: f64,
}

impl Default for LineSymbol {
    fn default() -> Self {
        Self {
            color: Color::BLUE,
            width: 3.0,
            opacity: 0.8,
        }
    }
}

impl Symbol for LineSymbol {
    fn passes(&self) -> Vec<(SubStyle, Paint)> {
        vec![(
            SubStyle::Line,
            Paint::Line {
                color: self.color,
                width: self.width,
                opacity: self.opacity,
            },
        )]
    }

    fn click_target(&self) -> SubStyle {
        SubStyle::Line
    }
}
