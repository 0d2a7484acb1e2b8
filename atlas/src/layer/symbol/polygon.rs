use serde::{Deserialize, Serialize};

use crate::layer::symbol::{Paint, SubStyle, Symbol};
use crate::Color;

/// Renders polygons as a semi-transparent fill with a solid outline.
///
/// Clicks are bound to the fill pass only, so the outline does not produce a second popup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonSymbol {
    /// Color of the inner area of the polygon.
    pub fill_color: Color,
    /// Opacity of the inner area from 0 to 1.
    pub fill_opacity: f64,
    /// Color of the outline.
    pub outline_color: Color,
    /// Width of the outline in pixels.
    pub outline_width: f64,
}

impl Default for PolygonSymbol {
    fn default() -> Self {
        Self {
            fill_color: Color::BLUE,
            fill_opacity: 0.3,
            outline_color: Color::DARK_BLUE,
            outline_width: 2.0,
        }
    }
}

impl Symbol for PolygonSymbol {
    fn passes(&self) -> Vec<(SubStyle, Paint)> {
        vec![
            (
                SubStyle::Fill,
                Paint::Fill {
                    color: self.fill_color,
                    opacity: self.fill_opacity,
                },
            ),
            (
                SubStyle::Outline,
                Paint::Line {
                    color: self.outline_color,
                    width: self.outline_width,
                    opacity: 1.0,
                },
            ),
        ]
    }

    fn click_target(&self) -> SubStyle {
        SubStyle::Fill
    }
}
