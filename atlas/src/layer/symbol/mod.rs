//! Symbols describe how the features of a layer are drawn by the map engine.
//!
//! A [`Symbol`] turns into one or more drawing passes, each becoming a separate render layer on the
//! map surface: a point layer is drawn with a single circle pass, a polygon layer with a fill pass
//! and an outline pass. The symbol also names the pass clicks are bound to.

mod line;
mod point;
mod polygon;

pub use line::LineSymbol;
pub use point::CircleSymbol;
pub use polygon::PolygonSymbol;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::layer::dispatcher::GeometryFamily;
use crate::Color;

/// Symbol is used to draw the features of a layer on the map.
pub trait Symbol {
    /// Drawing passes of the symbol, bottom to top.
    fn passes(&self) -> Vec<(SubStyle, Paint)>;

    /// Pass whose render layer receives click and hover events.
    fn click_target(&self) -> SubStyle;
}

/// Role of one drawing pass of a layer. Determines the suffix of the render layer id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SubStyle {
    /// Circles at point positions.
    Circle,
    /// Stroked lines.
    Line,
    /// Polygon interiors.
    Fill,
    /// Polygon outlines.
    Outline,
}

impl SubStyle {
    /// Suffix appended to the layer's base render id.
    pub fn suffix(&self) -> &'static str {
        match self {
            SubStyle::Circle | SubStyle::Line => "",
            SubStyle::Fill => "-fill",
            SubStyle::Outline => "-outline",
        }
    }
}

/// Declarative paint of a render layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    /// Filled circle with a stroke.
    Circle {
        /// Fill color.
        color: Color,
        /// Radius in pixels.
        radius: f64,
        /// Stroke color.
        stroke_color: Color,
        /// Stroke width in pixels.
        stroke_width: f64,
    },
    /// Solid line.
    Line {
        /// Line color.
        color: Color,
        /// Line width in pixels.
        width: f64,
        /// Line opacity from 0 to 1.
        opacity: f64,
    },
    /// Polygon fill.
    Fill {
        /// Fill color.
        color: Color,
        /// Fill opacity from 0 to 1.
        opacity: f64,
    },
    /// Atmospheric sky overlay shown with 3D terrain.
    Sky {
        /// Intensity of the sun light in the atmosphere.
        sun_intensity: f64,
    },
}

impl Paint {
    /// Render layer type as named in style documents.
    pub fn layer_type(&self) -> &'static str {
        match self {
            Paint::Circle { .. } => "circle",
            Paint::Line { .. } => "line",
            Paint::Fill { .. } => "fill",
            Paint::Sky { .. } => "sky",
        }
    }

    /// Paint properties in the style document format.
    pub fn to_style_json(&self) -> serde_json::Value {
        match *self {
            Paint::Circle {
                color,
                radius,
                stroke_color,
                stroke_width,
            } => json!({
                "circle-color": color.to_css(),
                "circle-radius": radius,
                "circle-stroke-color": stroke_color.to_css(),
                "circle-stroke-width": stroke_width,
            }),
            Paint::Line {
                color,
                width,
                opacity,
            } => json!({
                "line-color": color.to_css(),
                "line-width": width,
                "line-opacity": opacity,
            }),
            Paint::Fill { color, opacity } => json!({
                "fill-color": color.to_css(),
                "fill-opacity": opacity,
            }),
            Paint::Sky { sun_intensity } => json!({
                "sky-type": "atmosphere",
                "sky-atmosphere-sun": [0.0, 0.0],
                "sky-atmosphere-sun-intensity": sun_intensity,
            }),
        }
    }
}

/// Symbol of one geometry family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerSymbol {
    /// Symbol for point layers.
    Point(CircleSymbol),
    /// Symbol for line layers.
    Line(LineSymbol),
    /// Symbol for polygon layers.
    Polygon(PolygonSymbol),
}

impl Symbol for LayerSymbol {
    fn passes(&self) -> Vec<(SubStyle, Paint)> {
        match self {
            LayerSymbol::Point(s) => s.passes(),
            LayerSymbol::Line(s) => s.passes(),
            LayerSymbol::Polygon(s) => s.passes(),
        }
    }

    fn click_target(&self) -> SubStyle {
        match self {
            LayerSymbol::Point(s) => s.click_target(),
            LayerSymbol::Line(s) => s.click_target(),
            LayerSymbol::Polygon(s) => s.click_target(),
        }
    }
}

/// Symbols used for each geometry family.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSet {
    /// Symbol of point layers.
    pub point: CircleSymbol,
    /// Symbol of line layers.
    pub line: LineSymbol,
    /// Symbol of polygon layers.
    pub polygon: PolygonSymbol,
}

impl SymbolSet {
    /// Returns the symbol for the geometry family.
    pub fn for_family(&self, family: GeometryFamily) -> LayerSymbol {
        match family {
            GeometryFamily::Point => LayerSymbol::Point(self.point),
            GeometryFamily::Line => LayerSymbol::Line(self.line),
            GeometryFamily::Polygon => LayerSymbol::Polygon(self.polygon),
        }
    }
}
