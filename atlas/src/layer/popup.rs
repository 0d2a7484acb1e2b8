//! HTML popups shown when a feature is clicked.

use geojson::{Feature, Value};
use serde_json::Value as JsonValue;

use crate::geo::LngLat;
use crate::layer::dispatcher::GeometryFamily;

/// Properties that are shown in the popup header rather than in the table.
const HIDDEN_PROPERTIES: [&str; 2] = ["id", "name"];

/// Popup overlay anchored at a map position.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Anchor of the popup.
    pub position: LngLat,
    /// Popup content.
    pub html: String,
}

/// Builds the popup for a clicked feature of a layer.
///
/// Point features anchor the popup at the point itself, other geometries at the clicked position.
pub fn render_popup(
    family: GeometryFamily,
    layer_name: &str,
    feature: &Feature,
    click_position: LngLat,
) -> Popup {
    let properties = feature.properties.as_ref();
    let title = properties
        .and_then(|p| p.get("name"))
        .filter(|v| !v.is_null())
        .map(format_value)
        .unwrap_or_else(|| layer_name.to_string());

    let mut html = format!(
        "<div class=\"atlas-popup\"><h3>{} {}</h3><table>",
        family_icon(family),
        escape_html(&title)
    );
    for (key, value) in properties.into_iter().flatten() {
        if HIDDEN_PROPERTIES.contains(&key.as_str()) {
            continue;
        }

        html.push_str(&format!(
            "<tr><td>{}: {}</td></tr>",
            escape_html(&humanize(key)),
            escape_html(&format_value(value))
        ));
    }
    html.push_str("</table></div>");

    let position = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(position)) => LngLat::from_position(position).unwrap_or(click_position),
        _ => click_position,
    };

    Popup { position, html }
}

fn family_icon(family: GeometryFamily) -> &'static str {
    match family {
        GeometryFamily::Point => "📍",
        GeometryFamily::Line => "🛣️",
        GeometryFamily::Polygon => "🗺️",
    }
}

/// `area_km2` -> `Area km2`
fn humanize(key: &str) -> String {
    let words = key.split('_').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => key.to_string(),
    }
}

fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "N/A".to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}
