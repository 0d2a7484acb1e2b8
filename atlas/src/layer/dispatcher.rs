//! Turns a loaded feature collection into sources, render layers and click handlers.
//!
//! The style of a layer is chosen by the geometry family of its first feature. Collections are
//! expected to hold one geometry family; a mixed collection is drawn with the style of its first
//! feature.
//!
//! | Family  | Render layers                          | Click target     |
//! |---------|----------------------------------------|------------------|
//! | Point   | `layer-{id}` (circle)                  | `layer-{id}`     |
//! | Line    | `layer-{id}` (line)                    | `layer-{id}`     |
//! | Polygon | `layer-{id}-fill`, `layer-{id}-outline`| `layer-{id}-fill`|
//! | other   | none                                   | none             |
//!
//! Every layer gets a source `layer-{id}-source`, even when nothing is drawn from it.

use std::sync::Arc;

use geojson::Value;
use log::info;

use crate::geo::BoundingBox;
use crate::layer::popup::render_popup;
use crate::layer::symbol::{Paint, SubStyle, Symbol, SymbolSet};
use crate::layer::{FeatureCollection, Layer, LayerId, LayerResourceRecord};
use crate::surface::{ClickHandler, FeatureClick, MapSurface};

/// Geometry family that decides how a layer is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    /// Point and MultiPoint.
    Point,
    /// LineString and MultiLineString.
    Line,
    /// Polygon and MultiPolygon.
    Polygon,
}

impl GeometryFamily {
    /// Family of a geometry. Geometry collections have none.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Point(_) | Value::MultiPoint(_) => Some(Self::Point),
            Value::LineString(_) | Value::MultiLineString(_) => Some(Self::Line),
            Value::Polygon(_) | Value::MultiPolygon(_) => Some(Self::Polygon),
            Value::GeometryCollection(_) => None,
        }
    }

    /// Family of the first feature of the collection.
    pub fn detect(collection: &FeatureCollection) -> Option<Self> {
        let geometry = collection.features.first()?.geometry.as_ref()?;
        Self::of(&geometry.value)
    }
}

/// Id of the source holding the layer's features.
pub fn source_id(layer_id: LayerId) -> String {
    format!("layer-{layer_id}-source")
}

/// Id of the render layer drawing the given pass of the layer.
pub fn render_layer_id(layer_id: LayerId, sub_style: SubStyle) -> String {
    format!("layer-{layer_id}{}", sub_style.suffix())
}

/// Every render layer id any family could create for the layer.
pub fn all_render_layer_ids(layer_id: LayerId) -> Vec<String> {
    let mut ids: Vec<String> = [
        SubStyle::Circle,
        SubStyle::Line,
        SubStyle::Fill,
        SubStyle::Outline,
    ]
    .into_iter()
    .map(|sub_style| render_layer_id(layer_id, sub_style))
    .collect();
    ids.dedup();

    ids
}

/// One render layer to create.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPass {
    /// Role of the pass.
    pub sub_style: SubStyle,
    /// Render layer id.
    pub render_layer_id: String,
    /// Paint of the render layer.
    pub paint: Paint,
}

/// Resources needed to draw a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    /// Detected geometry family. `None` for empty or unrecognized collections.
    pub family: Option<GeometryFamily>,
    /// Source id.
    pub source_id: String,
    /// Render layers, bottom to top.
    pub passes: Vec<PlannedPass>,
    /// Render layer receiving clicks.
    pub click_target: Option<String>,
}

/// Decides which resources draw the collection.
pub fn plan(layer_id: LayerId, collection: &FeatureCollection, symbols: &SymbolSet) -> RenderPlan {
    let family = GeometryFamily::detect(collection);
    let symbol = family.map(|family| symbols.for_family(family));

    let passes = symbol
        .map(|symbol| {
            symbol
                .passes()
                .into_iter()
                .map(|(sub_style, paint)| PlannedPass {
                    sub_style,
                    render_layer_id: render_layer_id(layer_id, sub_style),
                    paint,
                })
                .collect()
        })
        .unwrap_or_default();

    RenderPlan {
        family,
        source_id: source_id(layer_id),
        passes,
        click_target: symbol.map(|symbol| render_layer_id(layer_id, symbol.click_target())),
    }
}

/// Creates the resources of a layer on the surface and returns the record of everything created.
pub fn realize(
    layer: &Layer,
    collection: Arc<FeatureCollection>,
    symbols: &SymbolSet,
    surface: &mut dyn MapSurface,
) -> LayerResourceRecord {
    let plan = plan(layer.id, &collection, symbols);
    let mut record = LayerResourceRecord {
        source_id: plan.source_id.clone(),
        render_layers: Vec::with_capacity(plan.passes.len()),
        click_handlers: Vec::new(),
        family: plan.family,
        feature_count: collection.features.len(),
        bounds: BoundingBox::of_collection(&collection),
    };

    surface.upsert_source(&plan.source_id, collection);

    for pass in plan.passes {
        surface.add_render_layer(&pass.render_layer_id, &plan.source_id, pass.paint);
        record
            .render_layers
            .push((pass.sub_style, pass.render_layer_id));
    }

    if let (Some(family), Some(target)) = (plan.family, plan.click_target) {
        surface.register_click_handler(&target, popup_handler(family, layer.name.clone()));
        record.click_handlers.push(target);
    }

    match plan.family {
        Some(family) => info!(
            "Layer {} ({}) drawn as {family:?} with {} render layers",
            layer.id,
            layer.name,
            record.render_layers.len()
        ),
        None => info!(
            "Layer {} ({}) has no drawable features, only the source is added",
            layer.id, layer.name
        ),
    }

    record
}

fn popup_handler(family: GeometryFamily, layer_name: String) -> ClickHandler {
    Arc::new(move |click: &FeatureClick| {
        Some(render_popup(
            family,
            &layer_name,
            &click.feature,
            click.position,
        ))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::geo::LngLat;
    use crate::layer::LayerType;
    use crate::surface::{EngineEvent, MemoryEngine, Surface};
    use crate::tests::{collection, feature, line_collection, point_collection, polygon_collection};

    fn ids(plan: &RenderPlan) -> Vec<&str> {
        plan.passes
            .iter()
            .map(|pass| pass.render_layer_id.as_str())
            .collect()
    }

    #[test]
    fn point_plan_has_one_circle_layer() {
        let plan = plan(
            LayerId::new(7),
            &point_collection(&[[105.8, 21.0], [105.9, 21.1]]),
            &SymbolSet::default(),
        );

        assert_eq!(plan.family, Some(GeometryFamily::Point));
        assert_eq!(plan.source_id, "layer-7-source");
        assert_eq!(ids(&plan), vec!["layer-7"]);
        assert_eq!(plan.passes[0].paint.layer_type(), "circle");
        assert_eq!(plan.click_target.as_deref(), Some("layer-7"));
    }

    #[test]
    fn line_plan_has_one_line_layer() {
        let plan = plan(
            LayerId::new(4),
            &line_collection(&[&[[0.0, 0.0], [1.0, 1.0]]]),
            &SymbolSet::default(),
        );

        assert_eq!(ids(&plan), vec!["layer-4"]);
        assert_eq!(plan.passes[0].paint.layer_type(), "line");
    }

    #[test]
    fn polygon_plan_binds_click_to_fill() {
        let plan = plan(
            LayerId::new(3),
            &polygon_collection(&[&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            &SymbolSet::default(),
        );

        assert_eq!(plan.family, Some(GeometryFamily::Polygon));
        assert_eq!(ids(&plan), vec!["layer-3-fill", "layer-3-outline"]);
        assert_eq!(plan.click_target.as_deref(), Some("layer-3-fill"));
    }

    #[test]
    fn first_feature_decides_family() {
        let mixed = collection(vec![
            feature(
                Value::MultiLineString(vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]]]),
                json!({}),
            ),
            feature(Value::Point(vec![0.0, 0.0]), json!({})),
        ]);

        assert_eq!(GeometryFamily::detect(&mixed), Some(GeometryFamily::Line));
    }

    #[test]
    fn empty_or_unrecognized_collection_has_no_passes() {
        let plan_empty = plan(LayerId::new(1), &point_collection(&[]), &SymbolSet::default());
        assert_eq!(plan_empty.family, None);
        assert!(plan_empty.passes.is_empty());
        assert_eq!(plan_empty.click_target, None);

        let mut no_geometry = point_collection(&[[0.0, 0.0]]);
        no_geometry.features[0].geometry = None;
        assert_eq!(GeometryFamily::detect(&no_geometry), None);
    }

    #[test]
    fn derived_ids_cover_all_families() {
        assert_eq!(
            all_render_layer_ids(LayerId::new(9)),
            vec!["layer-9", "layer-9-fill", "layer-9-outline"]
        );
    }

    #[test]
    fn realize_records_everything_it_creates() {
        let engine = MemoryEngine::synchronous();
        let mut surface = Surface::new(engine.clone(), "light");
        let layer = Layer::new(3, "Provinces", LayerType::Polygon);
        let provinces = Arc::new(polygon_collection(&[&[
            [105.0, 20.0],
            [106.0, 20.0],
            [106.0, 21.0],
            [105.0, 20.0],
        ]]));

        let record = realize(&layer, provinces, &SymbolSet::default(), &mut surface);

        assert_eq!(record.source_id, "layer-3-source");
        assert_eq!(
            record.render_layer_ids().collect::<Vec<_>>(),
            vec!["layer-3-fill", "layer-3-outline"]
        );
        assert_eq!(record.click_handlers, vec!["layer-3-fill".to_string()]);
        assert_eq!(record.feature_count, 1);
        assert_eq!(engine.source_ids(), vec!["layer-3-source".to_string()]);
        assert_eq!(engine.layer_ids(), vec!["layer-3-fill", "layer-3-outline"]);
        assert!(surface.has_click_handler("layer-3-fill"));
        assert!(!surface.has_click_handler("layer-3-outline"));

        surface.handle_event(EngineEvent::Click {
            layer_id: "layer-3-fill".into(),
            feature: feature(Value::Point(vec![0.0, 0.0]), json!({"name": "Ha Noi"})),
            position: LngLat::new(105.5, 20.5),
        });
        let popups = engine.popups();
        assert_eq!(popups.len(), 1);
        assert!(popups[0].html.contains("🗺️ Ha Noi"));
    }
}
