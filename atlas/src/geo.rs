//! Geographic value types: [`LngLat`] positions and [`BoundingBox`] extents.

use geojson::{FeatureCollection, Value};
use serde::{Deserialize, Serialize};

/// Geographic position in WGS84 degrees, longitude first as in GeoJSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in degrees.
    pub lng: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LngLat {
    /// Creates a new position.
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Converts a GeoJSON position. Returns `None` if it has less than two coordinates.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }
}

/// Axis-aligned extent in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl BoundingBox {
    /// Creates a new bounding box. Coordinates are normalized so that min is never greater than max.
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min: x_min.min(x_max),
            y_min: y_min.min(y_max),
            x_max: x_min.max(x_max),
            y_max: y_min.max(y_max),
        }
    }

    /// Minimum longitude.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Maximum longitude.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Minimum latitude.
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Maximum latitude.
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center of the box.
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Returns a box containing both `self` and the given point.
    pub fn extend(&self, point: LngLat) -> Self {
        Self {
            x_min: self.x_min.min(point.lng),
            y_min: self.y_min.min(point.lat),
            x_max: self.x_max.max(point.lng),
            y_max: self.y_max.max(point.lat),
        }
    }

    /// Value of the `bbox` query parameter of the feature endpoint: `xmin,ymin,xmax,ymax`.
    pub fn to_query(&self) -> String {
        format!("{},{},{},{}", self.x_min, self.y_min, self.x_max, self.y_max)
    }

    /// Extent of all geometries in the collection, or `None` if it has no coordinates.
    pub fn of_collection(collection: &FeatureCollection) -> Option<Self> {
        let mut bbox: Option<Self> = None;
        let mut add = |position: &Vec<f64>| {
            if let Some(point) = LngLat::from_position(position) {
                bbox = Some(match bbox {
                    Some(b) => b.extend(point),
                    None => Self::new(point.lng, point.lat, point.lng, point.lat),
                });
            }
        };

        for geometry in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
            visit_positions(&geometry.value, &mut add);
        }

        bbox
    }
}

fn visit_positions(value: &Value, f: &mut impl FnMut(&Vec<f64>)) {
    match value {
        Value::Point(p) => f(p),
        Value::MultiPoint(points) | Value::LineString(points) => points.iter().for_each(f),
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(f)
        }
        Value::MultiPolygon(polygons) => polygons.iter().flatten().flatten().for_each(f),
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                visit_positions(&geometry.value, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::tests::{line_collection, point_collection};

    #[test]
    fn new_normalizes_corners() {
        let bbox = BoundingBox::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(bbox.x_min(), -10.0);
        assert_eq!(bbox.y_max(), 5.0);
        assert_eq!(bbox.to_query(), "-10,-5,10,5");
    }

    #[test]
    fn collection_extent_covers_all_positions() {
        let collection = line_collection(&[&[[105.0, 20.0], [106.0, 21.5]], &[[104.5, 21.0]]]);
        let bbox = BoundingBox::of_collection(&collection).unwrap();

        assert_relative_eq!(bbox.x_min(), 104.5);
        assert_relative_eq!(bbox.x_max(), 106.0);
        assert_relative_eq!(bbox.y_min(), 20.0);
        assert_relative_eq!(bbox.y_max(), 21.5);
        assert_relative_eq!(bbox.center().lng, 105.25);
    }

    #[test]
    fn empty_collection_has_no_extent() {
        assert!(BoundingBox::of_collection(&point_collection(&[])).is_none());
    }
}
