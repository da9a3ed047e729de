use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Position = Vec<f64>;
pub type Ring = Vec<Position>;
pub type Properties = Map<String, Value>;

#[derive(Debug, Error)]
pub enum GeoJsonError {
    #[error("unsupported geometry in feature {feature}")]
    UnsupportedGeometry { feature: usize },

    #[error("invalid position in feature {feature}: {reason}")]
    InvalidPosition { feature: usize, reason: String },

    #[error("ring with {len} positions in feature {feature}; at least 4 required")]
    InvalidRing { feature: usize, len: usize },

    #[error("malformed GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureCollectionType {
    FeatureCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: FeatureCollectionType,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

/// Only areal geometry is meaningful as a service-area overlay; anything else
/// lands in `Other` and is rejected when loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    #[serde(other)]
    Other,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        }
    }

    pub fn from_value(value: Value) -> Result<Self, GeoJsonError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Number of individual polygons, counting each multipolygon part.
    pub fn polygon_count(&self) -> usize {
        self.features
            .iter()
            .map(|f| match &f.geometry {
                Some(Geometry::Polygon { .. }) => 1,
                Some(Geometry::MultiPolygon { coordinates }) => coordinates.len(),
                _ => 0,
            })
            .sum()
    }
}

impl Feature {
    pub fn new(geometry: Option<Geometry>, properties: Properties) -> Self {
        Self {
            kind: FeatureType::Feature,
            id: None,
            geometry,
            properties: Some(properties),
        }
    }
}

/// Shoelace area in coordinate units. Positive for counter-clockwise rings.
pub fn ring_signed_area(ring: &[Position]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (a, b) in ring.iter().zip(ring.iter().cycle().skip(1)) {
        if a.len() < 2 || b.len() < 2 {
            continue;
        }
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum * 0.5
}

/// Even-odd point in ring test on the first two coordinates.
pub fn ring_contains(ring: &[Position], point: &[f64]) -> bool {
    if point.len() < 2 {
        return false;
    }
    let (px, py) = (point[0], point[1]);
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (&ring[i], &ring[j]);
        j = i;
        if a.len() < 2 || b.len() < 2 {
            continue;
        }
        let crosses = (a[1] > py) != (b[1] > py);
        if crosses && px < (b[0] - a[0]) * (py - a[1]) / (b[1] - a[1]) + a[0] {
            inside = !inside;
        }
    }
    inside
}

/// Appends the first position when the ring is open.
pub fn close_ring(mut ring: Ring) -> Ring {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = first.clone();
            ring.push(first);
        }
    }
    ring
}
