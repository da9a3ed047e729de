// Esri JSON shapes returned by the network analyst services, and their
// conversion to GeoJSON.
use serde::Deserialize;
use serde_json::Value;

use crate::content::{
    close_ring, ring_contains, ring_signed_area, Feature, FeatureCollection, Geometry, Properties,
    Ring,
};

pub const WGS84_WKID: i64 = 4326;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveServiceAreaResponse {
    #[serde(default)]
    pub sa_polygons: Option<FeatureSet>,
    #[serde(default)]
    pub error: Option<ArcGisError>,
    #[serde(default)]
    pub messages: Vec<NetworkMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArcGisError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkMessage {
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub spatial_reference: Option<SpatialReference>,
    #[serde(default)]
    pub features: Vec<EsriFeature>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    #[serde(default)]
    pub wkid: Option<i64>,
    #[serde(default)]
    pub latest_wkid: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EsriFeature {
    #[serde(default)]
    pub attributes: Properties,
    #[serde(default)]
    pub geometry: Option<EsriPolygon>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EsriPolygon {
    #[serde(default)]
    pub rings: Vec<Ring>,
}

impl SpatialReference {
    pub fn is_wgs84(&self) -> bool {
        self.wkid == Some(WGS84_WKID) || self.latest_wkid == Some(WGS84_WKID)
    }
}

impl FeatureSet {
    /// GeoJSON coordinates are longitude/latitude, so only a WGS84 feature set
    /// can be expressed without reprojection.
    pub fn is_wgs84(&self) -> bool {
        self.spatial_reference
            .as_ref()
            .is_some_and(SpatialReference::is_wgs84)
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection::new(self.features.iter().map(EsriFeature::to_geojson).collect())
    }
}

impl EsriFeature {
    pub fn to_geojson(&self) -> Feature {
        let geometry = self
            .geometry
            .as_ref()
            .and_then(|g| rings_to_geometry(&g.rings));

        let mut feature = Feature::new(geometry, self.attributes.clone());
        feature.id = ["OBJECTID", "ObjectID", "FID"]
            .iter()
            .find_map(|k| self.attributes.get(*k))
            .cloned()
            .filter(|v| !v.is_null());
        feature
    }
}

/// Esri polygons list every ring flat: clockwise rings are shells and
/// counter-clockwise rings are holes. GeoJSON wants each shell followed by
/// its holes, shells counter-clockwise and holes clockwise.
pub fn rings_to_geometry(rings: &[Ring]) -> Option<Geometry> {
    let mut shells: Vec<Vec<Ring>> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();

    for ring in rings {
        let ring = close_ring(ring.clone());
        if ring.len() < 4 {
            continue;
        }
        if ring_signed_area(&ring) > 0.0 {
            holes.push(ring);
        } else {
            shells.push(vec![reversed(ring)]);
        }
    }

    for hole in holes {
        let vertex = hole[0].clone();
        // innermost containing shell, so a hole inside an island lands on the island
        match shells
            .iter_mut()
            .filter(|polygon| ring_contains(&polygon[0], &vertex))
            .min_by(|a, b| {
                ring_signed_area(&a[0])
                    .abs()
                    .total_cmp(&ring_signed_area(&b[0]).abs())
            })
        {
            Some(polygon) => polygon.push(reversed(hole)),
            // a hole nothing contains is drawn as its own shell
            None => shells.push(vec![hole]),
        }
    }

    match shells.len() {
        0 => None,
        1 => shells.pop().map(|coordinates| Geometry::Polygon { coordinates }),
        _ => Some(Geometry::MultiPolygon {
            coordinates: shells,
        }),
    }
}

fn reversed(mut ring: Ring) -> Ring {
    ring.reverse();
    ring
}

/// Attribute used to tell time bands apart.
pub const FROM_BREAK: &str = "FromBreak";

pub fn from_break(properties: Option<&Properties>) -> Option<f64> {
    properties?.get(FROM_BREAK).and_then(Value::as_f64)
}
