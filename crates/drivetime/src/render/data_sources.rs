use std::sync::Arc;
use tracing::{event, Level};

use crate::content::{FeatureCollection, GeoJsonError, Geometry, Properties, Ring};
use crate::helpers::geodetic_to_ecef_z_up;
use crate::render::{
    Color, Entity, EntityCollection, HeightReference, PolygonGraphics, PolygonHierarchy,
};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Drape polygons on the surface instead of using their z values.
    pub clamp_to_ground: bool,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            clamp_to_ground: false,
            fill: Color::from_bytes(255, 255, 0, 100),
            stroke: Color::BLACK,
            stroke_width: 2.0,
        }
    }
}

/// Entities built from one GeoJSON document.
#[derive(Debug)]
pub struct GeoJsonDataSource {
    pub entities: EntityCollection,
}

impl GeoJsonDataSource {
    /// Builds one polygon entity per polygon (multipolygons contribute one
    /// per part). Any invalid geometry fails the whole load.
    pub fn load(
        collection: &FeatureCollection,
        options: &LoadOptions,
    ) -> Result<GeoJsonDataSource, GeoJsonError> {
        let mut entities = EntityCollection::new();

        for (index, feature) in collection.features.iter().enumerate() {
            let properties = feature.properties.clone().unwrap_or_default();

            let polygons: Vec<&Vec<Ring>> = match &feature.geometry {
                None => {
                    event!(Level::DEBUG, feature = index, "feature without geometry skipped");
                    continue;
                }
                Some(Geometry::Polygon { coordinates }) => vec![coordinates],
                Some(Geometry::MultiPolygon { coordinates }) => coordinates.iter().collect(),
                Some(Geometry::Other) => {
                    return Err(GeoJsonError::UnsupportedGeometry { feature: index })
                }
            };

            for rings in polygons {
                let hierarchy = build_hierarchy(index, rings, options.clamp_to_ground)?;
                let mut entity = Entity::new(entity_name(&properties)).with_polygon(PolygonGraphics {
                    hierarchy,
                    height_reference: if options.clamp_to_ground {
                        HeightReference::ClampToGround
                    } else {
                        HeightReference::None
                    },
                    material: options.fill,
                    outline: true,
                    outline_color: options.stroke,
                    outline_width: options.stroke_width,
                });
                entity.properties = properties.clone();
                entities.add(entity);
            }
        }

        Ok(GeoJsonDataSource { entities })
    }
}

fn entity_name(properties: &Properties) -> Option<String> {
    ["title", "name", "Name"]
        .iter()
        .find_map(|k| properties.get(*k).and_then(|v| v.as_str()))
        .map(str::to_string)
}

fn build_hierarchy(
    feature: usize,
    rings: &[Ring],
    clamp_to_ground: bool,
) -> Result<PolygonHierarchy, GeoJsonError> {
    let (outer, holes) = rings
        .split_first()
        .ok_or(GeoJsonError::InvalidRing { feature, len: 0 })?;

    Ok(PolygonHierarchy {
        positions: ring_positions(feature, outer, clamp_to_ground)?,
        holes: holes
            .iter()
            .map(|hole| -> Result<PolygonHierarchy, GeoJsonError> {
                Ok(PolygonHierarchy {
                    positions: ring_positions(feature, hole, clamp_to_ground)?,
                    holes: Vec::new(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn ring_positions(
    feature: usize,
    ring: &Ring,
    clamp_to_ground: bool,
) -> Result<Vec<cgmath::Point3<f64>>, GeoJsonError> {
    if ring.len() < 4 {
        return Err(GeoJsonError::InvalidRing {
            feature,
            len: ring.len(),
        });
    }

    ring.iter()
        .map(|position| {
            let [lon, lat, rest @ ..] = position.as_slice() else {
                return Err(GeoJsonError::InvalidPosition {
                    feature,
                    reason: format!("{} coordinates", position.len()),
                });
            };
            let height = if clamp_to_ground {
                0.0
            } else {
                rest.first().copied().unwrap_or(0.0)
            };
            if !(lon.is_finite() && lat.is_finite() && height.is_finite()) {
                return Err(GeoJsonError::InvalidPosition {
                    feature,
                    reason: "non-finite coordinate".to_string(),
                });
            }
            Ok(geodetic_to_ecef_z_up(*lat, *lon, height))
        })
        .collect()
}

/// The overlay sets currently on screen.
#[derive(Debug, Default)]
pub struct DataSourceCollection {
    sources: Vec<Arc<GeoJsonDataSource>>,
}

impl DataSourceCollection {
    pub fn add(&mut self, source: GeoJsonDataSource) -> Arc<GeoJsonDataSource> {
        let source = Arc::new(source);
        self.sources.push(Arc::clone(&source));
        source
    }

    pub fn remove_all(&mut self) {
        self.sources.clear();
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn values(&self) -> &[Arc<GeoJsonDataSource>] {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::Geodetic;
    use serde_json::json;

    fn collection(value: serde_json::Value) -> FeatureCollection {
        FeatureCollection::from_value(value).expect("collection")
    }

    #[test]
    fn clamped_polygons_sit_on_the_surface() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "Name": "Location 1 : 0 - 5" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-122.4, 37.7, 500.0], [-122.3, 37.7, 500.0], [-122.3, 37.8, 500.0], [-122.4, 37.7, 500.0]]]
                }
            }]
        }));

        let ds = GeoJsonDataSource::load(
            &fc,
            &LoadOptions {
                clamp_to_ground: true,
                ..Default::default()
            },
        )
        .expect("load");

        assert_eq!(ds.entities.len(), 1);
        let entity = ds.entities.values()[0].read().unwrap();
        assert_eq!(entity.name.as_deref(), Some("Location 1 : 0 - 5"));
        let polygon = entity.polygon.as_ref().expect("polygon");
        assert_eq!(polygon.height_reference, HeightReference::ClampToGround);
        for p in &polygon.hierarchy.positions {
            let g = Geodetic::from_ecef(*p).expect("geodetic");
            assert!(g.alt_m.abs() < 1e-3, "{g:?}");
        }
    }

    #[test]
    fn multipolygon_parts_become_separate_entities() {
        let ring = json!([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "MultiPolygon", "coordinates": [[ring], [ring, ring]] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }));

        let ds = GeoJsonDataSource::load(&fc, &LoadOptions::default()).expect("load");

        assert_eq!(ds.entities.len(), 2);
        let second = ds.entities.values()[1].read().unwrap();
        assert_eq!(second.polygon.as_ref().unwrap().hierarchy.holes.len(), 1);
    }

    #[test]
    fn invalid_geometry_fails_the_load() {
        let short_ring = collection(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] } }]
        }));
        let bad_position = collection(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[[0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] } }]
        }));
        let line = collection(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] } }]
        }));

        let options = LoadOptions::default();
        assert!(matches!(
            GeoJsonDataSource::load(&short_ring, &options),
            Err(GeoJsonError::InvalidRing { feature: 0, len: 3 })
        ));
        assert!(matches!(
            GeoJsonDataSource::load(&bad_position, &options),
            Err(GeoJsonError::InvalidPosition { .. })
        ));
        assert!(matches!(
            GeoJsonDataSource::load(&line, &options),
            Err(GeoJsonError::UnsupportedGeometry { feature: 0 })
        ));
    }
}
