use cgmath::{Point2, Point3};
use serde::Serialize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    content::{from_break, Tileset},
    dynamics::{
        init_camera, screen_to_world_on_ellipsoid, Camera, CameraView, Ellipsoid, Orientation,
    },
    helpers::Geodetic,
    render::{Color, DataSourceCollection, Entity, EntityCollection, EntityRef, GeoJsonDataSource},
};

/// Framing before anything else is configured: most of North America.
pub const HOME_VIEW: CameraView = CameraView {
    destination: Geodetic::from_degrees(-98.0, 39.0, 20_000_000.0),
    orientation: Orientation {
        heading_deg: 0.0,
        pitch_deg: -90.0,
        roll_deg: 0.0,
    },
};

#[derive(Debug)]
pub struct Scene {
    /// Dim everything that is not covered by a classification overlay.
    pub invert_classification: bool,
    pub invert_classification_color: Color,
    pub primitives: Vec<Tileset>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            invert_classification: false,
            invert_classification_color: Color::WHITE,
            primitives: Vec::new(),
        }
    }
}

/// What a renderer needs to draw a frame, and what the rest of the app
/// mutates. Shared behind an `Arc` between input handling and query tasks.
#[derive(Debug)]
pub struct Viewer {
    camera: Camera,
    scene: RwLock<Scene>,
    entities: RwLock<EntityCollection>,
    data_sources: RwLock<DataSourceCollection>,
}

impl Viewer {
    pub fn new(viewport_wh: (f64, f64)) -> Self {
        Self {
            camera: init_camera(&HOME_VIEW, viewport_wh),
            scene: RwLock::new(Scene::default()),
            entities: RwLock::new(EntityCollection::new()),
            data_sources: RwLock::new(DataSourceCollection::default()),
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.camera.set_viewport(width, height);
    }

    /// World position under a screen pixel, or `None` when nothing is hit.
    pub fn pick_position(&self, screen_px: Point2<f64>) -> Option<Point3<f64>> {
        screen_to_world_on_ellipsoid(
            screen_px,
            &self.camera.proj_view_inv(),
            &self.camera.position(),
            Ellipsoid::default(),
            0.0,
        )
    }

    pub fn scene(&self) -> RwLockReadGuard<'_, Scene> {
        self.scene.read().expect("Scene RwLock poisoned")
    }

    pub fn scene_mut(&self) -> RwLockWriteGuard<'_, Scene> {
        self.scene.write().expect("Scene RwLock poisoned")
    }

    pub fn set_invert_classification(&self, enabled: bool) {
        self.scene_mut().invert_classification = enabled;
    }

    pub fn add_primitive(&self, tileset: Tileset) {
        self.scene_mut().primitives.push(tileset);
    }

    pub fn add_entity(&self, entity: Entity) -> EntityRef {
        self.entities
            .write()
            .expect("EntityCollection RwLock poisoned")
            .add(entity)
    }

    pub fn entities(&self) -> RwLockReadGuard<'_, EntityCollection> {
        self.entities
            .read()
            .expect("EntityCollection RwLock poisoned")
    }

    pub fn add_data_source(&self, data_source: GeoJsonDataSource) {
        self.data_sources
            .write()
            .expect("DataSourceCollection RwLock poisoned")
            .add(data_source);
    }

    pub fn remove_all_data_sources(&self) {
        self.data_sources
            .write()
            .expect("DataSourceCollection RwLock poisoned")
            .remove_all();
    }

    pub fn data_sources(&self) -> RwLockReadGuard<'_, DataSourceCollection> {
        self.data_sources
            .read()
            .expect("DataSourceCollection RwLock poisoned")
    }

    /// Plain-data copy of the drawable state, in degrees.
    pub fn snapshot(&self) -> ViewerSnapshot {
        let scene = self.scene();

        let entities = self
            .entities()
            .values()
            .iter()
            .map(|e| {
                let e = e.read().expect("Entity RwLock poisoned");
                EntitySnapshot {
                    name: e.name.clone(),
                    show: e.show,
                    position: e.position.and_then(Geodetic::from_ecef),
                    image: e.billboard.as_ref().map(|b| b.image.clone()),
                }
            })
            .collect();

        let mut overlays = Vec::new();
        for (index, source) in self.data_sources().values().iter().enumerate() {
            for entity in source.entities.values() {
                let entity = entity.read().expect("Entity RwLock poisoned");
                let Some(polygon) = entity.polygon.as_ref() else {
                    continue;
                };
                let to_degrees = |ring: &[Point3<f64>]| -> Vec<[f64; 2]> {
                    ring.iter()
                        .filter_map(|p| Geodetic::from_ecef(*p))
                        .map(|g| [g.lon, g.lat])
                        .collect()
                };
                let mut rings = vec![to_degrees(&polygon.hierarchy.positions)];
                rings.extend(polygon.hierarchy.holes.iter().map(|h| to_degrees(&h.positions)));

                overlays.push(OverlaySnapshot {
                    data_source: index,
                    time_band: from_break(Some(&entity.properties)),
                    fill: polygon.material.to_array(),
                    outline: polygon.outline,
                    rings,
                });
            }
        }

        ViewerSnapshot {
            invert_classification: scene.invert_classification,
            invert_classification_color: scene.invert_classification_color.to_array(),
            tilesets: scene.primitives.iter().map(|t| t.url.clone()).collect(),
            entities,
            overlays,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub invert_classification: bool,
    pub invert_classification_color: [f32; 4],
    pub tilesets: Vec<String>,
    pub entities: Vec<EntitySnapshot>,
    pub overlays: Vec<OverlaySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub name: Option<String>,
    pub show: bool,
    pub position: Option<Geodetic>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub data_source: usize,
    pub time_band: Option<f64>,
    pub fill: [f32; 4],
    pub outline: bool,
    /// Outer ring then holes, `[lon, lat]` in degrees.
    pub rings: Vec<Vec<[f64; 2]>>,
}
