use cgmath::Point3;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};

use crate::content::Properties;
use crate::render::Color;

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightReference {
    None,
    ClampToGround,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalOrigin {
    Center,
    Bottom,
}

/// Screen-aligned image pinned to a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    pub image: String,
    pub vertical_origin: VerticalOrigin,
    pub height_reference: HeightReference,
    /// Depth testing is skipped closer than this; infinity means never tested.
    pub disable_depth_test_distance: f64,
    pub scale: f64,
}

impl Billboard {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            vertical_origin: VerticalOrigin::Center,
            height_reference: HeightReference::None,
            disable_depth_test_distance: 0.0,
            scale: 1.0,
        }
    }
}

/// Outer ring followed by its holes, positions in ECEF.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonHierarchy {
    pub positions: Vec<Point3<f64>>,
    pub holes: Vec<PolygonHierarchy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGraphics {
    pub hierarchy: PolygonHierarchy,
    pub height_reference: HeightReference,
    pub material: Color,
    pub outline: bool,
    pub outline_color: Color,
    pub outline_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: u64,
    pub name: Option<String>,
    pub show: bool,
    pub position: Option<Point3<f64>>,
    pub billboard: Option<Billboard>,
    pub polygon: Option<PolygonGraphics>,
    pub properties: Properties,
}

impl Entity {
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed),
            name,
            show: true,
            position: None,
            billboard: None,
            polygon: None,
            properties: Properties::new(),
        }
    }

    pub fn with_billboard(mut self, billboard: Billboard) -> Self {
        self.billboard = Some(billboard);
        self
    }

    pub fn with_polygon(mut self, polygon: PolygonGraphics) -> Self {
        self.polygon = Some(polygon);
        self
    }
}

pub type EntityRef = Arc<RwLock<Entity>>;

#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: Vec<EntityRef>,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `entity` and hands back the shared handle callers
    /// mutate it through.
    pub fn add(&mut self, entity: Entity) -> EntityRef {
        let entity = Arc::new(RwLock::new(entity));
        self.entities.push(Arc::clone(&entity));
        entity
    }

    pub fn remove(&mut self, entity: &EntityRef) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| !Arc::ptr_eq(e, entity));
        before != self.entities.len()
    }

    pub fn remove_all(&mut self) {
        self.entities.clear();
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn values(&self) -> &[EntityRef] {
        &self.entities
    }

    pub fn get_by_id(&self, id: u64) -> Option<EntityRef> {
        self.entities
            .iter()
            .find(|e| e.read().expect("Entity RwLock poisoned").id == id)
            .cloned()
    }
}
