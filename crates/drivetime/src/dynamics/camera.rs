use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    RwLock,
};

use crate::helpers::{hpr_to_forward_up, target_from_distance, Geodetic, WGS84_A};

const NEAR_MIN: f64 = 0.1; // Never go below this to avoid depth precision issues
const NEAR_MAX: f64 = 10_000.0; // Upper limit for near to avoid blowing out near plane

/// Vertical field of view the viewer opens with.
pub const DEFAULT_FOVY_DEG: f64 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    pub eye: Point3<f64>,
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    pub viewport_wh: (f64, f64),
}

/// Heading/pitch/roll in degrees, relative to the local east-north-up frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

impl Default for Orientation {
    fn default() -> Self {
        // straight down
        Self {
            heading_deg: 0.0,
            pitch_deg: -90.0,
            roll_deg: 0.0,
        }
    }
}

/// A camera framing: where the eye sits and where it looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub destination: Geodetic,
    #[serde(default)]
    pub orientation: Orientation,
}

#[derive(Debug, Clone)]
struct CameraUserPosition {
    position: PositionState,
    fovy: Deg<f64>,
    aspect: f64,
}

#[derive(Debug, Clone)]
struct CameraDerivedMatrices {
    proj_view: Matrix4<f64>,
    proj_view_inv: Matrix4<f64>,
    near: f64,
    far: f64,
}

impl Default for CameraDerivedMatrices {
    fn default() -> Self {
        CameraDerivedMatrices {
            proj_view: Matrix4::identity(),
            proj_view_inv: Matrix4::identity(),
            near: 0.0,
            far: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct Camera {
    generation: AtomicU64,
    dirty: AtomicBool,

    user_state: RwLock<CameraUserPosition>,
    derived_state: RwLock<CameraDerivedMatrices>,
}

impl Camera {
    fn new(start: CameraUserPosition) -> Self {
        Camera {
            generation: AtomicU64::new(1),
            dirty: AtomicBool::new(true),
            user_state: RwLock::new(start),
            derived_state: RwLock::new(CameraDerivedMatrices::default()),
        }
    }

    pub fn position(&self) -> PositionState {
        self.user_state
            .read()
            .expect("camera RwLock poisoned")
            .position
            .clone()
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        if let Ok(mut state) = self.user_state.write() {
            state.aspect = width / height;
            state.position.viewport_wh = (width, height);
        }
        self.dirty.store(true, Ordering::Relaxed);
    }

    pub fn set_position(&self, new_state: &PositionState) {
        let mut state = self.user_state.write().expect("camera RwLock poisoned");
        if state.position != *new_state {
            state.position = new_state.clone();
            self.dirty.store(true, Ordering::Relaxed);
        }
    }

    /// Places the eye at `view.destination` looking along its orientation.
    pub fn set_view(&self, view: &CameraView) {
        let eye = view.destination.to_ecef();
        let o = view.orientation;
        let (forward, up) = hpr_to_forward_up(&view.destination, o.heading_deg, o.pitch_deg, o.roll_deg);

        let viewport_wh = self.position().viewport_wh;
        self.set_position(&PositionState {
            eye,
            target: target_from_distance(eye, &forward, 1.0),
            up,
            viewport_wh,
        });
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Recomputes the derived matrices if anything changed. Returns whether it did.
    pub fn update(&self) -> bool {
        if !self.dirty.load(Ordering::Relaxed) {
            return false;
        }

        let user_state = self.user_state.read().expect("camera RwLock poisoned");
        let mut derived_state = self.derived_state.write().expect("camera RwLock poisoned");

        let d = user_state.position.eye.to_vec().magnitude();
        let altitude = (d - WGS84_A).max(1.0);

        // More aggressive scaling for space views
        let near_scale = if altitude > 50_000.0 { 0.5 } else { 0.25 };
        derived_state.near = (altitude * near_scale).clamp(NEAR_MIN, NEAR_MAX);
        // far enough to see past the horizon from any altitude
        derived_state.far = d + WGS84_A;

        let proj = cgmath::perspective(
            user_state.fovy,
            user_state.aspect,
            derived_state.near,
            derived_state.far,
        );
        let view = Matrix4::look_at_rh(
            user_state.position.eye,
            user_state.position.target,
            user_state.position.up,
        );

        derived_state.proj_view = proj * view;
        derived_state.proj_view_inv = derived_state
            .proj_view
            .invert()
            .unwrap_or(Matrix4::identity());

        self.generation.fetch_add(1, Ordering::Relaxed);
        self.dirty.store(false, Ordering::Relaxed);

        true
    }

    pub fn proj_view(&self) -> Matrix4<f64> {
        self.update();
        self.derived_state
            .read()
            .expect("camera RwLock poisoned")
            .proj_view
    }

    pub fn proj_view_inv(&self) -> Matrix4<f64> {
        self.update();
        self.derived_state
            .read()
            .expect("camera RwLock poisoned")
            .proj_view_inv
    }
}

pub fn init_camera(view: &CameraView, viewport_wh: (f64, f64)) -> Camera {
    let camera = Camera::new(CameraUserPosition {
        fovy: Deg(DEFAULT_FOVY_DEG),
        aspect: 1.0,
        position: PositionState {
            eye: view.destination.to_ecef(),
            target: Point3::origin(),
            up: Vector3::unit_z(),
            viewport_wh: (0.0, 0.0),
        },
    });
    camera.set_viewport(viewport_wh.0, viewport_wh.1);
    camera.set_view(view);
    camera.update();

    camera
}
