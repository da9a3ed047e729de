use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point2, Point3, Vector3, Vector4};

use crate::dynamics::PositionState;
use crate::helpers::{WGS84_A, WGS84_B};

#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    pub a: f64, // X radius
    pub b: f64, // Y radius
    pub c: f64, // Z radius
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Ellipsoid {
            a: WGS84_A,
            b: WGS84_A,
            c: WGS84_B,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub dir: Vector3<f64>,
}

impl Ray {
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.dir * t
    }

    /// Smallest non-negative `t` where the ray meets the ellipsoid surface.
    ///
    /// Ray: r(t) = O + t*D, t >= 0
    /// Ellipsoid: (x/a)^2 + (y/b)^2 + (z/c)^2 = 1
    pub fn intersect_ellipsoid(&self, e: Ellipsoid) -> Option<f64> {
        // Scale space so the ellipsoid becomes a unit sphere.
        let o = Vector3::new(self.origin.x / e.a, self.origin.y / e.b, self.origin.z / e.c);
        let d = Vector3::new(self.dir.x / e.a, self.dir.y / e.b, self.dir.z / e.c);

        let a = d.dot(d);
        let b = 2.0 * o.dot(d);
        let c = o.dot(o) - 1.0;

        // origin under the surface: the surface is right here
        if c <= 0.0 {
            return Some(0.0);
        }

        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_disc = disc.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);

        match (t0 >= 0.0, t1 >= 0.0) {
            (true, true) => Some(t0.min(t1)),
            (true, false) => Some(t0),
            (false, true) => Some(t1),
            // both behind the camera
            (false, false) => None,
        }
    }
}

/// Screen pixel (origin top-left) to a world-space ray leaving the eye.
pub fn screen_to_ray(
    screen_px: Point2<f64>,
    inv_view_proj: &Matrix4<f64>,
    cam: &PositionState,
) -> Option<Ray> {
    let (vw, vh) = cam.viewport_wh;
    if vw <= 0.0 || vh <= 0.0 {
        return None;
    }

    // Screen -> NDC (x,y in [-1,1], y flipped)
    let x_ndc = (screen_px.x / vw) * 2.0 - 1.0;
    let y_ndc = 1.0 - (screen_px.y / vh) * 2.0;

    let near_world = unproject(inv_view_proj, Vector4::new(x_ndc, y_ndc, -1.0, 1.0))?;
    let far_world = unproject(inv_view_proj, Vector4::new(x_ndc, y_ndc, 1.0, 1.0))?;

    // (far - near) is independent of slight eye mismatch
    let mut dir = far_world - near_world;
    if dir.magnitude2() == 0.0 {
        dir = far_world - cam.eye;
        if dir.magnitude2() == 0.0 {
            return None;
        }
    }

    Some(Ray {
        origin: cam.eye,
        dir: dir.normalize(),
    })
}

fn unproject(inv_view_proj: &Matrix4<f64>, clip: Vector4<f64>) -> Option<Point3<f64>> {
    let h = inv_view_proj * clip;
    if h.w == 0.0 {
        return None;
    }
    Some(Point3::from_vec(h.truncate() / h.w))
}

/// Resolves a screen pixel to the point where its view ray meets the
/// ellipsoid, lifted `elevation_m` along the surface normal. `None` when the
/// ray misses the globe (sky).
pub fn screen_to_world_on_ellipsoid(
    screen_px: Point2<f64>,
    inv_view_proj: &Matrix4<f64>,
    cam: &PositionState,
    ellipsoid: Ellipsoid,
    elevation_m: f64,
) -> Option<Point3<f64>> {
    let ray = screen_to_ray(screen_px, inv_view_proj, cam)?;
    let p = ray.at(ray.intersect_ellipsoid(ellipsoid)?);

    if elevation_m == 0.0 {
        return Some(p);
    }

    // For x^2/a^2 + y^2/b^2 + z^2/c^2 = 1 the (non-unit) normal at p is
    // (x/a^2, y/b^2, z/c^2).
    let n_raw = Vector3::new(
        p.x / (ellipsoid.a * ellipsoid.a),
        p.y / (ellipsoid.b * ellipsoid.b),
        p.z / (ellipsoid.c * ellipsoid.c),
    );
    let n = if n_raw.magnitude2() > 0.0 {
        n_raw.normalize()
    } else {
        Vector3::unit_z()
    };

    Some(p + n * elevation_m)
}

/// World position to screen pixel (origin top-left). `None` when the point is
/// behind the eye.
pub fn world_to_screen(
    world: Point3<f64>,
    viewport_wh: (f64, f64),
    proj_view: &Matrix4<f64>,
) -> Option<Point2<f64>> {
    let clip = proj_view * world.to_homogeneous();
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;

    Some(Point2::new(
        (ndc.x + 1.0) * 0.5 * viewport_wh.0,
        (1.0 - ndc.y) * 0.5 * viewport_wh.1,
    ))
}
