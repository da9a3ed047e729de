use cgmath::{InnerSpace, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// WGS84 radii (meters)
pub const WGS84_A: f64 = 6_378_137.0; // equatorial
pub const WGS84_B: f64 = 6_356_752.314245; // polar
/// First eccentricity squared.
pub const WGS84_E2: f64 = 6.69437999014e-3;

/// A geodetic position in degrees and meters above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt_m: f64,
}

/// Longitude/latitude pair in degrees, the unit a routing service is queried with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geocoordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Geodetic {
    pub const fn from_degrees(lon: f64, lat: f64, alt_m: f64) -> Self {
        Self { lon, lat, alt_m }
    }

    pub fn to_ecef(&self) -> Point3<f64> {
        geodetic_to_ecef_z_up(self.lat, self.lon, self.alt_m)
    }

    /// Returns `None` for points too close to the earth's center to have a
    /// meaningful surface projection.
    pub fn from_ecef(p: Point3<f64>) -> Option<Self> {
        ecef_to_geodetic(p)
    }

    pub fn coordinate(&self) -> Geocoordinate {
        Geocoordinate {
            longitude: self.lon,
            latitude: self.lat,
        }
    }
}

impl Geocoordinate {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Position on the ellipsoid surface.
    pub fn to_ecef(&self) -> Point3<f64> {
        geodetic_to_ecef_z_up(self.latitude, self.longitude, 0.0)
    }
}

/// Converts geodetic coordinates (lat, lon, elevation) to standard Z-up ECEF coordinates.
/// Assumes WGS84 ellipsoid.
/// - `lat_deg` and `lon_deg` are in degrees
/// - `elevation_m` is in meters above the ellipsoid
pub fn geodetic_to_ecef_z_up(lat_deg: f64, lon_deg: f64, elevation_m: f64) -> Point3<f64> {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let sin_lon = lon.sin();
    let cos_lon = lon.cos();

    // Prime vertical radius of curvature
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    let x = (n + elevation_m) * cos_lat * cos_lon;
    let y = (n + elevation_m) * cos_lat * sin_lon;
    let z = (n * (1.0 - WGS84_E2) + elevation_m) * sin_lat;

    Point3::new(x, y, z)
}

/// Inverse of [`geodetic_to_ecef_z_up`], iterating on latitude until it settles.
pub fn ecef_to_geodetic(p: Point3<f64>) -> Option<Geodetic> {
    const MAX_ITERATIONS: usize = 10;
    const EPSILON: f64 = 1e-12;

    let (x, y, z) = (p.x, p.y, p.z);
    if !(x.is_finite() && y.is_finite() && z.is_finite()) {
        return None;
    }

    let horizontal = (x * x + y * y).sqrt();
    if (horizontal * horizontal + z * z).sqrt() < 1.0 {
        return None;
    }

    let lon = y.atan2(x);
    let mut lat = z.atan2(horizontal * (1.0 - WGS84_E2));

    for _ in 0..MAX_ITERATIONS {
        let n = prime_vertical_radius(lat);
        let h = height_above_ellipsoid(horizontal, z, lat, n);
        let next = z.atan2(horizontal * (1.0 - WGS84_E2 * n / (n + h)));
        let converged = (next - lat).abs() < EPSILON;
        lat = next;
        if converged {
            break;
        }
    }

    let n = prime_vertical_radius(lat);
    let alt_m = height_above_ellipsoid(horizontal, z, lat, n);

    Some(Geodetic {
        lon: lon.to_degrees(),
        lat: lat.to_degrees(),
        alt_m,
    })
}

fn prime_vertical_radius(lat: f64) -> f64 {
    let s = lat.sin();
    WGS84_A / (1.0 - WGS84_E2 * s * s).sqrt()
}

fn height_above_ellipsoid(horizontal: f64, z: f64, lat: f64, n: f64) -> f64 {
    let cos_lat = lat.cos();
    // near the poles the horizontal form loses precision
    if cos_lat.abs() > 1e-3 {
        horizontal / cos_lat - n
    } else {
        z / lat.sin() - n * (1.0 - WGS84_E2)
    }
}

/// Local east/north/up unit vectors at a geodetic position, in ECEF.
pub fn enu_basis(lat_deg: f64, lon_deg: f64) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();

    let east = Vector3::new(-lon.sin(), lon.cos(), 0.0);
    let north = Vector3::new(
        -lat.sin() * lon.cos(),
        -lat.sin() * lon.sin(),
        lat.cos(),
    );
    let up = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());

    (east, north, up)
}

/// Heading/pitch/roll (degrees) in the local frame at `at` to a forward and up
/// vector in ECEF. Heading is clockwise from north, negative pitch looks down,
/// roll turns the up vector about forward.
pub fn hpr_to_forward_up(
    at: &Geodetic,
    heading: f64,
    pitch: f64,
    roll: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let (east, north, up) = enu_basis(at.lat, at.lon);
    let (h, p, r) = (heading.to_radians(), pitch.to_radians(), roll.to_radians());

    let horizontal = east * h.sin() + north * h.cos();
    let forward = (horizontal * p.cos() + up * p.sin()).normalize();
    let cam_up = (up * p.cos() - horizontal * p.sin()).normalize();

    if r == 0.0 {
        return (forward, cam_up);
    }

    let right = forward.cross(cam_up).normalize();
    let rolled = (cam_up * r.cos() + right * r.sin()).normalize();

    (forward, rolled)
}

pub fn target_from_distance(eye: Point3<f64>, forward: &Vector3<f64>, dist: f64) -> Point3<f64> {
    eye + forward * dist
}
