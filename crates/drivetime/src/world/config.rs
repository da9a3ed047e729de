use serde::{Deserialize, Serialize};

use crate::{
    content::{DEFAULT_SERVICE_AREA_URL, GOOGLE_TILES_URL},
    dynamics::{CameraView, Orientation, DEFAULT_CLICK_PIXEL_TOLERANCE},
    helpers::{Geocoordinate, Geodetic},
    render::Color,
};

/// Where the photorealistic tileset root comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Source {
    Google {
        key: String,
        url: String,
    },
    CesiumIon {
        key: String,
        url: String,
    },
    SelfHosted {
        headers: Vec<(String, String)>,
        url: String,
    },
}

impl Default for Source {
    fn default() -> Self {
        Source::Google {
            key: String::new(),
            url: GOOGLE_TILES_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub api_key: String,
    pub service_url: String,
    /// Break values in minutes; empty lets the service pick its own.
    pub default_breaks: Vec<f64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            service_url: DEFAULT_SERVICE_AREA_URL.to_string(),
            default_breaks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: Source,
    pub routing: RoutingConfig,
    /// Facility queried once at startup.
    pub default_facility: Geocoordinate,
    pub camera: CameraView,
    pub marker_image: String,
    pub invert_classification_color: Color,
    /// Drop a click's result when a newer click happened while it was in flight.
    pub supersede_stale_queries: bool,
    pub click_pixel_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: Source::default(),
            routing: RoutingConfig::default(),
            default_facility: Geocoordinate::new(-122.39429, 37.78988), // San Francisco
            camera: CameraView {
                destination: Geodetic::from_degrees(-122.38329, 37.74015, 16_000.0),
                orientation: Orientation {
                    heading_deg: 0.0,
                    pitch_deg: -70.0,
                    roll_deg: 0.0,
                },
            },
            marker_image: "./marker.svg".to_string(),
            invert_classification_color: Color::new(0.4, 0.4, 0.4, 1.0),
            supersede_stale_queries: false,
            click_pixel_tolerance: DEFAULT_CLICK_PIXEL_TOLERANCE,
        }
    }
}
