use tracing::{event, Level};

use crate::content::{from_break, FeatureCollection, GeoJsonError};
use crate::render::{Color, GeoJsonDataSource, LoadOptions, Viewer};

/// Teal-blue hue shared by every band.
pub const SERVICE_AREA_HUE: f32 = 0.5833;
pub const SERVICE_AREA_ALPHA: f32 = 0.5;

/// Fill variant for one drive-time band. Nearer bands are lighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandStyle {
    Lightest,
    Medium,
    Darkest,
}

impl BandStyle {
    /// `0` and `5` are the first two breaks; anything else, including a
    /// missing value, is drawn as the outermost band.
    pub fn for_time_band(from_break: Option<f64>) -> Self {
        match from_break {
            Some(b) if b == 0.0 => BandStyle::Lightest,
            Some(b) if b == 5.0 => BandStyle::Medium,
            _ => BandStyle::Darkest,
        }
    }

    pub fn fill(self) -> Color {
        let (saturation, lightness) = match self {
            BandStyle::Lightest => (0.8, 0.9),
            BandStyle::Medium => (0.9, 0.7),
            BandStyle::Darkest => (1.0, 0.4),
        };
        Color::from_hsl(SERVICE_AREA_HUE, saturation, lightness, SERVICE_AREA_ALPHA)
    }
}

/// Fill-only, band-colored polygons.
pub fn style_overlays(data_source: &GeoJsonDataSource) {
    for entity in data_source.entities.values() {
        let mut entity = entity.write().expect("Entity RwLock poisoned");
        let style = BandStyle::for_time_band(from_break(Some(&entity.properties)));
        if let Some(polygon) = entity.polygon.as_mut() {
            polygon.outline = false;
            polygon.material = style.fill();
        }
    }
}

/// Loads `collection` as ground-clamped polygons, styles them and adds them
/// to the viewer. Returns the number of overlays added.
pub fn render_overlays(viewer: &Viewer, collection: &FeatureCollection) -> Result<usize, GeoJsonError> {
    let options = LoadOptions {
        clamp_to_ground: true,
        ..Default::default()
    };

    let data_source = GeoJsonDataSource::load(collection, &options).map_err(|e| {
        event!(Level::WARN, error = %e, "Failed to load geojson");
        e
    })?;

    style_overlays(&data_source);

    let count = data_source.entities.len();
    viewer.add_data_source(data_source);
    event!(Level::DEBUG, count, "service area overlays added");

    Ok(count)
}
