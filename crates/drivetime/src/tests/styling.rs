#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    use crate::{
        content::{FeatureCollection, FROM_BREAK},
        render::{
            render_overlays, style_overlays, BandStyle, Color, GeoJsonDataSource, HeightReference,
            LoadOptions, Viewer, SERVICE_AREA_ALPHA, SERVICE_AREA_HUE,
        },
        tests::fixtures::{three_bands, VIEWPORT},
        Geocoordinate,
    };

    fn band_collection(breaks: &[Option<f64>]) -> FeatureCollection {
        let features: Vec<_> = breaks
            .iter()
            .map(|b| {
                let mut properties = serde_json::Map::new();
                if let Some(b) = b {
                    properties.insert(FROM_BREAK.to_string(), json!(b));
                }
                json!({
                    "type": "Feature",
                    "properties": properties,
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]
                    }
                })
            })
            .collect();
        FeatureCollection::from_value(json!({ "type": "FeatureCollection", "features": features }))
            .expect("collection")
    }

    #[test]
    fn band_rule() {
        assert_eq!(BandStyle::for_time_band(Some(0.0)), BandStyle::Lightest);
        assert_eq!(BandStyle::for_time_band(Some(5.0)), BandStyle::Medium);
        assert_eq!(BandStyle::for_time_band(Some(10.0)), BandStyle::Darkest);
        assert_eq!(BandStyle::for_time_band(None), BandStyle::Darkest);

        assert_eq!(BandStyle::Lightest.fill(), Color::from_hsl(0.5833, 0.8, 0.9, 0.5));
        assert_eq!(BandStyle::Medium.fill(), Color::from_hsl(0.5833, 0.9, 0.7, 0.5));
        assert_eq!(BandStyle::Darkest.fill(), Color::from_hsl(0.5833, 1.0, 0.4, 0.5));
    }

    #[test]
    fn random_breaks_share_hue_and_alpha() {
        // Deterministic RNG (so failures reproduce)
        let mut rng = StdRng::seed_from_u64(42);

        let breaks: Vec<Option<f64>> = (0..200)
            .map(|_| match rng.gen_range(0..4) {
                0 => Some(0.0),
                1 => Some(5.0),
                2 => None,
                _ => Some(rng.gen_range(-100.0..100.0)),
            })
            .collect();

        let ds = GeoJsonDataSource::load(&band_collection(&breaks), &LoadOptions::default())
            .expect("load");
        style_overlays(&ds);

        assert_eq!(ds.entities.len(), breaks.len());
        for (entity, b) in ds.entities.values().iter().zip(&breaks) {
            let entity = entity.read().unwrap();
            let polygon = entity.polygon.as_ref().expect("polygon");

            assert!(!polygon.outline);
            assert_eq!(polygon.material, BandStyle::for_time_band(*b).fill());
            assert_eq!(polygon.material.alpha, SERVICE_AREA_ALPHA);

            let (hue, _, _) = polygon.material.to_hsl();
            assert!((hue - SERVICE_AREA_HUE).abs() < 1e-3, "hue {hue} for {b:?}");
        }
    }

    #[test]
    fn nearer_bands_are_lighter() {
        let (_, _, light) = BandStyle::Lightest.fill().to_hsl();
        let (_, _, medium) = BandStyle::Medium.fill().to_hsl();
        let (_, _, dark) = BandStyle::Darkest.fill().to_hsl();
        assert!(light > medium && medium > dark);
    }

    #[test]
    fn render_overlays_adds_one_clamped_source() {
        let viewer = Viewer::new(VIEWPORT);
        let facility = Geocoordinate::new(-122.39429, 37.78988);

        let count = render_overlays(&viewer, &three_bands(facility)).expect("render");

        assert_eq!(count, 3);
        let sources = viewer.data_sources();
        assert_eq!(sources.len(), 1);
        for entity in sources.values()[0].entities.values() {
            let entity = entity.read().unwrap();
            let polygon = entity.polygon.as_ref().unwrap();
            assert_eq!(polygon.height_reference, HeightReference::ClampToGround);
            assert!(!polygon.outline);
        }
    }

    #[test]
    fn render_overlays_adds_nothing_on_bad_geometry() {
        let viewer = Viewer::new(VIEWPORT);
        let bad = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] } },
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } }
            ]
        }))
        .unwrap();

        assert!(render_overlays(&viewer, &bad).is_err());
        assert!(viewer.data_sources().is_empty());
    }
}
