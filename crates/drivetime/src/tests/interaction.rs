#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use cgmath::{Point2, Point3};
    use serde_json::json;

    use crate::{
        content::{FeatureCollection, ServiceAreaError},
        dynamics::{CameraView, InputEvent, MouseButton, Orientation},
        helpers::{Geocoordinate, Geodetic, PlatformAwait},
        render::{BandStyle, HeightReference, VerticalOrigin},
        tests::fixtures::{screen_position_of, three_bands, MockProvider, Reply, VIEWPORT},
        world::{App, Config, CycleOutcome, MARKER_NAME},
    };

    // About a metre at these latitudes.
    const TOL_DEG: f64 = 1e-5;

    fn app_with(config: Config, provider: &Arc<MockProvider>) -> App {
        App::new(config, VIEWPORT, provider.clone())
    }

    fn marker_geodetic(app: &App) -> Option<Geodetic> {
        let marker = app.controller().marker().read().unwrap();
        marker.position.and_then(Geodetic::from_ecef)
    }

    fn close(a: Geocoordinate, b: Geocoordinate) -> bool {
        (a.longitude - b.longitude).abs() < TOL_DEG && (a.latitude - b.latitude).abs() < TOL_DEG
    }

    #[test]
    fn startup_scene() {
        let provider = Arc::new(MockProvider::default());
        let app = app_with(Config::default(), &provider);

        let scene = app.viewer().scene();
        assert!(scene.invert_classification);
        assert_eq!(scene.invert_classification_color.to_array(), [0.4, 0.4, 0.4, 1.0]);
        drop(scene);

        let marker = app.controller().marker().read().unwrap();
        assert_eq!(marker.name.as_deref(), Some(MARKER_NAME));
        assert!(marker.show);
        assert_eq!(marker.position, None);
        let billboard = marker.billboard.as_ref().expect("billboard");
        assert_eq!(billboard.image, "./marker.svg");
        assert_eq!(billboard.vertical_origin, VerticalOrigin::Bottom);
        assert_eq!(billboard.height_reference, HeightReference::ClampToGround);
        assert!(billboard.disable_depth_test_distance.is_infinite());
        assert_eq!(billboard.scale, 0.5);

        assert_eq!(app.viewer().entities().len(), 1);
        assert!(app.viewer().data_sources().is_empty());
        assert!(provider.calls().is_empty());
    }

    #[test]
    fn click_places_marker_then_renders_bands() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::default());
        let tx = provider.defer();
        let app = app_with(Config::default(), &provider);

        let pixel = screen_position_of(app.viewer(), facility);
        eprintln!("facility drawn at {pixel:?}");

        let cycle = app.controller().handle_click(pixel).expect("click hits the globe");

        // marker and scene are updated before the query settles
        let picked = marker_geodetic(&app).expect("marker position");
        assert!(close(picked.coordinate(), facility), "{picked:?}");
        assert!(app.controller().marker().read().unwrap().show);
        assert!(app.viewer().scene().invert_classification);
        assert!(app.viewer().data_sources().is_empty());
        assert_eq!(app.controller().pending_queries(), 1);

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(close(calls[0], facility), "{:?}", calls[0]);

        tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(cycle.platform_await(), CycleOutcome::Rendered(3));
        assert_eq!(app.controller().pending_queries(), 0);

        let snapshot = app.snapshot();
        assert_eq!(snapshot.overlays.len(), 3);
        for overlay in &snapshot.overlays {
            assert!(!overlay.outline);
            assert_eq!(overlay.fill, BandStyle::for_time_band(overlay.time_band).fill().to_array());
            assert_eq!(overlay.rings.len(), 1);
            assert_eq!(overlay.rings[0].len(), 5);
        }
        let bands: Vec<_> = snapshot.overlays.iter().map(|o| o.time_band).collect();
        assert_eq!(bands, vec![Some(0.0), Some(5.0), Some(10.0)]);
    }

    #[test]
    fn a_new_click_clears_the_previous_result() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([
            Reply::Ready(Ok(three_bands(facility))),
            Reply::Ready(Ok(three_bands(facility))),
        ]));
        let app = app_with(Config::default(), &provider);
        let pixel = screen_position_of(app.viewer(), facility);

        let first = app.controller().handle_click(pixel).expect("hit");
        assert_eq!(first.platform_await(), CycleOutcome::Rendered(3));
        assert_eq!(app.viewer().data_sources().len(), 1);

        let second = app.controller().handle_click(pixel).expect("hit");
        assert!(app.viewer().data_sources().is_empty());
        assert_eq!(second.platform_await(), CycleOutcome::Rendered(3));
        assert_eq!(app.viewer().data_sources().len(), 1);
    }

    #[test]
    fn click_into_the_sky_only_clears() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Ok(three_bands(facility)))]));
        let app = app_with(Config::default(), &provider);

        let pixel = screen_position_of(app.viewer(), facility);
        let cycle = app.controller().handle_click(pixel).expect("hit");
        cycle.platform_await();
        assert_eq!(app.viewer().data_sources().len(), 1);

        // look at the horizon so the top of the screen is sky
        app.viewer().camera().set_view(&CameraView {
            destination: Geodetic::from_degrees(-122.38329, 37.74015, 16_000.0),
            orientation: Orientation {
                heading_deg: 0.0,
                pitch_deg: 0.0,
                roll_deg: 0.0,
            },
        });

        let miss = app.controller().handle_click(Point2::new(VIEWPORT.0 / 2.0, 5.0));
        assert!(miss.is_none());

        assert!(app.viewer().data_sources().is_empty());
        assert!(!app.viewer().scene().invert_classification);
        assert!(!app.controller().marker().read().unwrap().show);
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(app.controller().pending_queries(), 0);
    }

    #[test]
    fn unconvertible_position_leaves_the_scene_cleared() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Ok(three_bands(facility)))]));
        let app = app_with(Config::default(), &provider);

        let cycle = app
            .controller()
            .handle_click(screen_position_of(app.viewer(), facility))
            .expect("hit");
        cycle.platform_await();
        let placed = app.controller().marker().read().unwrap().position;

        app.controller().clear_result();
        assert_eq!(app.controller().place_marker(Point3::new(0.0, 0.0, 0.0)), None);

        let marker = app.controller().marker().read().unwrap();
        assert!(!marker.show);
        assert_eq!(marker.position, placed);
        assert!(!app.viewer().scene().invert_classification);
        assert!(app.viewer().data_sources().is_empty());
        assert_eq!(provider.calls().len(), 1);
    }

    #[test]
    fn failed_query_keeps_marker_without_overlays() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Err(
            ServiceAreaError::Http(500),
        ))]));
        let app = app_with(Config::default(), &provider);

        let cycle = app
            .controller()
            .handle_click(screen_position_of(app.viewer(), facility))
            .expect("hit");

        assert_eq!(cycle.platform_await(), CycleOutcome::QueryFailed);
        assert!(app.viewer().data_sources().is_empty());
        assert!(app.controller().marker().read().unwrap().show);
        assert!(app.viewer().scene().invert_classification);
    }

    #[test]
    fn invalid_geometry_aborts_the_cycle() {
        let facility = Config::default().default_facility;
        let lines = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "FromBreak": 0 },
                "geometry": { "type": "LineString", "coordinates": [[-122.4, 37.7], [-122.3, 37.8]] }
            }]
        }))
        .unwrap();
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Ok(lines))]));
        let app = app_with(Config::default(), &provider);

        let cycle = app
            .controller()
            .handle_click(screen_position_of(app.viewer(), facility))
            .expect("hit");

        assert_eq!(cycle.platform_await(), CycleOutcome::ParseFailed);
        assert!(app.viewer().data_sources().is_empty());
    }

    #[test]
    fn stale_response_still_renders_by_default() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::default());
        let first_tx = provider.defer();
        let second_tx = provider.defer();
        let app = app_with(Config::default(), &provider);
        let pixel = screen_position_of(app.viewer(), facility);

        let first = app.controller().handle_click(pixel).expect("hit");
        let second = app.controller().handle_click(pixel).expect("hit");
        assert_eq!(app.controller().pending_queries(), 2);

        second_tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(second.platform_await(), CycleOutcome::Rendered(3));
        first_tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(first.platform_await(), CycleOutcome::Rendered(3));

        // both answers end up on screen
        assert_eq!(app.viewer().data_sources().len(), 2);
    }

    #[test]
    fn superseded_response_is_dropped() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::default());
        let first_tx = provider.defer();
        let second_tx = provider.defer();
        let config = Config {
            supersede_stale_queries: true,
            ..Config::default()
        };
        let app = app_with(config, &provider);
        let pixel = screen_position_of(app.viewer(), facility);

        let first = app.controller().handle_click(pixel).expect("hit");
        let second = app.controller().handle_click(pixel).expect("hit");

        second_tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(second.platform_await(), CycleOutcome::Rendered(3));
        first_tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(first.platform_await(), CycleOutcome::Superseded);

        assert_eq!(app.viewer().data_sources().len(), 1);
        assert_eq!(app.controller().pending_queries(), 0);
    }

    #[test]
    fn default_query_places_marker_once_settled() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::default());
        let tx = provider.defer();
        let app = app_with(Config::default(), &provider);

        let cycle = app.populate_default();
        assert_eq!(provider.calls(), vec![facility]);
        assert!(marker_geodetic(&app).is_none());

        tx.send(Ok(three_bands(facility))).unwrap();
        assert_eq!(cycle.platform_await(), CycleOutcome::Rendered(3));

        let marker = marker_geodetic(&app).expect("marker placed");
        assert!(close(marker.coordinate(), facility), "{marker:?}");
        assert_eq!(app.snapshot().overlays.len(), 3);
    }

    #[test]
    fn default_query_places_marker_even_on_failure() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Err(
            ServiceAreaError::MissingPolygons,
        ))]));
        let app = app_with(Config::default(), &provider);

        assert_eq!(app.populate_default().platform_await(), CycleOutcome::QueryFailed);

        let marker = marker_geodetic(&app).expect("marker placed");
        assert!(close(marker.coordinate(), facility));
        assert!(app.viewer().data_sources().is_empty());
    }

    #[test]
    fn left_click_input_runs_a_detached_cycle() {
        let facility = Config::default().default_facility;
        let provider = Arc::new(MockProvider::with_replies([Reply::Ready(Ok(three_bands(facility)))]));
        let mut app = app_with(Config::default(), &provider);
        let pixel = screen_position_of(app.viewer(), facility);

        app.input(InputEvent::MouseMoved(pixel.x, pixel.y));
        app.input(InputEvent::MouseButtonPressed(MouseButton::Left));
        app.input(InputEvent::MouseButtonReleased(MouseButton::Left));

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.viewer().data_sources().is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(app.viewer().data_sources().len(), 1);
        assert_eq!(provider.calls().len(), 1);
    }
}
