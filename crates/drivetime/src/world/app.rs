use std::sync::Arc;
use tracing::{event, Level};

use crate::{
    content::{create_photorealistic_tileset, Client, ServiceAreaClient, ServiceAreaProvider},
    dynamics::{InputEvent, ScreenSpaceEvent, ScreenSpaceEventHandler, ScreenSpaceEventType},
    helpers::{boxed, spawn_detached, DriveTimeError, PlatformFuture},
    render::{Viewer, ViewerSnapshot},
    world::{Config, CycleOutcome, InteractionController},
};

/// Application context: the viewer, the click controller and the input
/// handler that feeds it.
pub struct App {
    config: Config,
    viewer: Arc<Viewer>,
    controller: Arc<InteractionController>,
    input: ScreenSpaceEventHandler,
}

impl App {
    /// Builds the scene without touching the network.
    pub fn new(config: Config, viewport_wh: (f64, f64), provider: Arc<dyn ServiceAreaProvider>) -> Self {
        let viewer = Arc::new(Viewer::new(viewport_wh));

        let controller = Arc::new(InteractionController::new(
            Arc::clone(&viewer),
            provider,
            &config.marker_image,
            config.supersede_stale_queries,
        ));

        let mut input = ScreenSpaceEventHandler::new(config.click_pixel_tolerance);
        let on_click = Arc::clone(&controller);
        input.set_input_action(
            ScreenSpaceEventType::LeftClick,
            Box::new(move |ev| on_click.on_click(ev.position)),
        );

        {
            let mut scene = viewer.scene_mut();
            scene.invert_classification = true;
            scene.invert_classification_color = config.invert_classification_color;
        }

        viewer.camera().set_view(&config.camera);

        Self {
            config,
            viewer,
            controller,
            input,
        }
    }

    /// Builds the app against the live routing service, loads the tileset and
    /// starts the query for the default facility.
    pub async fn bootstrap(config: Config, viewport_wh: (f64, f64)) -> Result<App, DriveTimeError> {
        let client = Client::new()?;
        let provider = Arc::new(ServiceAreaClient::new(client.clone(), &config.routing));

        let app = App::new(config, viewport_wh, provider);
        app.load_tileset(&client).await;

        let default_query = app.populate_default();
        spawn_detached(async move {
            default_query.await;
        });

        Ok(app)
    }

    /// Adds the photorealistic tileset to the scene. A failure is logged and
    /// leaves the globe without tiles.
    pub async fn load_tileset(&self, client: &Client) -> bool {
        match create_photorealistic_tileset(client, &self.config.source).await {
            Ok(tileset) => {
                event!(Level::INFO, url = %tileset.url, "tileset loaded");
                self.viewer.add_primitive(tileset);
                true
            }
            Err(e) => {
                event!(Level::ERROR, error = %e, "Failed to load tileset");
                false
            }
        }
    }

    /// Queries the configured default facility. The marker is moved there once
    /// the query settles, unless a click took over in the meantime.
    pub fn populate_default(&self) -> PlatformFuture<'static, CycleOutcome> {
        let facility = self.config.default_facility;
        let cycle = self.controller.query_facility(facility);
        let marker = Arc::clone(self.controller.marker());

        boxed(async move {
            let outcome = cycle.await;
            if outcome != CycleOutcome::Superseded {
                marker.write().expect("Entity RwLock poisoned").position = Some(facility.to_ecef());
            }
            outcome
        })
    }

    pub fn input(&mut self, event: InputEvent) -> Vec<ScreenSpaceEvent> {
        self.input.handle(event)
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.viewer.resize(width, height);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewer(&self) -> &Arc<Viewer> {
        &self.viewer
    }

    pub fn controller(&self) -> &Arc<InteractionController> {
        &self.controller
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.viewer.snapshot()
    }
}
