mod content;
mod dynamics;
mod helpers;
mod render;
mod world;

#[cfg(test)]
mod tests;

pub use content::{
    parse_solve_response, Client, FeatureCollection, GeoJsonError, ServiceAreaClient, ServiceAreaError,
    ServiceAreaProvider,
};
pub use dynamics::{CameraView, InputEvent, MouseButton, Orientation, ScreenSpaceEventType};
pub use helpers::{
    boxed, enter_runtime, init_logging, spawn_detached, DriveTimeError, Geocoordinate, Geodetic,
    PlatformAwait, PlatformFuture,
};
pub use render::{BandStyle, Color, EntitySnapshot, OverlaySnapshot, ViewerSnapshot};
pub use world::{
    load_config, App, Config, CycleOutcome, InteractionController, LoadConfigError, RoutingConfig,
    Source,
};

use crate::world::apply_env_credentials;

/// Loaded configuration, or the built-in demo setup (plus any credentials in
/// the environment) when loading fails.
pub fn get_default_config() -> Config {
    load_config().unwrap_or_else(|e| {
        log::warn!("Falling back to default config: {e}");
        let mut cfg = Config::default();
        apply_env_credentials(&mut cfg, |name| std::env::var(name).ok());
        cfg
    })
}
