mod app;
pub use app::App;

mod config;
pub use config::{Config, RoutingConfig, Source};
mod config_loader;
pub use config_loader::{
    apply_env_credentials, load_config, LoadConfigError, ARCGIS_API_KEY, CESIUM_ACCESS_TOKEN,
    GOOGLE_MAPS_API_KEY,
};

mod interaction;
pub use interaction::{create_marker, CycleOutcome, InteractionController, MARKER_NAME};
