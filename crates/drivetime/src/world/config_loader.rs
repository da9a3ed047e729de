use crate::content::{ion_endpoint_url, GOOGLE_PHOTOREALISTIC_ION_ASSET};
use crate::world::{Config, Source};
use thiserror::Error;

pub const GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
pub const CESIUM_ACCESS_TOKEN: &str = "CESIUM_ACCESS_TOKEN";
pub const ARCGIS_API_KEY: &str = "ARCGIS_API_KEY";

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),
}

/// Reads `drivetime[.local].*` and `DRIVETIME__*` on top of the defaults, then
/// fills missing credentials from the usual environment variables.
pub fn load_config() -> Result<Config, LoadConfigError> {
    let _ = dotenvy::dotenv();

    let builder = config::Config::builder()
        .add_source(config::File::with_name("drivetime").required(false))
        .add_source(config::File::with_name("drivetime.local").required(false))
        .add_source(
            config::Environment::with_prefix("DRIVETIME")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("routing.default_breaks"),
        );

    let cfg = builder.build()?;
    log::debug!("Config sources loaded {:?}", cfg);

    let mut cfg: Config = cfg.try_deserialize()?;
    apply_env_credentials(&mut cfg, |name| std::env::var(name).ok());

    log::info!("Config loaded successfully");
    Ok(cfg)
}

/// Fills empty credentials through `lookup`. Without a Google key but with an
/// ion token, the tileset is streamed through Cesium ion instead.
pub fn apply_env_credentials<F>(cfg: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if cfg.routing.api_key.is_empty() {
        if let Some(key) = lookup(ARCGIS_API_KEY) {
            cfg.routing.api_key = key;
        }
    }

    let mut fallback = None;
    match &mut cfg.source {
        Source::Google { key, .. } if key.is_empty() => {
            if let Some(k) = lookup(GOOGLE_MAPS_API_KEY) {
                *key = k;
            } else if let Some(token) = lookup(CESIUM_ACCESS_TOKEN) {
                fallback = Some(Source::CesiumIon {
                    key: token,
                    url: ion_endpoint_url(GOOGLE_PHOTOREALISTIC_ION_ASSET),
                });
            }
        }
        Source::CesiumIon { key, .. } if key.is_empty() => {
            if let Some(token) = lookup(CESIUM_ACCESS_TOKEN) {
                *key = token;
            }
        }
        _ => {}
    }

    if let Some(source) = fallback {
        log::info!("No Google Maps key, using Cesium ion for the tileset");
        cfg.source = source;
    }
}
