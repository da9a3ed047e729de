/// Installs the process-wide log sink. Safe to call more than once; later
/// calls are ignored.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // `try_init` also bridges `log` records into the subscriber.
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialized");
    }
}

#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if console_log::init_with_level(log::Level::Info).is_ok() {
            log::debug!("Console logging initialized");
        }
    });
}
