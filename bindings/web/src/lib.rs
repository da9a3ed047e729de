#![cfg(target_arch = "wasm32")]

use drivetime::{App, Config, InputEvent, MouseButton, ServiceAreaClient};
use std::sync::Arc;
use tracing::{event, Level};
use wasm_bindgen::prelude::*;

fn setup_console_log() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if console_log::init_with_level(log::Level::Info).is_ok() {
            // Also show panic messages in console
            console_error_panic_hook::set_once();
            event!(Level::INFO, "Console logging initialized");
        }
    });
}

/// `undefined`/`null` means the built-in demo setup; anything else must be
/// a (possibly partial) config object.
fn config_from_js(config: JsValue) -> Result<Config, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(Config::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

#[wasm_bindgen]
pub struct DriveTime {
    app: App,
}

#[wasm_bindgen]
impl DriveTime {
    /// Scene only: no tileset and no startup query. See [`start`].
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue, width: f64, height: f64) -> Result<DriveTime, JsValue> {
        setup_console_log();
        let config = config_from_js(config)?;
        let client = drivetime::Client::new().map_err(to_js_error)?;
        let provider = Arc::new(ServiceAreaClient::new(client, &config.routing));
        Ok(DriveTime {
            app: App::new(config, (width, height), provider),
        })
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.app.input(InputEvent::MouseMoved(x, y));
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, button: u8) {
        if let Some(button) = mouse_button(button) {
            self.app.input(InputEvent::MouseButtonPressed(button));
        }
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, button: u8) {
        if let Some(button) = mouse_button(button) {
            self.app.input(InputEvent::MouseButtonReleased(button));
        }
    }

    pub fn tap(&mut self, x: f64, y: f64) {
        self.app.input(InputEvent::GestureTap { x, y });
    }

    pub fn focus(&mut self, focused: bool) {
        self.app.input(InputEvent::WindowFocused(focused));
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.app.resize(width, height);
    }

    #[wasm_bindgen(js_name = pendingQueries)]
    pub fn pending_queries(&self) -> usize {
        self.app.controller().pending_queries()
    }

    /// Marker, overlays and scene flags as a plain JS object.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.app.snapshot()).map_err(to_js_error)
    }
}

/// DOM `MouseEvent.button` numbering.
fn mouse_button(button: u8) -> Option<MouseButton> {
    match button {
        0 => Some(MouseButton::Left),
        1 => Some(MouseButton::Middle),
        2 => Some(MouseButton::Right),
        _ => None,
    }
}

/// Full startup: tileset, marker, camera and the default service-area query.
#[wasm_bindgen]
pub async fn start(config: JsValue, width: f64, height: f64) -> Result<DriveTime, JsValue> {
    setup_console_log();
    let config = config_from_js(config)?;

    let app = App::bootstrap(config, (width, height))
        .await
        .map_err(to_js_error)?;

    event!(Level::INFO, "drivetime started");
    Ok(DriveTime { app })
}
