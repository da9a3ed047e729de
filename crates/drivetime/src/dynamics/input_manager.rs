use cgmath::{MetricSpace, Point2};
use std::collections::HashMap;
use tracing::{event, Level};

/// Cursor travel (pixels) between press and release still counted as a click.
pub const DEFAULT_CLICK_PIXEL_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Count = 3,
}

/// Raw pointer input, as forwarded by a front-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseMoved(f64, f64),
    MouseButtonPressed(MouseButton),
    MouseButtonReleased(MouseButton),
    GestureTap { x: f64, y: f64 },
    WindowFocused(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenSpaceEventType {
    LeftDown,
    LeftUp,
    LeftClick,
    RightClick,
    MiddleClick,
    MouseMove,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSpaceEvent {
    pub kind: ScreenSpaceEventType,
    pub position: Point2<f64>,
}

#[cfg(not(target_arch = "wasm32"))]
pub type InputAction = Box<dyn Fn(&ScreenSpaceEvent) + Send + Sync>;
#[cfg(target_arch = "wasm32")]
pub type InputAction = Box<dyn Fn(&ScreenSpaceEvent)>;

/// Turns raw pointer input into screen-space events and hands each one to the
/// single action registered for its type.
pub struct ScreenSpaceEventHandler {
    mouse_button_states: [bool; MouseButton::Count as usize],
    position_on_press: [Point2<f64>; MouseButton::Count as usize],
    mouse_position: Point2<f64>,
    click_pixel_tolerance: f64,

    actions: HashMap<ScreenSpaceEventType, InputAction>,
}

impl ScreenSpaceEventHandler {
    pub fn new(click_pixel_tolerance: f64) -> Self {
        ScreenSpaceEventHandler {
            mouse_button_states: [false; MouseButton::Count as usize],
            position_on_press: [Point2::new(0.0, 0.0); MouseButton::Count as usize],
            mouse_position: Point2::new(0.0, 0.0),
            click_pixel_tolerance,
            actions: HashMap::new(),
        }
    }

    /// Registers `action` for `kind`, replacing any previous one.
    pub fn set_input_action(&mut self, kind: ScreenSpaceEventType, action: InputAction) {
        if self.actions.insert(kind, action).is_some() {
            event!(Level::DEBUG, ?kind, "replaced input action");
        }
    }

    /// Feeds one raw event. Returns the screen-space events it produced, in
    /// dispatch order, whether or not an action was registered for them.
    pub fn handle(&mut self, input: InputEvent) -> Vec<ScreenSpaceEvent> {
        let emitted = self.translate(input);
        for ev in &emitted {
            if let Some(action) = self.actions.get(&ev.kind) {
                action(ev);
            }
        }
        emitted
    }

    fn translate(&mut self, input: InputEvent) -> Vec<ScreenSpaceEvent> {
        let at = |kind, position| ScreenSpaceEvent { kind, position };

        match input {
            InputEvent::MouseMoved(x, y) => {
                self.mouse_position = Point2::new(x, y);
                vec![at(ScreenSpaceEventType::MouseMove, self.mouse_position)]
            }

            InputEvent::MouseButtonPressed(button) => {
                self.mouse_button_states[button as usize] = true;
                self.position_on_press[button as usize] = self.mouse_position;
                match button {
                    MouseButton::Left => vec![at(ScreenSpaceEventType::LeftDown, self.mouse_position)],
                    _ => Vec::new(),
                }
            }

            InputEvent::MouseButtonReleased(button) => {
                let was_down = std::mem::replace(&mut self.mouse_button_states[button as usize], false);
                let mut out = Vec::new();
                if button == MouseButton::Left {
                    out.push(at(ScreenSpaceEventType::LeftUp, self.mouse_position));
                }

                let travel = self.position_on_press[button as usize].distance(self.mouse_position);
                if was_down && travel <= self.click_pixel_tolerance {
                    let kind = match button {
                        MouseButton::Left => Some(ScreenSpaceEventType::LeftClick),
                        MouseButton::Right => Some(ScreenSpaceEventType::RightClick),
                        MouseButton::Middle => Some(ScreenSpaceEventType::MiddleClick),
                        MouseButton::Count => None,
                    };
                    if let Some(kind) = kind {
                        out.push(at(kind, self.mouse_position));
                    }
                }
                out
            }

            InputEvent::GestureTap { x, y } => {
                self.mouse_position = Point2::new(x, y);
                vec![at(ScreenSpaceEventType::LeftClick, self.mouse_position)]
            }

            InputEvent::WindowFocused(focused) => {
                if !focused {
                    // a release outside the window never arrives
                    self.mouse_button_states = [false; MouseButton::Count as usize];
                }
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording(handler: &mut ScreenSpaceEventHandler) -> Arc<Mutex<Vec<Point2<f64>>>> {
        let clicks = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&clicks);
        handler.set_input_action(
            ScreenSpaceEventType::LeftClick,
            Box::new(move |ev| sink.lock().unwrap().push(ev.position)),
        );
        clicks
    }

    #[test]
    fn press_and_release_in_place_is_a_click() {
        let mut handler = ScreenSpaceEventHandler::new(DEFAULT_CLICK_PIXEL_TOLERANCE);
        let clicks = recording(&mut handler);

        handler.handle(InputEvent::MouseMoved(100.0, 50.0));
        handler.handle(InputEvent::MouseButtonPressed(MouseButton::Left));
        handler.handle(InputEvent::MouseMoved(102.0, 51.0));
        let emitted = handler.handle(InputEvent::MouseButtonReleased(MouseButton::Left));

        assert_eq!(
            emitted.iter().map(|e| e.kind).collect::<Vec<_>>(),
            vec![ScreenSpaceEventType::LeftUp, ScreenSpaceEventType::LeftClick]
        );
        assert_eq!(*clicks.lock().unwrap(), vec![Point2::new(102.0, 51.0)]);
    }

    #[test]
    fn drag_is_not_a_click() {
        let mut handler = ScreenSpaceEventHandler::new(DEFAULT_CLICK_PIXEL_TOLERANCE);
        let clicks = recording(&mut handler);

        handler.handle(InputEvent::MouseMoved(100.0, 50.0));
        handler.handle(InputEvent::MouseButtonPressed(MouseButton::Left));
        handler.handle(InputEvent::MouseMoved(140.0, 90.0));
        handler.handle(InputEvent::MouseButtonReleased(MouseButton::Left));

        assert!(clicks.lock().unwrap().is_empty());
    }

    #[test]
    fn only_the_latest_action_runs() {
        let mut handler = ScreenSpaceEventHandler::new(DEFAULT_CLICK_PIXEL_TOLERANCE);
        let first = recording(&mut handler);
        let second = recording(&mut handler);

        handler.handle(InputEvent::GestureTap { x: 3.0, y: 4.0 });

        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn right_click_does_not_fire_left_action() {
        let mut handler = ScreenSpaceEventHandler::new(DEFAULT_CLICK_PIXEL_TOLERANCE);
        let clicks = recording(&mut handler);

        handler.handle(InputEvent::MouseButtonPressed(MouseButton::Right));
        let emitted = handler.handle(InputEvent::MouseButtonReleased(MouseButton::Right));

        assert_eq!(emitted[0].kind, ScreenSpaceEventType::RightClick);
        assert!(clicks.lock().unwrap().is_empty());
    }

    #[test]
    fn focus_loss_drops_pending_press() {
        let mut handler = ScreenSpaceEventHandler::new(DEFAULT_CLICK_PIXEL_TOLERANCE);
        let clicks = recording(&mut handler);

        handler.handle(InputEvent::MouseButtonPressed(MouseButton::Left));
        handler.handle(InputEvent::WindowFocused(false));
        handler.handle(InputEvent::MouseButtonReleased(MouseButton::Left));

        assert!(clicks.lock().unwrap().is_empty());
    }
}
