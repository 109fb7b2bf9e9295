use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::input::{MouseButton, PressedSet};
use crate::os::{EventCode, EventHandler, EventInfo, Point, Window, WindowEvent};
use crate::Result;

const MOUSE_EVENTS: [EventCode; 3] = [
    EventCode::MouseButtonDown,
    EventCode::MouseButtonUp,
    EventCode::MouseMove,
];

#[derive(Default)]
struct MouseState {
    buttons: PressedSet,
    x: i32,
    y: i32,
}

impl MouseState {
    fn set_button(&mut self, button: MouseButton, pressed: bool) {
        if let Some(index) = button.index() {
            self.buttons.set(index, pressed);
        }
    }
}

fn on_mouse_event(event: &WindowEvent, data: Option<&(dyn Any + Send + Sync)>) {
    let state = match data.and_then(|d| d.downcast_ref::<Mutex<MouseState>>()) {
        Some(state) => state,
        None => return,
    };
    let mut state = state.lock();
    match event.info {
        EventInfo::MouseButtonDown { x, y, button } => {
            state.set_button(button, true);
            state.x = x;
            state.y = y;
        }
        EventInfo::MouseButtonUp { x, y, button } => {
            state.set_button(button, false);
            state.x = x;
            state.y = y;
        }
        EventInfo::MouseMove { x, y } => {
            state.x = x;
            state.y = y;
        }
        _ => (),
    }
}

/// Tracks held mouse buttons and the last cursor position reported by a window,
/// in client-area coordinates. Every instance, clones included, owns its own state.
pub struct MouseInput {
    window: Option<Arc<dyn Window>>,
    state: Arc<Mutex<MouseState>>,
}

impl MouseInput {
    pub fn new(window: Arc<dyn Window>) -> Self {
        let input = MouseInput {
            window: Some(window),
            state: Arc::new(Mutex::new(MouseState::default())),
        };
        input.subscribe();
        input
    }

    fn handler(&self) -> EventHandler {
        EventHandler::with_data(on_mouse_event, self.state.clone())
    }

    fn subscribe(&self) {
        if let Some(window) = &self.window {
            for code in MOUSE_EVENTS {
                window.push_event_handler(code, self.handler());
            }
        }
    }

    fn unsubscribe(&self) -> Result<()> {
        let mut result = Ok(());
        if let Some(window) = &self.window {
            let handler = self.handler();
            for code in MOUSE_EVENTS {
                let removed = window.remove_event_handler(code, &handler);
                result = result.and(removed);
            }
        }
        result
    }

    /// Watches `window` instead of the current window, buttons start released
    /// and the position at the origin. Returns the window watched before.
    pub fn set_window(&mut self, window: Option<Arc<dyn Window>>) -> Result<Option<Arc<dyn Window>>> {
        if let Err(err) = self.unsubscribe() {
            // the old window may already be destroyed, its handler lists are empty then
            log::debug!("mouse input unsubscribe: {}", err);
        }
        {
            let mut state = self.state.lock();
            state.buttons.reset();
            state.x = 0;
            state.y = 0;
        }
        let previous = std::mem::replace(&mut self.window, window);
        self.subscribe();
        Ok(previous)
    }

    pub fn get_window(&self) -> Option<Arc<dyn Window>> {
        self.window.clone()
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        match button.index() {
            Some(index) => self.state.lock().buttons.get(index),
            None => false,
        }
    }

    pub fn get_x(&self) -> i32 {
        self.state.lock().x
    }

    pub fn get_y(&self) -> i32 {
        self.state.lock().y
    }

    pub fn get_position(&self) -> Point<i32> {
        let state = self.state.lock();
        Point {
            x: state.x,
            y: state.y,
        }
    }
}

impl Default for MouseInput {
    fn default() -> Self {
        MouseInput {
            window: None,
            state: Arc::new(Mutex::new(MouseState::default())),
        }
    }
}

impl Clone for MouseInput {
    fn clone(&self) -> Self {
        match &self.window {
            Some(window) => MouseInput::new(window.clone()),
            None => MouseInput::default(),
        }
    }
}

impl Drop for MouseInput {
    fn drop(&mut self) {
        if let Err(err) = self.unsubscribe() {
            log::debug!("mouse input unsubscribe: {}", err);
        }
    }
}
