use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::input::{KeyCode, PressedSet};
use crate::os::{EventCode, EventHandler, EventInfo, Window, WindowEvent};
use crate::Result;

#[derive(Default)]
struct KeyboardState {
    keys: PressedSet,
}

fn on_key_event(event: &WindowEvent, data: Option<&(dyn Any + Send + Sync)>) {
    let state = match data.and_then(|d| d.downcast_ref::<Mutex<KeyboardState>>()) {
        Some(state) => state,
        None => return,
    };
    let (key, pressed) = match event.info {
        EventInfo::KeyDown { key } => (key, true),
        EventInfo::KeyUp { key } => (key, false),
        _ => return,
    };
    if let Some(index) = key.index() {
        state.lock().keys.set(index, pressed);
    }
}

/// Tracks which keys are held on a window by observing its key events.
/// Every instance, clones included, owns its own key state.
pub struct KeyboardInput {
    window: Option<Arc<dyn Window>>,
    state: Arc<Mutex<KeyboardState>>,
}

impl KeyboardInput {
    pub fn new(window: Arc<dyn Window>) -> Self {
        let input = KeyboardInput {
            window: Some(window),
            state: Arc::new(Mutex::new(KeyboardState::default())),
        };
        input.subscribe();
        input
    }

    fn handler(&self) -> EventHandler {
        EventHandler::with_data(on_key_event, self.state.clone())
    }

    fn subscribe(&self) {
        if let Some(window) = &self.window {
            window.push_event_handler(EventCode::KeyDown, self.handler());
            window.push_event_handler(EventCode::KeyUp, self.handler());
        }
    }

    fn unsubscribe(&self) -> Result<()> {
        if let Some(window) = &self.window {
            let handler = self.handler();
            let down = window.remove_event_handler(EventCode::KeyDown, &handler);
            let up = window.remove_event_handler(EventCode::KeyUp, &handler);
            down.and(up)?;
        }
        Ok(())
    }

    /// Watches `window` instead of the current window, all keys start released.
    /// Returns the window watched before.
    pub fn set_window(&mut self, window: Option<Arc<dyn Window>>) -> Result<Option<Arc<dyn Window>>> {
        if let Err(err) = self.unsubscribe() {
            // the old window may already be destroyed, its handler lists are empty then
            log::debug!("keyboard input unsubscribe: {}", err);
        }
        self.state.lock().keys.reset();
        let previous = std::mem::replace(&mut self.window, window);
        self.subscribe();
        Ok(previous)
    }

    pub fn get_window(&self) -> Option<Arc<dyn Window>> {
        self.window.clone()
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        match key.index() {
            Some(index) => self.state.lock().keys.get(index),
            None => false,
        }
    }

    pub fn is_any_key_pressed(&self) -> bool {
        self.state.lock().keys.any()
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        KeyboardInput {
            window: None,
            state: Arc::new(Mutex::new(KeyboardState::default())),
        }
    }
}

impl Clone for KeyboardInput {
    fn clone(&self) -> Self {
        match &self.window {
            Some(window) => KeyboardInput::new(window.clone()),
            None => KeyboardInput::default(),
        }
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        if let Err(err) = self.unsubscribe() {
            // handler lists are cleared when the window is destroyed first
            log::debug!("keyboard input unsubscribe: {}", err);
        }
    }
}
