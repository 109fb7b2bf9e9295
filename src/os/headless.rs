use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::object::{ClassId, ImplementationId, InterfaceId, ObjectIdentity, OBJECT_CLASS};
use crate::os::event::{self, EventCode, EventHandler, EventHandlers, EventInfo, WindowEvent};
use crate::os::{Point, Rect, Size, Window, WindowApi, WindowCreateInfo, WINDOW_CLASS};
use crate::{Error, Result};

pub const HEADLESS_WINDOW_CLASS: ClassId = ClassId::new(InterfaceId::Window, ImplementationId::Generic);

#[derive(Default)]
struct HeadlessState {
    title: String,
    rect: Rect<i32>,
    created: bool,
    running: bool,
}

/// A window without a native surface. Events are injected with `post_event` and
/// delivered by the next `update`, geometry changes are reported synchronously.
pub struct HeadlessWindow {
    identity: ObjectIdentity,
    state: Mutex<HeadlessState>,
    pending: Mutex<VecDeque<EventInfo>>,
    handlers: Mutex<EventHandlers>,
}

crate::impl_object!(
    HeadlessWindow,
    HEADLESS_WINDOW_CLASS,
    [OBJECT_CLASS, WINDOW_CLASS, HEADLESS_WINDOW_CLASS],
    into_window -> crate::os::Window
);

pub(crate) fn allocate_headless_window() -> Arc<dyn Window> {
    Arc::new(HeadlessWindow::new())
}

impl HeadlessWindow {
    pub fn new() -> Self {
        HeadlessWindow {
            identity: ObjectIdentity::new(HEADLESS_WINDOW_CLASS),
            state: Mutex::new(HeadlessState::default()),
            pending: Mutex::new(VecDeque::new()),
            handlers: Mutex::new(EventHandlers::default()),
        }
    }

    fn dispatch(&self, info: EventInfo) {
        event::dispatch(&self.handlers, &WindowEvent::new(self.identity.id(), info));
    }

    fn require_created(&self) -> Result<()> {
        if self.state.lock().created {
            Ok(())
        } else {
            Err(Error::uninitialized("headless window has not been created"))
        }
    }

    /// Queues an event for the next `update`, it is dropped if the window is not running
    pub fn post_event(&self, info: EventInfo) {
        self.pending.lock().push_back(info);
    }

    /// Asks the window to close, it stops running once the next `update` delivers `Destroy`
    pub fn close(&self) {
        self.post_event(EventInfo::Destroy);
    }

    pub fn pending_events(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl Window for HeadlessWindow {
    fn create(&self, info: &WindowCreateInfo) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.created {
                return Err(Error::invalid_param("headless window already created"));
            }
            state.title = info.title.clone();
            state.rect = Rect {
                x: info.x,
                y: info.y,
                width: info.width as i32,
                height: info.height as i32,
            };
            state.created = true;
            state.running = true;
        }
        {
            let mut handlers = self.handlers.lock();
            handlers.clear();
            for (code, handler) in &info.event_handlers {
                handlers.push(*code, handler.clone());
            }
        }
        self.dispatch(EventInfo::Create);
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let was_running = {
            let mut state = self.state.lock();
            std::mem::replace(&mut state.running, false)
        };
        if was_running {
            self.pending.lock().clear();
            self.dispatch(EventInfo::Destroy);
        }
        self.handlers.lock().clear();
        Ok(())
    }

    fn get_window_api(&self) -> WindowApi {
        WindowApi::Headless
    }

    fn update(&self) {
        loop {
            if !self.is_running() {
                self.pending.lock().clear();
                break;
            }
            // pop one at a time so handlers may post more events
            let info = match self.pending.lock().pop_front() {
                Some(info) => info,
                None => break,
            };
            match info {
                EventInfo::Resize { width, height } => {
                    let mut state = self.state.lock();
                    state.rect.width = width as i32;
                    state.rect.height = height as i32;
                }
                EventInfo::Move { x, y } => {
                    let mut state = self.state.lock();
                    state.rect.x = x;
                    state.rect.y = y;
                }
                _ => (),
            }
            self.dispatch(info);
            if info == EventInfo::Destroy {
                self.state.lock().running = false;
            }
        }
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn push_event_handler(&self, code: EventCode, handler: EventHandler) {
        self.handlers.lock().push(code, handler);
    }

    fn remove_event_handler(&self, code: EventCode, handler: &EventHandler) -> Result<()> {
        self.handlers.lock().remove(code, handler)
    }

    fn set_title(&self, title: &str) -> Result<()> {
        self.require_created()?;
        self.state.lock().title = title.to_string();
        Ok(())
    }

    fn get_title(&self) -> Result<String> {
        self.require_created()?;
        Ok(self.state.lock().title.clone())
    }

    fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.require_created()?;
        {
            let mut state = self.state.lock();
            state.rect.width = width as i32;
            state.rect.height = height as i32;
        }
        self.dispatch(EventInfo::Resize { width, height });
        Ok(())
    }

    fn get_window_size(&self) -> Result<Size<u32>> {
        // no decorations, the window is all client area
        self.get_client_size()
    }

    fn get_client_size(&self) -> Result<Size<u32>> {
        self.require_created()?;
        let state = self.state.lock();
        Ok(Size {
            width: state.rect.width as u32,
            height: state.rect.height as u32,
        })
    }

    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.require_created()?;
        {
            let mut state = self.state.lock();
            state.rect.x = x;
            state.rect.y = y;
        }
        self.dispatch(EventInfo::Move { x, y });
        Ok(())
    }

    fn get_position(&self) -> Result<Point<i32>> {
        self.require_created()?;
        let state = self.state.lock();
        Ok(Point {
            x: state.rect.x,
            y: state.rect.y,
        })
    }
}

impl Drop for HeadlessWindow {
    fn drop(&mut self) {
        let _ = self.destroy();
    }
}
