use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::input::{KeyCode, MouseButton};
use crate::object::ObjectId;
use crate::{Error, Result};

/// Tags a window event. `Null` doubles as the "all events" code when registering handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventCode {
    Null = 0,
    Create,
    Destroy,
    Resize,
    Move,
    KeyDown,
    KeyUp,
    MouseButtonDown,
    MouseButtonUp,
    MouseMove,
}

pub const NUM_EVENT_CODES: usize = 10;

impl EventCode {
    pub const INVALID: EventCode = EventCode::Null;
    pub const ALL: EventCode = EventCode::Null;

    fn index(self) -> usize {
        self as usize
    }
}

/// Payload of a window event, one variant per event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventInfo {
    Create,
    Destroy,
    Resize { width: u32, height: u32 },
    Move { x: i32, y: i32 },
    KeyDown { key: KeyCode },
    KeyUp { key: KeyCode },
    MouseButtonDown { x: i32, y: i32, button: MouseButton },
    MouseButtonUp { x: i32, y: i32, button: MouseButton },
    MouseMove { x: i32, y: i32 },
}

impl EventInfo {
    pub fn code(&self) -> EventCode {
        match self {
            EventInfo::Create => EventCode::Create,
            EventInfo::Destroy => EventCode::Destroy,
            EventInfo::Resize { .. } => EventCode::Resize,
            EventInfo::Move { .. } => EventCode::Move,
            EventInfo::KeyDown { .. } => EventCode::KeyDown,
            EventInfo::KeyUp { .. } => EventCode::KeyUp,
            EventInfo::MouseButtonDown { .. } => EventCode::MouseButtonDown,
            EventInfo::MouseButtonUp { .. } => EventCode::MouseButtonUp,
            EventInfo::MouseMove { .. } => EventCode::MouseMove,
        }
    }
}

/// An event delivered to handlers, `window` is the id of the window which produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEvent {
    pub window: ObjectId,
    pub info: EventInfo,
}

impl WindowEvent {
    pub fn new(window: ObjectId, info: EventInfo) -> Self {
        WindowEvent { window, info }
    }

    pub fn code(&self) -> EventCode {
        self.info.code()
    }
}

/// User data handed back to a handler on every call.
pub type HandlerData = Arc<dyn Any + Send + Sync>;

/// Handler callback, called synchronously on the thread pumping the window.
pub type EventHandlerFn = fn(event: &WindowEvent, data: Option<&(dyn Any + Send + Sync)>);

/// A handler function paired with optional user data.
/// Two handlers are equal when both the function and the data allocation are the same.
#[derive(Clone)]
pub struct EventHandler {
    func: EventHandlerFn,
    data: Option<HandlerData>,
}

impl EventHandler {
    pub fn new(func: EventHandlerFn) -> Self {
        EventHandler { func, data: None }
    }

    pub fn with_data(func: EventHandlerFn, data: HandlerData) -> Self {
        EventHandler {
            func,
            data: Some(data),
        }
    }

    pub fn call(&self, event: &WindowEvent) {
        (self.func)(event, self.data.as_deref())
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        let same_data = match (&self.data, &other.data) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ()),
            _ => false,
        };
        same_data && self.func as usize == other.func as usize
    }
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field("func", &(self.func as usize as *const ()))
            .field("data", &self.data.as_ref().map(|d| Arc::as_ptr(d) as *const ()))
            .finish()
    }
}

/// Per window handler table, one ordered list per event code.
/// The list at `EventCode::ALL` runs for every event ahead of the specific list.
#[derive(Debug, Default, Clone)]
pub struct EventHandlers {
    lists: [Vec<EventHandler>; NUM_EVENT_CODES],
}

impl EventHandlers {
    pub fn push(&mut self, code: EventCode, handler: EventHandler) {
        self.lists[code.index()].push(handler);
    }

    /// Removes the first registration equal to `handler`, `InvalidParam` if there is none.
    pub fn remove(&mut self, code: EventCode, handler: &EventHandler) -> Result<()> {
        let list = &mut self.lists[code.index()];
        match list.iter().position(|h| h == handler) {
            Some(pos) => {
                list.remove(pos);
                Ok(())
            }
            None => Err(Error::invalid_param(format!(
                "no matching handler registered for {:?}",
                code
            ))),
        }
    }

    pub fn contains(&self, code: EventCode, handler: &EventHandler) -> bool {
        self.lists[code.index()].contains(handler)
    }

    pub fn handlers(&self, code: EventCode) -> &[EventHandler] {
        &self.lists[code.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(|list| list.is_empty())
    }

    /// Handlers to invoke for an event with `code`, "all events" handlers first.
    pub fn dispatch_list(&self, code: EventCode) -> Vec<EventHandler> {
        if code == EventCode::INVALID {
            return Vec::new();
        }
        self.lists[EventCode::ALL.index()]
            .iter()
            .chain(self.lists[code.index()].iter())
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }
}

/// Invokes the handlers for `event`. The table lock is released before any handler runs
/// so handlers may push or remove handlers on the same window.
pub fn dispatch(handlers: &Mutex<EventHandlers>, event: &WindowEvent) {
    let list = handlers.lock().dispatch_list(event.code());
    log::trace!("dispatching {:?} to {} handlers", event, list.len());
    for handler in &list {
        handler.call(event);
    }
}
