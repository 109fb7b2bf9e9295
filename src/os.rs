/// Window events, handlers and dispatch order
pub mod event;

/// Translation of win32 messages and virtual keys into blaze events
pub mod translate;

/// Implements the window interface without a native surface, usable on any platform
pub mod headless;

/// Implements the window interface for windows win32 platform
#[cfg(target_os = "windows")]
pub mod win32;

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::object::{Cast, ClassId, InterfaceId, Object, StaticClass};
use crate::{Error, Result};

pub use event::{
    EventCode, EventHandler, EventHandlerFn, EventHandlers, EventInfo, HandlerData, WindowEvent,
};

/// Describes a rectangle starting at the top left corner specified by x,y
/// with the size of width and height.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// 2-Dimensional point with x and y
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

/// 2-Dimensional size with width and height
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

/// Windowing backends, `Null` requests the process default
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowApi {
    #[default]
    Null,
    Win32,
    Headless,
}

/// Filled out to specify various window parameters when a window is created by `create_window`.
/// Position and size describe the client area.
#[derive(Debug, Clone)]
pub struct WindowCreateInfo {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub window_api: WindowApi,
    /// Registered before the native window exists, so they observe the `Create` event
    pub event_handlers: Vec<(EventCode, EventHandler)>,
}

impl Default for WindowCreateInfo {
    fn default() -> Self {
        WindowCreateInfo {
            title: String::from("Blaze Window"),
            x: 200,
            y: 100,
            width: 960,
            height: 540,
            window_api: WindowApi::Null,
            event_handlers: Vec::new(),
        }
    }
}

/// An instance of an operating system window.
///
/// Lifecycle is uncreated, running, destroyed. Events are delivered on the thread which calls `update`.
pub trait Window: Object {
    /// Creates the native window, called once by `create_window`
    fn create(&self, info: &WindowCreateInfo) -> Result<()>;

    /// Destroys the native window and clears every handler list
    fn destroy(&self) -> Result<()>;

    fn get_window_api(&self) -> WindowApi;

    /// Dispatches every pending message without blocking
    fn update(&self);

    /// False once the window has been destroyed
    fn is_running(&self) -> bool;

    fn push_event_handler(&self, code: EventCode, handler: EventHandler);

    fn remove_event_handler(&self, code: EventCode, handler: &EventHandler) -> Result<()>;

    fn set_title(&self, title: &str) -> Result<()>;

    fn get_title(&self) -> Result<String>;

    /// Resizes the client area
    fn resize(&self, width: u32, height: u32) -> Result<()>;

    /// Outer size including borders and title bar
    fn get_window_size(&self) -> Result<Size<u32>>;

    fn get_client_size(&self) -> Result<Size<u32>>;

    /// Moves the client area origin to `x, y` in screen coordinates
    fn move_to(&self, x: i32, y: i32) -> Result<()>;

    /// Screen position of the client area origin
    fn get_position(&self) -> Result<Point<i32>>;
}

pub const WINDOW_CLASS: ClassId = ClassId::of_interface(InterfaceId::Window);

impl StaticClass for dyn Window {
    const CLASS_ID: ClassId = WINDOW_CLASS;
}

impl Cast for dyn Window {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        object.into_window()
    }
}

/// Allocates an uncreated window of one backend
pub type WindowAllocator = fn() -> Arc<dyn Window>;

struct WindowBackends {
    default: WindowApi,
    allocators: HashMap<WindowApi, WindowAllocator>,
}

fn window_backends() -> &'static RwLock<WindowBackends> {
    static BACKENDS: OnceLock<RwLock<WindowBackends>> = OnceLock::new();
    BACKENDS.get_or_init(|| {
        let mut backends = WindowBackends {
            default: WindowApi::Null,
            allocators: HashMap::new(),
        };
        backends
            .allocators
            .insert(WindowApi::Headless, headless::allocate_headless_window);
        #[cfg(target_os = "windows")]
        {
            backends
                .allocators
                .insert(WindowApi::Win32, win32::allocate_win32_window);
            backends.default = WindowApi::Win32;
        }
        RwLock::new(backends)
    })
}

/// Registers or replaces the allocator used for `api`
pub fn register_window_backend(api: WindowApi, allocator: WindowAllocator) -> Result<()> {
    if api == WindowApi::Null {
        return Err(Error::invalid_param("cannot register a backend for WindowApi::Null"));
    }
    window_backends().write().allocators.insert(api, allocator);
    Ok(())
}

/// The api `WindowApi::Null` resolves to, `Null` itself when the platform has no native backend
pub fn default_window_api() -> WindowApi {
    window_backends().read().default
}

pub fn supported_window_apis() -> Vec<WindowApi> {
    let mut apis: Vec<WindowApi> = window_backends().read().allocators.keys().copied().collect();
    apis.sort_by_key(|api| *api as u32);
    apis
}

pub fn is_window_api_supported(api: WindowApi) -> bool {
    window_backends().read().allocators.contains_key(&api)
}

/// Creates a window with the requested backend, or the default one when `info.window_api` is `Null`.
/// Returns `None` when the backend is unsupported or creation fails.
pub fn create_window(info: &WindowCreateInfo) -> Option<Arc<dyn Window>> {
    let api = match info.window_api {
        WindowApi::Null => default_window_api(),
        api => api,
    };
    let allocator = window_backends().read().allocators.get(&api).copied();
    let allocator = match allocator {
        Some(allocator) => allocator,
        None => {
            log::warn!("window api {:?} is not supported on this platform", api);
            return None;
        }
    };
    let window = allocator();
    match window.create(info) {
        Ok(()) => {
            log::info!(
                "created {:?} window {} \"{}\" ({}x{})",
                api,
                window.get_object_id(),
                info.title,
                info.width,
                info.height
            );
            Some(window)
        }
        Err(err) => {
            log::warn!("failed to create {:?} window: {}", api, err);
            None
        }
    }
}
