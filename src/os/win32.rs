use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use windows::{
    core::*, Win32::Foundation::*, Win32::Graphics::Gdi::ClientToScreen,
    Win32::System::LibraryLoader::*, Win32::UI::WindowsAndMessaging::*,
};

use crate::object::{ClassId, ImplementationId, InterfaceId, ObjectIdentity, OBJECT_CLASS};
use crate::os::event::{self, EventCode, EventHandler, EventHandlers, EventInfo, WindowEvent};
use crate::os::translate;
use crate::os::{Point, Size, Window, WindowApi, WindowCreateInfo, WINDOW_CLASS};
use crate::{Error, Result};

pub const WIN32_WINDOW_CLASS: ClassId = ClassId::new(InterfaceId::Window, ImplementationId::Win32);

const WINDOW_CLASS_NAME: PCWSTR = w!("blaze_wndcls_1");
const BLAZE_WINDOW_STYLE: WINDOW_STYLE = WS_OVERLAPPEDWINDOW;

// set once the process wide window class has been registered
static WINDOW_CLASS_REGISTERED: Mutex<bool> = parking_lot::const_mutex(false);

fn register_window_class() -> Result<HINSTANCE> {
    let mut registered = WINDOW_CLASS_REGISTERED.lock();
    unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None)?.into();
        if !*registered {
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_OWNDC | CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                hInstance: instance,
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hIcon: LoadIconW(None, IDI_APPLICATION)?,
                hIconSm: LoadIconW(None, IDI_APPLICATION)?,
                lpszClassName: WINDOW_CLASS_NAME,
                ..Default::default()
            };
            if RegisterClassExW(&wc) == 0 {
                return Err(Error::from(windows::core::Error::from_win32()));
            }
            *registered = true;
            log::debug!("registered win32 window class blaze_wndcls_1");
        }
        Ok(instance)
    }
}

/// Outer window rect for a client area at `x, y` of `width x height`
fn adjust_client_rect(x: i32, y: i32, width: u32, height: u32) -> Result<RECT> {
    let mut rect = RECT {
        left: x,
        top: y,
        right: x + width as i32,
        bottom: y + height as i32,
    };
    unsafe {
        AdjustWindowRectEx(&mut rect, BLAZE_WINDOW_STYLE, FALSE, WINDOW_EX_STYLE::default())?;
    }
    Ok(rect)
}

/// A native win32 window. Events are delivered from `update` on the thread which created it.
pub struct Win32Window {
    identity: ObjectIdentity,
    hwnd: AtomicIsize,
    running: AtomicBool,
    handlers: Mutex<EventHandlers>,
}

crate::impl_object!(
    Win32Window,
    WIN32_WINDOW_CLASS,
    [OBJECT_CLASS, WINDOW_CLASS, WIN32_WINDOW_CLASS],
    into_window -> crate::os::Window
);

pub(crate) fn allocate_win32_window() -> Arc<dyn Window> {
    Arc::new(Win32Window::new())
}

impl Win32Window {
    pub fn new() -> Self {
        Win32Window {
            identity: ObjectIdentity::new(WIN32_WINDOW_CLASS),
            hwnd: AtomicIsize::new(0),
            running: AtomicBool::new(false),
            handlers: Mutex::new(EventHandlers::default()),
        }
    }

    /// The native handle, `None` before create and after the window was destroyed
    pub fn get_native_handle(&self) -> Option<HWND> {
        match self.hwnd.load(Ordering::SeqCst) {
            0 => None,
            hwnd => Some(HWND(hwnd as *mut c_void)),
        }
    }

    fn require_hwnd(&self) -> Result<HWND> {
        self.get_native_handle()
            .ok_or_else(|| Error::uninitialized("win32 window has no native handle"))
    }

    fn dispatch(&self, info: EventInfo) {
        event::dispatch(&self.handlers, &WindowEvent::new(self.identity.id(), info));
    }
}

impl Default for Win32Window {
    fn default() -> Self {
        Self::new()
    }
}

impl Window for Win32Window {
    fn create(&self, info: &WindowCreateInfo) -> Result<()> {
        if self.get_native_handle().is_some() {
            return Err(Error::invalid_param("win32 window already created"));
        }
        {
            let mut handlers = self.handlers.lock();
            handlers.clear();
            for (code, handler) in &info.event_handlers {
                handlers.push(*code, handler.clone());
            }
        }

        let instance = register_window_class()?;
        let title = HSTRING::from(info.title.as_str());
        let rect = adjust_client_rect(info.x, info.y, info.width, info.height)?;

        // the handle is captured in wndproc on WM_NCCREATE, before WM_CREATE is dispatched
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                WINDOW_CLASS_NAME,
                &title,
                BLAZE_WINDOW_STYLE,
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
                None,
                None,
                instance,
                Some(self as *const Self as *const c_void),
            )?
        };

        self.running.store(true, Ordering::SeqCst);
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
        }
        log::debug!("win32 window {:?} shown", hwnd);
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let result = match self.get_native_handle() {
            Some(hwnd) => unsafe { DestroyWindow(hwnd) }.map_err(Error::from),
            None => Ok(()),
        };
        self.handlers.lock().clear();
        result
    }

    fn get_window_api(&self) -> WindowApi {
        WindowApi::Win32
    }

    fn update(&self) {
        let hwnd = match self.get_native_handle() {
            Some(hwnd) => hwnd,
            None => return,
        };
        let mut msg = MSG::default();
        unsafe {
            while PeekMessageW(&mut msg, hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn push_event_handler(&self, code: EventCode, handler: EventHandler) {
        self.handlers.lock().push(code, handler);
    }

    fn remove_event_handler(&self, code: EventCode, handler: &EventHandler) -> Result<()> {
        self.handlers.lock().remove(code, handler)
    }

    fn set_title(&self, title: &str) -> Result<()> {
        let hwnd = self.require_hwnd()?;
        unsafe {
            SetWindowTextW(hwnd, &HSTRING::from(title))?;
        }
        Ok(())
    }

    fn get_title(&self) -> Result<String> {
        let hwnd = self.require_hwnd()?;
        unsafe {
            SetLastError(WIN32_ERROR(0));
            let length = GetWindowTextLengthW(hwnd);
            if length <= 0 {
                let err = GetLastError();
                if err != ERROR_SUCCESS {
                    return Err(Error::system(format!("GetWindowTextLengthW failed: {:?}", err)));
                }
                return Ok(String::new());
            }
            let mut buffer = vec![0u16; length as usize + 1];
            let copied = GetWindowTextW(hwnd, &mut buffer).max(0) as usize;
            Ok(String::from_utf16_lossy(&buffer[..copied.min(buffer.len())]))
        }
    }

    fn resize(&self, width: u32, height: u32) -> Result<()> {
        let hwnd = self.require_hwnd()?;
        let rect = adjust_client_rect(0, 0, width, height)?;
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                0,
                0,
                rect.right - rect.left,
                rect.bottom - rect.top,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn get_window_size(&self) -> Result<Size<u32>> {
        let hwnd = self.require_hwnd()?;
        let mut rect = RECT::default();
        unsafe {
            GetWindowRect(hwnd, &mut rect)?;
        }
        Ok(Size {
            width: (rect.right - rect.left) as u32,
            height: (rect.bottom - rect.top) as u32,
        })
    }

    fn get_client_size(&self) -> Result<Size<u32>> {
        let hwnd = self.require_hwnd()?;
        let mut rect = RECT::default();
        unsafe {
            GetClientRect(hwnd, &mut rect)?;
        }
        Ok(Size {
            width: rect.right as u32,
            height: rect.bottom as u32,
        })
    }

    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        let hwnd = self.require_hwnd()?;
        // keep the border offset of the current frame so the client origin lands on x, y
        let outer = adjust_client_rect(x, y, 0, 0)?;
        unsafe {
            SetWindowPos(
                hwnd,
                None,
                outer.left,
                outer.top,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn get_position(&self) -> Result<Point<i32>> {
        let hwnd = self.require_hwnd()?;
        let mut origin = POINT { x: 0, y: 0 };
        unsafe {
            if !ClientToScreen(hwnd, &mut origin).as_bool() {
                return Err(Error::system("ClientToScreen failed"));
            }
        }
        Ok(Point {
            x: origin.x,
            y: origin.y,
        })
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::warn!("failed to destroy win32 window: {}", err);
            // DestroyWindow fails off the creating thread, the native window outlives self
            if let Some(hwnd) = self.get_native_handle() {
                unsafe {
                    SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                }
                self.hwnd.store(0, Ordering::SeqCst);
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }
}

extern "system" fn wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        let window = if msg == WM_NCCREATE {
            let cs = lparam.0 as *const CREATESTRUCTW;
            let window = (*cs).lpCreateParams as *const Win32Window;
            if let Some(window) = window.as_ref() {
                window.hwnd.store(hwnd.0 as isize, Ordering::SeqCst);
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, window as *const Win32Window as isize);
            }
            window
        } else {
            GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const Win32Window
        };

        if let Some(window) = window.as_ref() {
            if let Some(info) = translate::translate_message(msg, wparam.0, lparam.0) {
                window.dispatch(info);
                if msg == WM_XBUTTONDOWN || msg == WM_XBUTTONUP {
                    return LRESULT(1);
                }
            }
            match msg {
                WM_DESTROY => {
                    PostQuitMessage(0);
                    window.running.store(false, Ordering::SeqCst);
                }
                WM_NCDESTROY => {
                    SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                    window.hwnd.store(0, Ordering::SeqCst);
                }
                _ => (),
            }
        }

        DefWindowProcW(hwnd, msg, wparam, lparam)
    }
}
