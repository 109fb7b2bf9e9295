use std::ffi::{c_void, CString};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use windows::{
    core::*, Win32::Foundation::*, Win32::Graphics::Gdi::*, Win32::Graphics::OpenGL::*,
    Win32::System::LibraryLoader::*, Win32::UI::WindowsAndMessaging::*,
};

use crate::gfx::current;
use crate::gfx::gl::{GlDeviceContext, GL_DEVICE_CONTEXT_CLASS};
use crate::gfx::{
    DeviceContext, DeviceContextCreateInfo, RenderApi, RenderContext, DEVICE_CONTEXT_CLASS,
    RENDER_CONTEXT_CLASS,
};
use crate::object::{CastExt, ClassId, ImplementationId, InterfaceId, ObjectIdentity, OBJECT_CLASS};
use crate::os::win32::Win32Window;
use crate::os::Window;
use crate::{Error, Result};

pub const WGL_DEVICE_CONTEXT_CLASS: ClassId =
    ClassId::new(InterfaceId::DeviceContext, ImplementationId::Wgl);

const WGL_DRAW_TO_WINDOW_ARB: i32 = 0x2001;
const WGL_ACCELERATION_ARB: i32 = 0x2003;
const WGL_SUPPORT_OPENGL_ARB: i32 = 0x2010;
const WGL_DOUBLE_BUFFER_ARB: i32 = 0x2011;
const WGL_PIXEL_TYPE_ARB: i32 = 0x2013;
const WGL_COLOR_BITS_ARB: i32 = 0x2014;
const WGL_DEPTH_BITS_ARB: i32 = 0x2022;
const WGL_STENCIL_BITS_ARB: i32 = 0x2023;
const WGL_FULL_ACCELERATION_ARB: i32 = 0x2027;
const WGL_TYPE_RGBA_ARB: i32 = 0x202B;
const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;

const GL_MAJOR_VERSION: i32 = 3;
const GL_MINOR_VERSION: i32 = 3;

type WglChoosePixelFormatArb =
    unsafe extern "system" fn(HDC, *const i32, *const f32, u32, *mut i32, *mut u32) -> BOOL;
type WglCreateContextAttribsArb = unsafe extern "system" fn(HDC, HGLRC, *const i32) -> HGLRC;

/// Process wide WGL extension entry points, loaded once through a dummy context
struct Wgl {
    choose_pixel_format: WglChoosePixelFormatArb,
    create_context_attribs: WglCreateContextAttribsArb,
    opengl32: libloading::Library,
}

static WGL: OnceLock<Wgl> = OnceLock::new();
static WGL_INIT: Mutex<()> = parking_lot::const_mutex(());

fn wgl() -> Result<&'static Wgl> {
    if let Some(wgl) = WGL.get() {
        return Ok(wgl);
    }
    let _guard = WGL_INIT.lock();
    if let Some(wgl) = WGL.get() {
        return Ok(wgl);
    }
    let wgl = unsafe { load_wgl()? };
    log::info!("initialised WGL extensions");
    Ok(WGL.get_or_init(|| wgl))
}

fn legacy_pixel_format() -> PIXELFORMATDESCRIPTOR {
    PIXELFORMATDESCRIPTOR {
        nSize: std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16,
        nVersion: 1,
        dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: 32,
        cDepthBits: 24,
        cStencilBits: 8,
        ..Default::default()
    }
}

/// Hidden window with a legacy context current, restores the previous context on drop
struct DummyContext {
    hwnd: HWND,
    hdc: HDC,
    hglrc: HGLRC,
    previous_dc: HDC,
    previous_rc: HGLRC,
}

impl DummyContext {
    unsafe fn new() -> Result<Self> {
        let instance: HINSTANCE = GetModuleHandleW(None)?.into();
        let class_name = w!("blaze_wgl_dummy");
        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_OWNDC,
            lpfnWndProc: Some(dummy_wndproc),
            hInstance: instance,
            lpszClassName: class_name,
            ..Default::default()
        };
        // registration fails harmlessly if a previous attempt already registered the class
        RegisterClassExW(&wc);

        let hwnd = CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            class_name,
            w!("blaze wgl"),
            WS_OVERLAPPEDWINDOW,
            0,
            0,
            1,
            1,
            None,
            None,
            instance,
            None,
        )?;
        let mut dummy = DummyContext {
            hwnd,
            hdc: GetDC(hwnd),
            hglrc: HGLRC::default(),
            previous_dc: wglGetCurrentDC(),
            previous_rc: wglGetCurrentContext(),
        };
        if dummy.hdc.is_invalid() {
            return Err(Error::system("GetDC failed for the WGL dummy window"));
        }

        let pfd = legacy_pixel_format();
        let format = ChoosePixelFormat(dummy.hdc, &pfd);
        if format == 0 {
            return Err(Error::system("no legacy pixel format for the WGL dummy window"));
        }
        SetPixelFormat(dummy.hdc, format, &pfd)?;
        dummy.hglrc = wglCreateContext(dummy.hdc)?;
        wglMakeCurrent(dummy.hdc, dummy.hglrc)?;
        Ok(dummy)
    }
}

impl Drop for DummyContext {
    fn drop(&mut self) {
        unsafe {
            let _ = wglMakeCurrent(self.previous_dc, self.previous_rc);
            if !self.hglrc.is_invalid() {
                let _ = wglDeleteContext(self.hglrc);
            }
            if !self.hdc.is_invalid() {
                ReleaseDC(self.hwnd, self.hdc);
            }
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

extern "system" fn dummy_wndproc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}

unsafe fn wgl_proc_address(name: &CString) -> Option<unsafe extern "system" fn() -> isize> {
    let proc = wglGetProcAddress(PCSTR(name.as_ptr() as *const u8))?;
    // failures are reported as small sentinel values as well as null
    match proc as usize {
        1 | 2 | 3 | usize::MAX => None,
        _ => Some(proc),
    }
}

unsafe fn load_wgl() -> Result<Wgl> {
    let opengl32 = libloading::Library::new("opengl32.dll")?;
    let _dummy = DummyContext::new()?;

    let choose_name = CString::new("wglChoosePixelFormatARB").map_err(|e| Error::unknown(e.to_string()))?;
    let create_name =
        CString::new("wglCreateContextAttribsARB").map_err(|e| Error::unknown(e.to_string()))?;
    let choose = wgl_proc_address(&choose_name)
        .ok_or_else(|| Error::unknown("wglChoosePixelFormatARB is not available"))?;
    let create = wgl_proc_address(&create_name)
        .ok_or_else(|| Error::unknown("wglCreateContextAttribsARB is not available"))?;

    Ok(Wgl {
        choose_pixel_format: std::mem::transmute::<_, WglChoosePixelFormatArb>(choose),
        create_context_attribs: std::mem::transmute::<_, WglCreateContextAttribsArb>(create),
        opengl32,
    })
}

impl Wgl {
    /// Core 1.1 functions are only exported by opengl32.dll, everything newer comes from the driver
    fn get_proc_address(&self, name: &str) -> *const c_void {
        let name = match CString::new(name) {
            Ok(name) => name,
            Err(_) => return std::ptr::null(),
        };
        unsafe {
            if let Some(proc) = wgl_proc_address(&name) {
                return proc as *const c_void;
            }
            match self
                .opengl32
                .get::<unsafe extern "system" fn()>(name.as_bytes_with_nul())
            {
                Ok(symbol) => *symbol as *const c_void,
                Err(_) => std::ptr::null(),
            }
        }
    }
}

#[derive(Default)]
struct WglState {
    window: Option<Arc<Win32Window>>,
    hdc: isize,
    hglrc: isize,
}

/// OpenGL 3.3 core context created on a win32 window
pub struct WglDeviceContext {
    identity: ObjectIdentity,
    state: Mutex<WglState>,
    gl: OnceLock<glow::Context>,
}

crate::impl_object!(
    WglDeviceContext,
    WGL_DEVICE_CONTEXT_CLASS,
    [
        OBJECT_CLASS,
        RENDER_CONTEXT_CLASS,
        DEVICE_CONTEXT_CLASS,
        GL_DEVICE_CONTEXT_CLASS,
        WGL_DEVICE_CONTEXT_CLASS
    ],
    into_render_context -> crate::gfx::RenderContext,
    into_device_context -> crate::gfx::DeviceContext,
    into_gl_device_context -> crate::gfx::gl::GlDeviceContext
);

impl WglDeviceContext {
    pub fn new() -> Self {
        WglDeviceContext {
            identity: ObjectIdentity::new(WGL_DEVICE_CONTEXT_CLASS),
            state: Mutex::new(WglState::default()),
            gl: OnceLock::new(),
        }
    }

    fn handles(&self) -> (HDC, HGLRC) {
        let state = self.state.lock();
        (
            HDC(state.hdc as *mut c_void),
            HGLRC(state.hglrc as *mut c_void),
        )
    }

    pub fn get_native_handles(&self) -> Option<(HDC, HGLRC)> {
        let (hdc, hglrc) = self.handles();
        if hdc.is_invalid() || hglrc.is_invalid() {
            None
        } else {
            Some((hdc, hglrc))
        }
    }
}

impl Default for WglDeviceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext for WglDeviceContext {
    fn make_current(&self) -> Result<()> {
        let (hdc, hglrc) = self.handles();
        let initialized = !hdc.is_invalid() && !hglrc.is_invalid();
        current::make_current_with(self.identity.id(), initialized, || unsafe {
            wglMakeCurrent(hdc, hglrc).map_err(Error::from)
        })
    }

    fn make_obsolete(&self) -> Result<()> {
        current::make_obsolete_with(self.identity.id(), || unsafe {
            wglMakeCurrent(HDC::default(), HGLRC::default()).map_err(Error::from)
        })
    }

    fn is_current(&self) -> bool {
        current::is_current(self.identity.id())
    }

    fn get_render_api(&self) -> RenderApi {
        RenderApi::OpenGL
    }
}

impl DeviceContext for WglDeviceContext {
    fn create(&self, info: &DeviceContextCreateInfo) -> Result<()> {
        if self.get_native_handles().is_some() {
            return Err(Error::invalid_param("wgl device context already created"));
        }
        let wgl = wgl()?;
        let window = info.window.cast::<Win32Window>()?;
        let hwnd = window
            .get_native_handle()
            .ok_or_else(|| Error::uninitialized("window has no native handle"))?;

        unsafe {
            // the window class is CS_OWNDC, the dc stays valid for the lifetime of the window
            let hdc = GetDC(hwnd);
            if hdc.is_invalid() {
                return Err(Error::system("GetDC failed"));
            }

            let pixel_attribs = [
                WGL_DRAW_TO_WINDOW_ARB, 1,
                WGL_SUPPORT_OPENGL_ARB, 1,
                WGL_DOUBLE_BUFFER_ARB, 1,
                WGL_ACCELERATION_ARB, WGL_FULL_ACCELERATION_ARB,
                WGL_PIXEL_TYPE_ARB, WGL_TYPE_RGBA_ARB,
                WGL_COLOR_BITS_ARB, 32,
                WGL_DEPTH_BITS_ARB, 24,
                WGL_STENCIL_BITS_ARB, 8,
                0,
            ];
            let mut format = 0;
            let mut count = 0;
            let chosen = (wgl.choose_pixel_format)(
                hdc,
                pixel_attribs.as_ptr(),
                std::ptr::null(),
                1,
                &mut format,
                &mut count,
            );
            if !chosen.as_bool() || count == 0 {
                ReleaseDC(hwnd, hdc);
                return Err(Error::system("wglChoosePixelFormatARB found no pixel format"));
            }
            if let Err(err) = SetPixelFormat(hdc, format, &legacy_pixel_format()) {
                ReleaseDC(hwnd, hdc);
                return Err(err.into());
            }

            let context_attribs = [
                WGL_CONTEXT_MAJOR_VERSION_ARB, GL_MAJOR_VERSION,
                WGL_CONTEXT_MINOR_VERSION_ARB, GL_MINOR_VERSION,
                WGL_CONTEXT_PROFILE_MASK_ARB, WGL_CONTEXT_CORE_PROFILE_BIT_ARB,
                0,
            ];
            let hglrc = (wgl.create_context_attribs)(hdc, HGLRC::default(), context_attribs.as_ptr());
            if hglrc.is_invalid() {
                ReleaseDC(hwnd, hdc);
                return Err(Error::system("wglCreateContextAttribsARB failed"));
            }

            {
                let mut state = self.state.lock();
                state.window = Some(window);
                state.hdc = hdc.0 as isize;
                state.hglrc = hglrc.0 as isize;
            }
        }

        self.make_current()?;
        let gl = unsafe { glow::Context::from_loader_function(|name| wgl.get_proc_address(name)) };
        let version = gl.version();
        log::info!(
            "created OpenGL {}.{} context {} ({})",
            version.major,
            version.minor,
            self.identity.id(),
            version.vendor_info
        );
        let _ = self.gl.set(gl);
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let (hdc, hglrc) = self.handles();
        if !hglrc.is_invalid() {
            self.make_obsolete()?;
            unsafe {
                wglDeleteContext(hglrc)?;
            }
        }
        let mut state = self.state.lock();
        if !hdc.is_invalid() {
            if let Some(hwnd) = state.window.as_ref().and_then(|w| w.get_native_handle()) {
                unsafe {
                    ReleaseDC(hwnd, hdc);
                }
            }
        }
        *state = WglState::default();
        Ok(())
    }

    fn swap_buffers(&self) -> Result<()> {
        let (hdc, _) = self
            .get_native_handles()
            .ok_or_else(|| Error::uninitialized("wgl device context has not been created"))?;
        unsafe {
            SwapBuffers(hdc)?;
        }
        Ok(())
    }

    fn get_window(&self) -> Option<Arc<dyn Window>> {
        self.state
            .lock()
            .window
            .clone()
            .map(|window| window as Arc<dyn Window>)
    }
}

impl GlDeviceContext for WglDeviceContext {
    fn gl(&self) -> Result<&glow::Context> {
        if self.get_native_handles().is_none() {
            return Err(Error::uninitialized("wgl device context has not been created"));
        }
        self.gl
            .get()
            .ok_or_else(|| Error::uninitialized("OpenGL functions have not been loaded"))
    }
}

impl Drop for WglDeviceContext {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::warn!("failed to destroy wgl device context {}: {}", self.identity.id(), err);
        }
    }
}
