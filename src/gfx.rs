/// Per thread current context slot shared by every rendering backend
pub mod current;

/// Vertex and texel formats
pub mod format;

/// OpenGL backend, native context creation lives in platform submodules
pub mod gl;

use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::object::{Cast, ClassId, InterfaceId, Object, StaticClass};
use crate::os::{Window, WindowApi};
use crate::{Error, Result};

/// Rendering backends, `Null` requests the process default
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderApi {
    #[default]
    Null,
    OpenGL,
}

impl RenderApi {
    pub const INVALID: RenderApi = RenderApi::Null;
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BufferType {
    #[default]
    Null,
    Vertex,
    Index,
}

impl BufferType {
    pub const INVALID: BufferType = BufferType::Null;
}

bitflags! {
    /// Cpu access requested when mapping buffer memory
    pub struct BufferAccess: u32 {
        const READ = 0b01;
        const WRITE = 0b10;
        const READ_WRITE = Self::READ.bits | Self::WRITE.bits;
    }
}

/// Information to create a device context bound to `window`
#[derive(Clone)]
pub struct DeviceContextCreateInfo {
    pub window: Arc<dyn Window>,
    pub render_api: RenderApi,
}

/// Information to create a gpu buffer owned by `device_context`, `data` is the optional initial contents
#[derive(Clone)]
pub struct BufferCreateInfo<'a> {
    pub device_context: Arc<dyn DeviceContext>,
    pub buffer_type: BufferType,
    pub data: Option<&'a [u8]>,
}

/// A graphics api connection which can be bound to the calling thread.
/// At most one context is current per thread and each thread tracks its own.
pub trait RenderContext: Object {
    /// Binds the context to the calling thread, a no-op if it already is.
    /// Fails with `Uninitialized` before the native context exists.
    fn make_current(&self) -> Result<()>;

    /// Unbinds the context from the calling thread, a no-op if it is not current here
    fn make_obsolete(&self) -> Result<()>;

    fn is_current(&self) -> bool;

    fn get_render_api(&self) -> RenderApi;
}

/// A render context attached to a window's surface.
pub trait DeviceContext: RenderContext {
    fn create(&self, info: &DeviceContextCreateInfo) -> Result<()>;

    fn destroy(&self) -> Result<()>;

    /// Presents the back buffer
    fn swap_buffers(&self) -> Result<()>;

    fn get_window(&self) -> Option<Arc<dyn Window>>;
}

/// Gpu resident memory owned by a device context.
/// Every operation makes the owning context current on the calling thread first.
pub trait Buffer: Object {
    fn create(&self, info: &BufferCreateInfo) -> Result<()>;

    fn destroy(&self) -> Result<()>;

    fn get_type(&self) -> BufferType;

    /// Size in bytes of the current contents
    fn get_size(&self) -> usize;

    /// Replaces the whole buffer with `data`
    fn write(&self, data: &[u8]) -> Result<()>;

    /// Maps the first `size` bytes, the pointer is valid until `unmap_memory`.
    /// Prefer `MappedBuffer` which unmaps on drop.
    fn map_memory(&self, size: usize, access: BufferAccess) -> Result<NonNull<u8>>;

    fn unmap_memory(&self) -> Result<()>;
}

pub const RENDER_CONTEXT_CLASS: ClassId = ClassId::of_interface(InterfaceId::RenderContext);
pub const DEVICE_CONTEXT_CLASS: ClassId = ClassId::of_interface(InterfaceId::DeviceContext);
pub const BUFFER_CLASS: ClassId = ClassId::of_interface(InterfaceId::Buffer);

impl StaticClass for dyn RenderContext {
    const CLASS_ID: ClassId = RENDER_CONTEXT_CLASS;
}

impl Cast for dyn RenderContext {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        object.into_render_context()
    }
}

impl StaticClass for dyn DeviceContext {
    const CLASS_ID: ClassId = DEVICE_CONTEXT_CLASS;
}

impl Cast for dyn DeviceContext {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        object.into_device_context()
    }
}

impl StaticClass for dyn Buffer {
    const CLASS_ID: ClassId = BUFFER_CLASS;
}

impl Cast for dyn Buffer {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        object.into_buffer()
    }
}

/// Scoped view of mapped buffer memory, unmapped when dropped
pub struct MappedBuffer<'a> {
    buffer: &'a dyn Buffer,
    ptr: NonNull<u8>,
    len: usize,
    access: BufferAccess,
}

impl<'a> MappedBuffer<'a> {
    pub fn new(buffer: &'a dyn Buffer, size: usize, access: BufferAccess) -> Result<Self> {
        let ptr = buffer.map_memory(size, access)?;
        Ok(MappedBuffer {
            buffer,
            ptr,
            len: size,
            access,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn access(&self) -> BufferAccess {
        self.access
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Copies `data` to the start of the mapping, `InvalidParam` if it does not fit or the mapping is read only
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.access.contains(BufferAccess::WRITE) {
            return Err(Error::invalid_param("mapping was not created with write access"));
        }
        if data.len() > self.len {
            return Err(Error::invalid_param(format!(
                "{} bytes do not fit a {} byte mapping",
                data.len(),
                self.len
            )));
        }
        self.as_mut_slice()[..data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.buffer.unmap_memory() {
            log::warn!("failed to unmap buffer {}: {}", self.buffer.get_object_id(), err);
        }
    }
}

/// Allocates an uncreated device context for windows of `WindowApi`, `None` when the pair is unsupported
pub type DeviceContextAllocator = fn(WindowApi) -> Option<Arc<dyn DeviceContext>>;

/// Allocates an uncreated buffer
pub type BufferAllocator = fn() -> Arc<dyn Buffer>;

#[derive(Clone, Copy)]
struct RenderBackend {
    device_context: DeviceContextAllocator,
    buffer: BufferAllocator,
}

struct RenderBackends {
    default: RenderApi,
    backends: HashMap<RenderApi, RenderBackend>,
}

fn render_backends() -> &'static RwLock<RenderBackends> {
    static BACKENDS: OnceLock<RwLock<RenderBackends>> = OnceLock::new();
    BACKENDS.get_or_init(|| {
        let mut backends = HashMap::new();
        backends.insert(
            RenderApi::OpenGL,
            RenderBackend {
                device_context: gl::allocate_device_context,
                buffer: gl::allocate_buffer,
            },
        );
        RwLock::new(RenderBackends {
            default: RenderApi::OpenGL,
            backends,
        })
    })
}

/// Registers or replaces the allocators used for `api`
pub fn register_render_backend(
    api: RenderApi,
    device_context: DeviceContextAllocator,
    buffer: BufferAllocator,
) -> Result<()> {
    if api == RenderApi::Null {
        return Err(Error::invalid_param("cannot register a backend for RenderApi::Null"));
    }
    render_backends()
        .write()
        .backends
        .insert(api, RenderBackend { device_context, buffer });
    Ok(())
}

/// The api `RenderApi::Null` resolves to
pub fn default_render_api() -> RenderApi {
    render_backends().read().default
}

pub fn is_render_api_supported(api: RenderApi) -> bool {
    render_backends().read().backends.contains_key(&api)
}

fn render_backend(api: RenderApi) -> Option<RenderBackend> {
    render_backends().read().backends.get(&api).copied()
}

/// Creates a device context for `info.window` with the requested api, or the default one when `Null`.
/// Returns `None` when the api is unsupported for the window or creation fails.
pub fn create_device_context(info: &DeviceContextCreateInfo) -> Option<Arc<dyn DeviceContext>> {
    let api = match info.render_api {
        RenderApi::Null => default_render_api(),
        api => api,
    };
    let backend = match render_backend(api) {
        Some(backend) => backend,
        None => {
            log::warn!("render api {:?} is not supported", api);
            return None;
        }
    };
    let window_api = info.window.get_window_api();
    let context = match (backend.device_context)(window_api) {
        Some(context) => context,
        None => {
            log::warn!("render api {:?} has no device context for {:?} windows", api, window_api);
            return None;
        }
    };
    match context.create(info) {
        Ok(()) => {
            log::info!(
                "created {:?} device context {} for window {}",
                api,
                context.get_object_id(),
                info.window.get_object_id()
            );
            Some(context)
        }
        Err(err) => {
            log::warn!("failed to create {:?} device context: {}", api, err);
            None
        }
    }
}

/// Creates a buffer for the render api of `info.device_context`.
/// Returns `None`, without allocating, when that api is unsupported, or when creation fails.
pub fn create_buffer(info: &BufferCreateInfo) -> Option<Arc<dyn Buffer>> {
    let api = info.device_context.get_render_api();
    let backend = match render_backend(api) {
        Some(backend) => backend,
        None => {
            log::warn!("cannot create a buffer for render api {:?}", api);
            return None;
        }
    };
    let buffer = (backend.buffer)();
    match buffer.create(info) {
        Ok(()) => {
            log::debug!(
                "created {:?} buffer {} ({} bytes)",
                info.buffer_type,
                buffer.get_object_id(),
                buffer.get_size()
            );
            Some(buffer)
        }
        Err(err) => {
            log::warn!("failed to create {:?} buffer: {}", api, err);
            None
        }
    }
}
