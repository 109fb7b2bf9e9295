/// Implements OpenGL device contexts for win32 windows through WGL
#[cfg(target_os = "windows")]
pub mod wgl;

use std::ptr::NonNull;
use std::sync::Arc;

use glow::HasContext;
use parking_lot::Mutex;

use crate::gfx::{
    Buffer, BufferAccess, BufferCreateInfo, BufferType, DeviceContext, BUFFER_CLASS,
};
use crate::object::{
    Cast, CastExt, ClassId, ImplementationId, InterfaceId, Object, ObjectIdentity, StaticClass,
    OBJECT_CLASS,
};
use crate::os::WindowApi;
use crate::{Error, Result};

pub const GL_DEVICE_CONTEXT_CLASS: ClassId =
    ClassId::new(InterfaceId::DeviceContext, ImplementationId::OpenGL);
pub const GL_BUFFER_CLASS: ClassId = ClassId::new(InterfaceId::Buffer, ImplementationId::OpenGL);

/// A device context which owns an OpenGL function table
pub trait GlDeviceContext: DeviceContext {
    /// Function table loaded when the native context was created
    fn gl(&self) -> Result<&glow::Context>;

    /// Major and minor version of the created context
    fn gl_version(&self) -> Result<(u32, u32)> {
        let version = self.gl()?.version();
        Ok((version.major, version.minor))
    }
}

impl StaticClass for dyn GlDeviceContext {
    const CLASS_ID: ClassId = GL_DEVICE_CONTEXT_CLASS;
}

impl Cast for dyn GlDeviceContext {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        object.into_gl_device_context()
    }
}

pub fn buffer_type_to_gl_target(buffer_type: BufferType) -> Option<u32> {
    match buffer_type {
        BufferType::Vertex => Some(glow::ARRAY_BUFFER),
        BufferType::Index => Some(glow::ELEMENT_ARRAY_BUFFER),
        BufferType::Null => None,
    }
}

/// `glMapBufferRange` access bits, `None` when neither read nor write is requested
pub fn buffer_access_to_gl_access(access: BufferAccess) -> Option<u32> {
    let mut bits = 0;
    if access.contains(BufferAccess::READ) {
        bits |= glow::MAP_READ_BIT;
    }
    if access.contains(BufferAccess::WRITE) {
        bits |= glow::MAP_WRITE_BIT;
    }
    if bits == 0 {
        None
    } else {
        Some(bits)
    }
}

pub(crate) fn allocate_device_context(window_api: WindowApi) -> Option<Arc<dyn DeviceContext>> {
    match window_api {
        #[cfg(target_os = "windows")]
        WindowApi::Win32 => Some(Arc::new(wgl::WglDeviceContext::new())),
        _ => None,
    }
}

pub(crate) fn allocate_buffer() -> Arc<dyn Buffer> {
    Arc::new(GlBuffer::new())
}

#[derive(Default)]
struct GlBufferState {
    context: Option<Arc<dyn GlDeviceContext>>,
    buffer_type: BufferType,
    buffer: Option<glow::NativeBuffer>,
    size: usize,
    mapped: bool,
}

impl GlBufferState {
    /// Owning context made current on this thread, with the buffer bound to its target
    fn bind(&self) -> Result<(&dyn GlDeviceContext, glow::NativeBuffer, u32)> {
        let (context, buffer) = match (&self.context, self.buffer) {
            (Some(context), Some(buffer)) => (context, buffer),
            _ => return Err(Error::uninitialized("gl buffer has not been created")),
        };
        let target = buffer_type_to_gl_target(self.buffer_type)
            .ok_or_else(|| Error::invalid_param("gl buffer has no type"))?;
        context.make_current()?;
        unsafe {
            context.gl()?.bind_buffer(target, Some(buffer));
        }
        Ok((context.as_ref(), buffer, target))
    }
}

/// OpenGL buffer object, writes use dynamic draw usage
pub struct GlBuffer {
    identity: ObjectIdentity,
    state: Mutex<GlBufferState>,
}

crate::impl_object!(
    GlBuffer,
    GL_BUFFER_CLASS,
    [OBJECT_CLASS, BUFFER_CLASS, GL_BUFFER_CLASS],
    into_buffer -> crate::gfx::Buffer
);

impl GlBuffer {
    pub fn new() -> Self {
        GlBuffer {
            identity: ObjectIdentity::new(GL_BUFFER_CLASS),
            state: Mutex::new(GlBufferState::default()),
        }
    }

    /// Raw buffer name, `None` until created
    pub fn native_buffer(&self) -> Option<glow::NativeBuffer> {
        self.state.lock().buffer
    }
}

impl Default for GlBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer for GlBuffer {
    fn create(&self, info: &BufferCreateInfo) -> Result<()> {
        let mut state = self.state.lock();
        if state.buffer.is_some() {
            return Err(Error::invalid_param("gl buffer already created"));
        }
        let target = buffer_type_to_gl_target(info.buffer_type)
            .ok_or_else(|| Error::invalid_param("buffer type must be Vertex or Index"))?;
        let context = info.device_context.cast::<dyn GlDeviceContext>()?;
        context.make_current()?;
        let gl = context.gl()?;
        let buffer = unsafe { gl.create_buffer() }.map_err(Error::allocation)?;
        let size = match info.data {
            Some(data) if !data.is_empty() => {
                unsafe {
                    gl.bind_buffer(target, Some(buffer));
                    gl.buffer_data_u8_slice(target, data, glow::DYNAMIC_DRAW);
                }
                data.len()
            }
            _ => 0,
        };
        state.buffer_type = info.buffer_type;
        state.buffer = Some(buffer);
        state.size = size;
        state.context = Some(context);
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.buffer.is_none() {
            return Ok(());
        }
        let (context, buffer, target) = state.bind()?;
        let gl = context.gl()?;
        unsafe {
            if state.mapped {
                gl.unmap_buffer(target);
            }
            gl.delete_buffer(buffer);
        }
        *state = GlBufferState::default();
        Ok(())
    }

    fn get_type(&self) -> BufferType {
        self.state.lock().buffer_type
    }

    fn get_size(&self) -> usize {
        self.state.lock().size
    }

    fn write(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.mapped {
            return Err(Error::invalid_param("cannot write a mapped gl buffer"));
        }
        let (context, _, target) = state.bind()?;
        unsafe {
            context
                .gl()?
                .buffer_data_u8_slice(target, data, glow::DYNAMIC_DRAW);
        }
        state.size = data.len();
        Ok(())
    }

    fn map_memory(&self, size: usize, access: BufferAccess) -> Result<NonNull<u8>> {
        let mut state = self.state.lock();
        if state.mapped {
            return Err(Error::invalid_param("gl buffer is already mapped"));
        }
        if size == 0 || size > state.size {
            return Err(Error::invalid_param(format!(
                "cannot map {} bytes of a {} byte buffer",
                size, state.size
            )));
        }
        let gl_access = buffer_access_to_gl_access(access)
            .ok_or_else(|| Error::invalid_param("buffer access must include read or write"))?;
        let (context, _, target) = state.bind()?;
        let ptr = unsafe { context.gl()?.map_buffer_range(target, 0, size as i32, gl_access) };
        let ptr = NonNull::new(ptr).ok_or_else(|| Error::system("glMapBufferRange returned null"))?;
        state.mapped = true;
        Ok(ptr)
    }

    fn unmap_memory(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.mapped {
            return Err(Error::invalid_param("gl buffer is not mapped"));
        }
        let (context, _, target) = state.bind()?;
        unsafe {
            context.gl()?.unmap_buffer(target);
        }
        state.mapped = false;
        Ok(())
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log::warn!("failed to destroy gl buffer {}: {}", self.identity.id(), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_targets() {
        assert_eq!(buffer_type_to_gl_target(BufferType::Vertex), Some(glow::ARRAY_BUFFER));
        assert_eq!(buffer_type_to_gl_target(BufferType::Index), Some(glow::ELEMENT_ARRAY_BUFFER));
        assert_eq!(buffer_type_to_gl_target(BufferType::INVALID), None);
    }

    #[test]
    fn buffer_access_bits() {
        assert_eq!(buffer_access_to_gl_access(BufferAccess::READ), Some(glow::MAP_READ_BIT));
        assert_eq!(buffer_access_to_gl_access(BufferAccess::WRITE), Some(glow::MAP_WRITE_BIT));
        assert_eq!(
            buffer_access_to_gl_access(BufferAccess::READ_WRITE),
            Some(glow::MAP_READ_BIT | glow::MAP_WRITE_BIT)
        );
        assert_eq!(buffer_access_to_gl_access(BufferAccess::empty()), None);
    }

    #[test]
    fn uncreated_buffer() {
        let buffer = GlBuffer::new();
        assert_eq!(buffer.get_size(), 0);
        assert_eq!(buffer.get_type(), BufferType::INVALID);
        assert_eq!(buffer.write(&[1, 2, 3]).unwrap_err().code(), crate::ResultCode::Uninitialized);
        assert_eq!(
            buffer.map_memory(4, BufferAccess::WRITE).unwrap_err().code(),
            crate::ResultCode::InvalidParam
        );
        assert!(buffer.unmap_memory().is_err());
        assert!(buffer.destroy().is_ok());
    }

    #[test]
    fn gl_buffer_casts() {
        let buffer: Arc<dyn Buffer> = allocate_buffer();
        let object = buffer.clone().into_object();
        assert!(crate::try_cast::<dyn Buffer>(&object).is_some());
        assert!(crate::try_cast::<GlBuffer>(&object).is_some());
        assert!(crate::try_cast::<dyn DeviceContext>(&object).is_none());
        assert!(crate::cast_to(&object, OBJECT_CLASS).is_some());
    }
}
