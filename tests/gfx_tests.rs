use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use blaze::gfx::current;
use blaze::gfx::gl::{GlBuffer, GL_BUFFER_CLASS};
use blaze::gfx::{
    Buffer, BufferAccess, BufferCreateInfo, BufferType, DeviceContext, DeviceContextCreateInfo,
    MappedBuffer, RenderApi, RenderContext, BUFFER_CLASS, DEVICE_CONTEXT_CLASS,
    RENDER_CONTEXT_CLASS,
};
use blaze::object::{ClassId, ImplementationId, InterfaceId, ObjectIdentity, OBJECT_CLASS};
use blaze::os::{Window, WindowApi, WindowCreateInfo};
use blaze::{CastExt, Error, Object, ResultCode};

const FAKE_CONTEXT_CLASS: ClassId =
    ClassId::new(InterfaceId::DeviceContext, ImplementationId::Generic);
const FAKE_BUFFER_CLASS: ClassId = ClassId::new(InterfaceId::Buffer, ImplementationId::Generic);

/// Device context without a native api, binds by flipping a flag
struct FakeContext {
    identity: ObjectIdentity,
    render_api: RenderApi,
    created: AtomicBool,
    binds: AtomicUsize,
    window: Mutex<Option<Arc<dyn Window>>>,
}

blaze::impl_object!(
    FakeContext,
    FAKE_CONTEXT_CLASS,
    [OBJECT_CLASS, RENDER_CONTEXT_CLASS, DEVICE_CONTEXT_CLASS, FAKE_CONTEXT_CLASS],
    into_render_context -> blaze::gfx::RenderContext,
    into_device_context -> blaze::gfx::DeviceContext
);

impl FakeContext {
    fn new(render_api: RenderApi) -> Arc<Self> {
        Arc::new(FakeContext {
            identity: ObjectIdentity::new(FAKE_CONTEXT_CLASS),
            render_api,
            created: AtomicBool::new(false),
            binds: AtomicUsize::new(0),
            window: Mutex::new(None),
        })
    }
}

impl RenderContext for FakeContext {
    fn make_current(&self) -> blaze::Result<()> {
        current::make_current_with(
            self.identity.id(),
            self.created.load(Ordering::SeqCst),
            || {
                self.binds.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    fn make_obsolete(&self) -> blaze::Result<()> {
        current::make_obsolete_with(self.identity.id(), || Ok(()))
    }

    fn is_current(&self) -> bool {
        current::is_current(self.identity.id())
    }

    fn get_render_api(&self) -> RenderApi {
        self.render_api
    }
}

impl DeviceContext for FakeContext {
    fn create(&self, info: &DeviceContextCreateInfo) -> blaze::Result<()> {
        *self.window.lock() = Some(info.window.clone());
        self.created.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> blaze::Result<()> {
        self.make_obsolete()?;
        self.created.store(false, Ordering::SeqCst);
        *self.window.lock() = None;
        Ok(())
    }

    fn swap_buffers(&self) -> blaze::Result<()> {
        if self.created.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::uninitialized("fake context has not been created"))
        }
    }

    fn get_window(&self) -> Option<Arc<dyn Window>> {
        self.window.lock().clone()
    }
}

/// Cpu memory buffer used to exercise mappings
struct FakeBuffer {
    identity: ObjectIdentity,
    data: Mutex<Vec<u8>>,
    mapped: AtomicBool,
}

blaze::impl_object!(
    FakeBuffer,
    FAKE_BUFFER_CLASS,
    [OBJECT_CLASS, BUFFER_CLASS, FAKE_BUFFER_CLASS],
    into_buffer -> blaze::gfx::Buffer
);

impl FakeBuffer {
    fn with_data(data: &[u8]) -> Self {
        FakeBuffer {
            identity: ObjectIdentity::new(FAKE_BUFFER_CLASS),
            data: Mutex::new(data.to_vec()),
            mapped: AtomicBool::new(false),
        }
    }
}

impl Buffer for FakeBuffer {
    fn create(&self, info: &BufferCreateInfo) -> blaze::Result<()> {
        *self.data.lock() = info.data.unwrap_or_default().to_vec();
        Ok(())
    }

    fn destroy(&self) -> blaze::Result<()> {
        self.data.lock().clear();
        Ok(())
    }

    fn get_type(&self) -> BufferType {
        BufferType::Vertex
    }

    fn get_size(&self) -> usize {
        self.data.lock().len()
    }

    fn write(&self, data: &[u8]) -> blaze::Result<()> {
        *self.data.lock() = data.to_vec();
        Ok(())
    }

    fn map_memory(&self, size: usize, _: BufferAccess) -> blaze::Result<NonNull<u8>> {
        let mut data = self.data.lock();
        if size == 0 || size > data.len() || self.mapped.swap(true, Ordering::SeqCst) {
            return Err(Error::invalid_param("bad mapping"));
        }
        NonNull::new(data.as_mut_ptr()).ok_or_else(|| Error::system("null"))
    }

    fn unmap_memory(&self) -> blaze::Result<()> {
        if self.mapped.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::invalid_param("not mapped"))
        }
    }
}

fn headless_window() -> Arc<dyn Window> {
    blaze::os::create_window(&WindowCreateInfo {
        window_api: WindowApi::Headless,
        ..Default::default()
    })
    .unwrap()
}

fn created_context(render_api: RenderApi) -> Arc<FakeContext> {
    let context = FakeContext::new(render_api);
    context
        .create(&DeviceContextCreateInfo {
            window: headless_window(),
            render_api,
        })
        .unwrap();
    context
}

#[test]
fn opengl_is_the_default_render_api() {
    assert_eq!(blaze::gfx::default_render_api(), RenderApi::OpenGL);
    assert!(blaze::gfx::is_render_api_supported(RenderApi::OpenGL));
    assert!(!blaze::gfx::is_render_api_supported(RenderApi::Null));
    let err = blaze::gfx::register_render_backend(
        RenderApi::Null,
        |_| None,
        || -> Arc<dyn Buffer> { Arc::new(GlBuffer::new()) },
    )
    .unwrap_err();
    assert_eq!(err.code(), ResultCode::InvalidParam);
}

#[test]
fn no_device_context_for_headless_windows() {
    let window = headless_window();
    for render_api in [RenderApi::Null, RenderApi::OpenGL] {
        let info = DeviceContextCreateInfo {
            window: window.clone(),
            render_api,
        };
        assert!(blaze::gfx::create_device_context(&info).is_none());
    }
}

#[test]
fn current_context_state_machine() {
    let context = FakeContext::new(RenderApi::OpenGL);
    let err = context.make_current().unwrap_err();
    assert_eq!(err.code(), ResultCode::Uninitialized);
    assert!(!context.is_current());

    let window = headless_window();
    context
        .create(&DeviceContextCreateInfo {
            window: window.clone(),
            render_api: RenderApi::OpenGL,
        })
        .unwrap();
    assert_eq!(
        context.get_window().unwrap().get_object_id(),
        window.get_object_id()
    );

    context.make_current().unwrap();
    context.make_current().unwrap();
    assert!(context.is_current());
    assert_eq!(context.binds.load(Ordering::SeqCst), 1);
    assert_eq!(current::current_context(), Some(context.get_object_id()));

    // a second context replaces the first on this thread
    let other = created_context(RenderApi::OpenGL);
    other.make_current().unwrap();
    assert!(other.is_current());
    assert!(!context.is_current());

    // releasing a context which is not current leaves the slot alone
    context.make_obsolete().unwrap();
    assert!(other.is_current());

    other.make_obsolete().unwrap();
    assert_eq!(current::current_context(), None);

    context.destroy().unwrap();
    assert!(context.get_window().is_none());
    assert_eq!(context.swap_buffers().unwrap_err().code(), ResultCode::Uninitialized);
}

#[test]
fn each_thread_has_its_own_current_context() {
    let main_context = created_context(RenderApi::OpenGL);
    let worker_context = created_context(RenderApi::OpenGL);
    main_context.make_current().unwrap();

    let worker = {
        let main_context = main_context.clone();
        let worker_context = worker_context.clone();
        std::thread::spawn(move || {
            assert_eq!(current::current_context(), None);
            assert!(!main_context.is_current());
            worker_context.make_current().unwrap();
            assert!(worker_context.is_current());
            worker_context.make_obsolete().unwrap();
        })
    };
    worker.join().unwrap();

    assert!(main_context.is_current());
    assert!(!worker_context.is_current());
    main_context.make_obsolete().unwrap();
}

#[test]
fn device_contexts_cast_to_their_interfaces() {
    let context: Arc<dyn DeviceContext> = created_context(RenderApi::OpenGL);
    assert!(context.try_cast::<dyn RenderContext>().is_some());
    assert!(context.try_cast::<FakeContext>().is_some());
    assert!(context.try_cast::<dyn Buffer>().is_none());
    assert!(context.try_cast::<dyn Window>().is_none());
    assert_eq!(
        context.cast::<blaze::gfx::gl::GlBuffer>().err().unwrap().code(),
        ResultCode::InvalidCast
    );
}

#[test]
fn buffer_factory_rejects_unusable_contexts() {
    let data = [0u8; 16];

    // an api without a backend allocates nothing
    #[cfg(debug_assertions)]
    let live_gl_buffers = || {
        blaze::object::live_objects()
            .iter()
            .filter(|id| id.class_id() == GL_BUFFER_CLASS)
            .count()
    };
    #[cfg(debug_assertions)]
    let before = live_gl_buffers();
    let null_context = created_context(RenderApi::Null);
    let buffer = blaze::gfx::create_buffer(&BufferCreateInfo {
        device_context: null_context,
        buffer_type: BufferType::Vertex,
        data: Some(&data),
    });
    assert!(buffer.is_none());
    #[cfg(debug_assertions)]
    assert_eq!(live_gl_buffers(), before);

    // OpenGL buffers need a context exposing the GL function table
    let opengl_context = created_context(RenderApi::OpenGL);
    let buffer = blaze::gfx::create_buffer(&BufferCreateInfo {
        device_context: opengl_context,
        buffer_type: BufferType::Index,
        data: None,
    });
    assert!(buffer.is_none());
}

#[test]
fn mapped_buffer_writes_through_and_unmaps() {
    let buffer = FakeBuffer::with_data(&[0; 8]);
    {
        let mut mapping = MappedBuffer::new(&buffer, 4, BufferAccess::READ_WRITE).unwrap();
        assert_eq!(mapping.len(), 4);
        assert!(!mapping.is_empty());
        mapping.write(&[1, 2, 3]).unwrap();
        assert_eq!(mapping.as_slice(), &[1, 2, 3, 0]);
        assert_eq!(
            mapping.write(&[0; 5]).unwrap_err().code(),
            ResultCode::InvalidParam
        );
        // the buffer stays mapped while the guard lives
        assert!(buffer.map_memory(1, BufferAccess::READ).is_err());
    }
    assert!(buffer.unmap_memory().is_err());
    assert_eq!(*buffer.data.lock(), vec![1, 2, 3, 0, 0, 0, 0, 0]);

    let mut read_only = MappedBuffer::new(&buffer, 2, BufferAccess::READ).unwrap();
    assert_eq!(read_only.access(), BufferAccess::READ);
    assert_eq!(read_only.write(&[9]).unwrap_err().code(), ResultCode::InvalidParam);
    assert_eq!(read_only.as_slice(), &[1, 2]);
    drop(read_only);

    assert!(MappedBuffer::new(&buffer, 9, BufferAccess::READ).is_err());
    assert!(MappedBuffer::new(&buffer, 0, BufferAccess::READ).is_err());
}

#[test]
fn buffer_access_flags() {
    assert_eq!(BufferAccess::READ | BufferAccess::WRITE, BufferAccess::READ_WRITE);
    assert!(BufferAccess::READ_WRITE.contains(BufferAccess::WRITE));
    assert!(!BufferAccess::READ.contains(BufferAccess::WRITE));
}

#[test]
fn uncreated_gl_buffer_reports_uninitialized() {
    let buffer = GlBuffer::new();
    assert_eq!(buffer.get_object_id().class_id(), GL_BUFFER_CLASS);
    assert_eq!(buffer.get_type(), BufferType::Null);
    assert_eq!(buffer.write(&[0; 4]).unwrap_err().code(), ResultCode::Uninitialized);
}
