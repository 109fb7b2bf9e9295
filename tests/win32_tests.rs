#![cfg(target_os = "windows")]

use std::sync::Arc;

use blaze::gfx::gl::wgl::WglDeviceContext;
use blaze::gfx::gl::GlDeviceContext;
use blaze::gfx::{
    BufferAccess, BufferCreateInfo, BufferType, DeviceContext, DeviceContextCreateInfo,
    MappedBuffer, RenderApi, RenderContext,
};
use blaze::os::win32::Win32Window;
use blaze::os::{Point, Size, Window, WindowApi, WindowCreateInfo};
use blaze::CastExt;

fn create_window(title: &str) -> Arc<dyn Window> {
    blaze::os::create_window(&WindowCreateInfo {
        title: String::from(title),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn win32_is_the_default_window_api() {
    assert_eq!(blaze::os::default_window_api(), WindowApi::Win32);
    let window = create_window("default api");
    assert_eq!(window.get_window_api(), WindowApi::Win32);
    let native = window.try_cast::<Win32Window>().unwrap();
    assert!(native.get_native_handle().is_some());
}

#[test]
fn client_area_geometry() {
    let window = create_window("geometry");
    assert_eq!(window.get_position().unwrap(), Point { x: 200, y: 100 });
    assert_eq!(window.get_client_size().unwrap(), Size { width: 960, height: 540 });
    let outer = window.get_window_size().unwrap();
    assert!(outer.width >= 960 && outer.height >= 540);

    window.resize(640, 360).unwrap();
    assert_eq!(window.get_client_size().unwrap(), Size { width: 640, height: 360 });

    window.move_to(50, 60).unwrap();
    assert_eq!(window.get_position().unwrap(), Point { x: 50, y: 60 });
}

#[test]
fn title_round_trips() {
    let window = create_window("first");
    assert_eq!(window.get_title().unwrap(), "first");
    window.set_title("second title").unwrap();
    assert_eq!(window.get_title().unwrap(), "second title");
    window.set_title("").unwrap();
    assert_eq!(window.get_title().unwrap(), "");
}

#[test]
fn destroy_stops_the_window() {
    let window = create_window("destroy");
    window.update();
    assert!(window.is_running());
    window.destroy().unwrap();
    assert!(!window.is_running());
    let native = window.try_cast::<Win32Window>().unwrap();
    assert!(native.get_native_handle().is_none());
}

#[test]
fn wgl_context_and_buffers() {
    let window = create_window("wgl");
    let context = blaze::gfx::create_device_context(&DeviceContextCreateInfo {
        window: window.clone(),
        render_api: RenderApi::Null,
    })
    .unwrap();
    assert_eq!(context.get_render_api(), RenderApi::OpenGL);
    assert!(context.is_current());
    assert!(context.try_cast::<WglDeviceContext>().is_some());
    assert_eq!(
        context.get_window().unwrap().get_object_id(),
        window.get_object_id()
    );

    let gl_context = context.cast::<dyn GlDeviceContext>().unwrap();
    let (major, minor) = gl_context.gl_version().unwrap();
    assert!((major, minor) >= (3, 3));

    let data: Vec<u8> = (0..64).collect();
    let buffer = blaze::gfx::create_buffer(&BufferCreateInfo {
        device_context: context.clone(),
        buffer_type: BufferType::Vertex,
        data: Some(&data),
    })
    .unwrap();
    assert_eq!(buffer.get_size(), 64);
    assert_eq!(buffer.get_type(), BufferType::Vertex);

    {
        let mut mapping = MappedBuffer::new(buffer.as_ref(), 16, BufferAccess::READ_WRITE).unwrap();
        assert_eq!(mapping.as_slice()[..4], [0, 1, 2, 3]);
        mapping.write(&[9, 9]).unwrap();
    }
    buffer.write(&[1, 2, 3]).unwrap();
    assert_eq!(buffer.get_size(), 3);

    context.swap_buffers().unwrap();
    context.make_obsolete().unwrap();
    assert!(!context.is_current());
    buffer.destroy().unwrap();
    context.destroy().unwrap();
}

#[test]
fn drop_on_another_thread_detaches_the_native_window() {
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        DestroyWindow, GetWindowLongPtrW, SendMessageW, GWLP_USERDATA, WM_MOUSEMOVE,
    };

    let window = create_window("cross thread drop");
    let hwnd = window
        .try_cast::<Win32Window>()
        .unwrap()
        .get_native_handle()
        .unwrap();
    unsafe {
        assert_ne!(GetWindowLongPtrW(hwnd, GWLP_USERDATA), 0);
    }

    std::thread::spawn(move || drop(window)).join().unwrap();

    // the native window still belongs to this thread and must not reach the freed object
    unsafe {
        assert_eq!(GetWindowLongPtrW(hwnd, GWLP_USERDATA), 0);
        SendMessageW(hwnd, WM_MOUSEMOVE, WPARAM(0), LPARAM(0x0005_0004));
        DestroyWindow(hwnd).unwrap();
    }
}
