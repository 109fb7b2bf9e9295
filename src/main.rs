use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use glow::HasContext;

use blaze::config::BlazeConfig;
use blaze::gfx::format::{Format, VertexAttribute, VertexFormat};
use blaze::gfx::gl::GlDeviceContext;
use blaze::gfx::{BufferCreateInfo, BufferType, DeviceContext, DeviceContextCreateInfo};
use blaze::input::{KeyCode, KeyboardInput};
use blaze::os::{EventCode, EventHandler, WindowEvent};
use blaze::CastExt;

const CONFIG_PATH: &str = "blaze.json";

fn log_event(event: &WindowEvent, _: Option<&(dyn Any + Send + Sync)>) {
    log::debug!("{} {:?}", event.window, event.info);
}

fn triangle_vertices() -> Vec<u8> {
    let positions: [f32; 9] = [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0];
    positions.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn clear(context: &Arc<dyn DeviceContext>, frame: u64) {
    let gl_context = match context.try_cast::<dyn GlDeviceContext>() {
        Some(gl_context) => gl_context,
        None => return,
    };
    if let Ok(gl) = gl_context.gl() {
        let t = (frame % 240) as f32 / 240.0;
        unsafe {
            gl.clear_color(0.1, 0.1 + t * 0.2, 0.2, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }
}

fn main() -> blaze::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match BlazeConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("ignoring {}: {}", CONFIG_PATH, err);
            BlazeConfig::default()
        }
    };

    let mut info = config.window_create_info();
    info.event_handlers.push((EventCode::ALL, EventHandler::new(log_event)));

    let window = blaze::os::create_window(&info)
        .ok_or_else(|| blaze::Error::unknown("failed to create the main window"))?;
    let keyboard = KeyboardInput::new(window.clone());

    let context = blaze::gfx::create_device_context(&DeviceContextCreateInfo {
        window: window.clone(),
        render_api: config.render_api,
    });

    let mut layout = VertexFormat::new();
    layout.push_attribute(VertexAttribute {
        format: Format::R32G32B32_Float,
        offset: 0,
    })?;

    let vertices = triangle_vertices();
    let _vertex_buffer = context.as_ref().and_then(|context| {
        blaze::gfx::create_buffer(&BufferCreateInfo {
            device_context: context.clone(),
            buffer_type: BufferType::Vertex,
            data: Some(&vertices),
        })
    });
    log::info!(
        "vertex stride {} bytes, {} vertices",
        layout.stride(),
        vertices.len() / layout.stride()
    );

    let mut frame = 0;
    while window.is_running() {
        window.update();
        if keyboard.is_key_pressed(KeyCode::Escape) {
            window.destroy()?;
            break;
        }
        if let Some(context) = &context {
            clear(context, frame);
            if let Err(err) = context.swap_buffers() {
                log::warn!("swap buffers failed: {}", err);
            }
        }
        frame += 1;
        std::thread::sleep(Duration::from_millis(16));
    }

    log::info!("shutting down after {} frames", frame);
    Ok(())
}
