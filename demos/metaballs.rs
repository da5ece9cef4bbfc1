//! Interactive metaball viewer
//!
//! Controls:
//!   WASD / Q / E   move (Q down, E up)
//!   left drag      look around
//!   Tab            toggle CPU / GPU extraction
//!   1-4            1, 10, 50, 100 blobs
//!   5-8            16, 32, 64, 128 grid resolution
//!   Esc            quit
//!
//! Usage: cargo run --example metaballs [config.toml]

use anyhow::{anyhow, Context};
use metaball_surface::{
    camera::{self, CameraData, CameraInput},
    load_config, BlobCount, EngineError, FrameInput, Resolution, SurfaceConfig,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => {
            let config = SurfaceConfig::default();
            config.validate()?;
            config
        }
    };
    let mut settings = config.settings()?;
    let mut mode = config.mode;

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.as_str())
            .with_inner_size(PhysicalSize::new(config.window_width, config.window_height))
            .build(&event_loop)?,
    );

    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .map_err(|e| EngineError::Surface(e.to_string()))?;
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
    }))
    .ok_or(EngineError::AdapterNotFound)?;
    let (device, queue) = metaball_surface::request_device(&adapter)?;

    let size = window.inner_size();
    let mut surface_config = surface
        .get_default_config(&adapter, size.width.max(1), size.height.max(1))
        .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
    let capabilities = surface.get_capabilities(&adapter);
    if let Some(srgb) = capabilities.formats.iter().copied().find(|f| f.is_srgb()) {
        surface_config.format = srgb;
    }
    surface.configure(&device, &surface_config);

    let mut renderer =
        metaball_surface::create_renderer(&device, &queue, surface_config.format, settings)
            .context("failed to build the surface renderer")?;
    let mut depth =
        metaball_surface::create_depth_target(&device, surface_config.width, surface_config.height);

    let mut camera_data: CameraData = camera::init_camera_at_spawn();
    camera_data.movement_speed = config.camera_speed;
    camera_data.rotation_sensitivity = config.mouse_sensitivity;
    camera_data = camera::update_aspect_ratio(&camera_data, size.width, size.height);

    let mut input = CameraInput::default();
    let mut dragging = false;

    let start = Instant::now();
    let mut last_frame = start;
    let mut fps_window = start;
    let mut fps_frames = 0u32;

    log::info!("[Demo] Running in {:?} mode", mode);

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(new_size) => {
                surface_config.width = new_size.width.max(1);
                surface_config.height = new_size.height.max(1);
                surface.configure(&device, &surface_config);
                depth = metaball_surface::create_depth_target(
                    &device,
                    surface_config.width,
                    surface_config.height,
                );
                camera_data =
                    camera::update_aspect_ratio(&camera_data, new_size.width, new_size.height);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => dragging = state == ElementState::Pressed,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                match code {
                    KeyCode::KeyW => input.forward = pressed,
                    KeyCode::KeyS => input.back = pressed,
                    KeyCode::KeyA => input.left = pressed,
                    KeyCode::KeyD => input.right = pressed,
                    KeyCode::KeyQ => input.down = pressed,
                    KeyCode::KeyE => input.up = pressed,
                    KeyCode::Escape if pressed => elwt.exit(),
                    KeyCode::Tab if pressed && !repeat => {
                        mode = mode.toggled();
                        log::info!("[Demo] Switched to {:?} mode", mode);
                    }
                    _ if pressed && !repeat => {
                        if let Some(count) = blob_preset(code) {
                            settings.blob_count = count;
                            metaball_surface::set_blob_count(&mut renderer, count);
                        } else if let Some(resolution) = resolution_preset(code) {
                            match metaball_surface::set_resolution(
                                &mut renderer,
                                &device,
                                &queue,
                                resolution,
                            ) {
                                Ok(()) => settings.resolution = resolution,
                                Err(e) => log::error!("[Demo] Resolution switch failed: {}", e),
                            }
                        }
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let delta_time = (now - last_frame).as_secs_f32();
                last_frame = now;

                camera_data = camera::apply_input(&camera_data, &input, delta_time);
                input.look_delta = [0.0, 0.0];

                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        surface.configure(&device, &surface_config);
                        return;
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("[Demo] Surface out of memory");
                        elwt.exit();
                        return;
                    }
                    Err(e) => {
                        log::warn!("[Demo] Skipping frame: {}", e);
                        return;
                    }
                };
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                let input_frame = FrameInput {
                    time: (now - start).as_secs_f32(),
                    camera: camera::snapshot(&camera_data),
                    aspect_ratio: camera_data.aspect_ratio,
                    mode,
                };
                metaball_surface::render_frame(
                    &mut renderer,
                    &device,
                    &queue,
                    &input_frame,
                    &view,
                    &depth.view,
                );
                frame.present();

                fps_frames += 1;
                let elapsed = (now - fps_window).as_secs_f32();
                if elapsed >= 1.0 {
                    log::info!(
                        "[Demo] {:.1} FPS | {:?} | resolution {} | {} blobs",
                        fps_frames as f32 / elapsed,
                        mode,
                        settings.resolution.size(),
                        settings.blob_count.count()
                    );
                    camera::log_camera_context(&camera_data);
                    fps_frames = 0;
                    fps_window = now;
                }
            }
            _ => {}
        },
        Event::DeviceEvent {
            event: DeviceEvent::MouseMotion { delta },
            ..
        } if dragging => {
            input.look_delta[0] += delta.0 as f32;
            input.look_delta[1] += delta.1 as f32;
        }
        Event::AboutToWait => window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}

fn blob_preset(code: KeyCode) -> Option<BlobCount> {
    match code {
        KeyCode::Digit1 => Some(BlobCount::One),
        KeyCode::Digit2 => Some(BlobCount::Ten),
        KeyCode::Digit3 => Some(BlobCount::Fifty),
        KeyCode::Digit4 => Some(BlobCount::Hundred),
        _ => None,
    }
}

fn resolution_preset(code: KeyCode) -> Option<Resolution> {
    match code {
        KeyCode::Digit5 => Some(Resolution::R16),
        KeyCode::Digit6 => Some(Resolution::R32),
        KeyCode::Digit7 => Some(Resolution::R64),
        KeyCode::Digit8 => Some(Resolution::R128),
        _ => None,
    }
}
