//! Renderer operations - Pure DOP functions
//!
//! Frame pipeline: the CPU path generates the field, extracts into pooled
//! vertex buffers and replays one draw per flush; the GPU path rasterizes
//! the atlas and issues the index-only draw. The atlas pass ends before the
//! surface pass begins, which orders the atlas writes before the reads.

use super::cpu_submitter::{create_batch_pool, create_submitter, BATCH_VERTEX_LAYOUTS};
use super::renderer_data::{
    DepthTarget, FrameInput, FrameStats, ResourceSizes, SurfaceRendererData,
};
use crate::camera::{build_scene_uniform, SceneUniform};
use crate::config::{BlobCount, RenderMode, Resolution, SurfaceSettings};
use crate::constants::batching::BATCH_CAPACITY;
use crate::constants::gpu_limits::DEPTH_FORMAT;
use crate::constants::lighting::{CPU_CLEAR_COLOR, GPU_CLEAR_COLOR};
use crate::error::{EngineError, EngineResult};
use crate::field::compute_blob_set;
use crate::gpu::{self, ShaderStage};
use crate::marching_cubes::{self, ExtractionStats};

// ============================================================================
// DEVICE
// ============================================================================

/// Request a device after confirming the adapter can run both paths
pub fn request_device(adapter: &wgpu::Adapter) -> EngineResult<(wgpu::Device, wgpu::Queue)> {
    gpu::check_device_capabilities(adapter)?;

    let descriptor = wgpu::DeviceDescriptor {
        label: Some("Metaball Surface Device"),
        required_features: wgpu::Features::empty(),
        required_limits: gpu::required_limits(adapter),
    };
    pollster::block_on(adapter.request_device(&descriptor, None)).map_err(|e| {
        log::error!("[Renderer] Device request failed: {}", e);
        EngineError::DeviceRequest(e.to_string())
    })
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Build both extraction paths for `settings`
pub fn create_renderer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    color_format: wgpu::TextureFormat,
    settings: SurfaceSettings,
) -> EngineResult<SurfaceRendererData> {
    log::info!(
        "[Renderer] Creating surface renderer: resolution={}, blobs={}, format={:?}",
        settings.resolution.size(),
        settings.blob_count.count(),
        color_format
    );

    let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Uniforms"),
        size: std::mem::size_of::<SceneUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Scene Bind Group Layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });
    let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Scene Bind Group"),
        layout: &scene_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: scene_buffer.as_entire_binding(),
        }],
    });

    let batched_pipeline = create_batched_pipeline(device, &scene_layout, color_format)?;
    let cpu_extractor = marching_cubes::create_cpu_extractor(settings.resolution);

    let atlas = gpu::create_field_atlas(device, settings.resolution)?;
    let tables = gpu::create_table_textures(device, queue);
    let gpu_extractor =
        gpu::create_gpu_extractor(device, queue, &scene_layout, color_format, &tables, &atlas)?;

    Ok(SurfaceRendererData {
        settings,
        color_format,
        scene_buffer,
        scene_layout,
        scene_bind_group,
        cpu_extractor,
        batched_pipeline,
        batch_pool: create_batch_pool(BATCH_CAPACITY),
        atlas,
        tables,
        gpu_extractor,
    })
}

fn create_batched_pipeline(
    device: &wgpu::Device,
    scene_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
) -> EngineResult<wgpu::RenderPipeline> {
    let shader = gpu::create_validated_shader(
        device,
        "surface_lit",
        include_str!("../shaders/surface_lit.wgsl"),
        &[
            ("vs_batched", ShaderStage::Vertex),
            ("fs_main", ShaderStage::Fragment),
        ],
    )?;
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Batched Surface Pipeline Layout"),
        bind_group_layouts: &[scene_layout],
        push_constant_ranges: &[],
    });

    gpu::create_validated_render_pipeline(
        device,
        &wgpu::RenderPipelineDescriptor {
            label: Some("Batched Surface Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_batched",
                buffers: &BATCH_VERTEX_LAYOUTS,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(gpu::surface_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        },
    )
}

/// Depth buffer matching the color target size
pub fn create_depth_target(device: &wgpu::Device, width: u32, height: u32) -> DepthTarget {
    let width = width.max(1);
    let height = height.max(1);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Surface Depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    DepthTarget {
        texture,
        view,
        width,
        height,
    }
}

// ============================================================================
// CONFIGURATION CHANGES
// ============================================================================

/// Reallocate every resolution-sized resource
///
/// The replaced atlas and bind group are dropped here; wgpu keeps them alive
/// until any submitted frame that uses them has finished.
pub fn set_resolution(
    renderer: &mut SurfaceRendererData,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    resolution: Resolution,
) -> EngineResult<()> {
    if renderer.settings.resolution == resolution {
        return Ok(());
    }
    log::info!(
        "[Renderer] Switching resolution {} -> {}",
        renderer.settings.resolution.size(),
        resolution.size()
    );

    let atlas = gpu::create_field_atlas(device, resolution)?;
    gpu::bind_field_atlas(
        device,
        queue,
        &mut renderer.gpu_extractor,
        &renderer.tables,
        &atlas,
    );
    renderer.atlas = atlas;
    marching_cubes::resize_cpu_extractor(&mut renderer.cpu_extractor, resolution);
    renderer.settings.resolution = resolution;
    Ok(())
}

pub fn set_blob_count(renderer: &mut SurfaceRendererData, blob_count: BlobCount) {
    if renderer.settings.blob_count != blob_count {
        log::info!("[Renderer] Blob count -> {}", blob_count.count());
        renderer.settings.blob_count = blob_count;
    }
}

pub fn resource_sizes(renderer: &SurfaceRendererData) -> ResourceSizes {
    ResourceSizes {
        grid_size: renderer.cpu_extractor.size,
        field_len: renderer.cpu_extractor.field.values.len(),
        normal_cache_len: renderer.cpu_extractor.normals.gradients.len(),
        atlas_width: renderer.atlas.layout.width,
        atlas_height: renderer.atlas.layout.height,
        gpu_vertex_count: renderer.gpu_extractor.vertex_count,
    }
}

// ============================================================================
// FRAME
// ============================================================================

/// Render one frame into `color_view`/`depth_view` and submit it
pub fn render_frame(
    renderer: &mut SurfaceRendererData,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    frame: &FrameInput,
    color_view: &wgpu::TextureView,
    depth_view: &wgpu::TextureView,
) -> FrameStats {
    let scene = build_scene_uniform(&frame.camera, frame.aspect_ratio);
    queue.write_buffer(&renderer.scene_buffer, 0, bytemuck::bytes_of(&scene));

    let blobs = compute_blob_set(renderer.settings.blob_count.count(), frame.time);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Surface Frame Encoder"),
    });

    let stats = match frame.mode {
        RenderMode::Cpu => {
            let mut submitter = create_submitter(device, queue, &mut renderer.batch_pool);
            let extraction = marching_cubes::run_cpu_frame(
                &mut renderer.cpu_extractor,
                &blobs,
                &mut submitter,
            );
            let draws = submitter.draws;

            let mut pass =
                begin_surface_pass(&mut encoder, color_view, depth_view, CPU_CLEAR_COLOR);
            pass.set_pipeline(&renderer.batched_pipeline);
            pass.set_bind_group(0, &renderer.scene_bind_group, &[]);
            for (buffers, &count) in renderer.batch_pool.buffers.iter().zip(&draws) {
                let bytes = count as u64 * 12;
                pass.set_vertex_buffer(0, buffers.positions.slice(..bytes));
                pass.set_vertex_buffer(1, buffers.normals.slice(..bytes));
                pass.draw(0..count, 0..1);
            }
            drop(pass);

            cpu_frame_stats(&extraction, &draws)
        }
        RenderMode::Gpu => {
            gpu::generate_field_atlas(queue, &mut encoder, &renderer.atlas, &blobs);

            let mut pass =
                begin_surface_pass(&mut encoder, color_view, depth_view, GPU_CLEAR_COLOR);
            pass.set_bind_group(0, &renderer.scene_bind_group, &[]);
            gpu::record_extraction(&mut pass, &renderer.gpu_extractor);
            drop(pass);

            FrameStats {
                mode: RenderMode::Gpu,
                draw_calls: 1,
                vertices: renderer.gpu_extractor.vertex_count,
                triangles: 0,
            }
        }
    };

    queue.submit(std::iter::once(encoder.finish()));
    log::debug!(
        "[Renderer] {:?} frame: {} draws, {} vertices, {} triangles",
        stats.mode,
        stats.draw_calls,
        stats.vertices,
        stats.triangles
    );
    stats
}

fn cpu_frame_stats(extraction: &ExtractionStats, draws: &[u32]) -> FrameStats {
    FrameStats {
        mode: RenderMode::Cpu,
        draw_calls: draws.len() as u32,
        vertices: draws.iter().sum(),
        triangles: extraction.triangles as u32,
    }
}

fn begin_surface_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    color_view: &'a wgpu::TextureView,
    depth_view: &'a wgpu::TextureView,
    clear_color: wgpu::Color,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Surface Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_frame_stats_sum_draws() {
        let extraction = ExtractionStats {
            voxels_visited: 10,
            voxels_empty: 4,
            triangles: 1400,
            draw_calls: 2,
        };
        let stats = cpu_frame_stats(&extraction, &[4092, 108]);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.vertices, 4200);
        assert_eq!(stats.triangles, 1400);
        assert_eq!(stats.mode, RenderMode::Cpu);
    }
}
