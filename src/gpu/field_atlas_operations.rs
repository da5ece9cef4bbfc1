//! Field atlas operations - Pure DOP functions
//!
//! Grid point `(x, y, z)` lives in tile `z`, at texel
//! `(tile_x * N + x, tile_y * N + y)` with `tile_x = z % tiles_x` and
//! `tile_y = z / tiles_x`.

use super::device_caps::{create_validated_render_pipeline, create_validated_shader, ShaderStage};
use super::field_atlas_data::{AtlasLayout, FieldAtlasData, FieldParams};
use crate::config::Resolution;
use crate::constants::gpu_limits::{FIELD_ATLAS_FORMAT, MAX_BLOBS};
use crate::error::EngineResult;
use crate::field::{Blob, BlobSet};

// ============================================================================
// LAYOUT
// ============================================================================

pub fn atlas_layout(resolution: Resolution) -> AtlasLayout {
    let grid_size = resolution.size();
    let (tiles_x, tiles_y) = resolution.atlas_tiles();
    AtlasLayout {
        grid_size,
        tiles_x,
        tiles_y,
        width: tiles_x * grid_size,
        height: tiles_y * grid_size,
    }
}

/// Atlas texel holding grid point `(x, y, z)`
#[inline]
pub fn grid_to_texel(layout: &AtlasLayout, x: u32, y: u32, z: u32) -> (u32, u32) {
    let tile_x = z % layout.tiles_x;
    let tile_y = z / layout.tiles_x;
    (
        tile_x * layout.grid_size + x,
        tile_y * layout.grid_size + y,
    )
}

/// Grid point stored at atlas texel `(px, py)`
#[inline]
pub fn texel_to_grid(layout: &AtlasLayout, px: u32, py: u32) -> (u32, u32, u32) {
    let tile_x = px / layout.grid_size;
    let tile_y = py / layout.grid_size;
    (
        px % layout.grid_size,
        py % layout.grid_size,
        tile_y * layout.tiles_x + tile_x,
    )
}

// ============================================================================
// RESOURCES
// ============================================================================

/// Create the atlas texture, its uniforms and the rasterizer pipeline
pub fn create_field_atlas(
    device: &wgpu::Device,
    resolution: Resolution,
) -> EngineResult<FieldAtlasData> {
    let layout = atlas_layout(resolution);
    log::info!(
        "[FieldAtlas] Creating {}x{} atlas ({}x{} tiles of {}^2)",
        layout.width,
        layout.height,
        layout.tiles_x,
        layout.tiles_y,
        layout.grid_size
    );

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Field Atlas"),
        size: wgpu::Extent3d {
            width: layout.width,
            height: layout.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FIELD_ATLAS_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Field Atlas Params"),
        size: std::mem::size_of::<FieldParams>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let blob_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Field Atlas Blobs"),
        size: (MAX_BLOBS * std::mem::size_of::<Blob>()) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Field Atlas Bind Group Layout"),
        entries: &[uniform_entry(0), uniform_entry(1)],
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Field Atlas Bind Group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: blob_buffer.as_entire_binding(),
            },
        ],
    });

    let shader = create_validated_shader(
        device,
        "field_atlas",
        include_str!("../shaders/field_atlas.wgsl"),
        &[
            ("vs_fullscreen", ShaderStage::Vertex),
            ("fs_field", ShaderStage::Fragment),
        ],
    )?;
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Field Atlas Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = create_validated_render_pipeline(
        device,
        &wgpu::RenderPipelineDescriptor {
            label: Some("Field Atlas Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_fullscreen",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_field",
                targets: &[Some(wgpu::ColorTargetState {
                    format: FIELD_ATLAS_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        },
    )?;

    Ok(FieldAtlasData {
        layout,
        texture,
        view,
        params_buffer,
        blob_buffer,
        bind_group,
        pipeline,
    })
}

// ============================================================================
// GENERATION
// ============================================================================

/// Upload this frame's blobs and record the full-atlas rasterizer pass
///
/// Every texel is overwritten, so nothing from the previous frame survives.
pub fn generate_field_atlas(
    queue: &wgpu::Queue,
    encoder: &mut wgpu::CommandEncoder,
    atlas: &FieldAtlasData,
    blobs: &BlobSet,
) {
    let count = blobs.blobs.len().min(MAX_BLOBS);
    if count < blobs.blobs.len() {
        log::warn!(
            "[FieldAtlas] {} blobs requested, only the first {} are rasterized",
            blobs.blobs.len(),
            MAX_BLOBS
        );
    }

    let params = FieldParams {
        grid_size: atlas.layout.grid_size,
        tiles_x: atlas.layout.tiles_x,
        tiles_y: atlas.layout.tiles_y,
        num_blobs: count as u32,
    };
    queue.write_buffer(&atlas.params_buffer, 0, bytemuck::bytes_of(&params));
    if count > 0 {
        queue.write_buffer(
            &atlas.blob_buffer,
            0,
            bytemuck::cast_slice(&blobs.blobs[..count]),
        );
    }

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Field Atlas Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &atlas.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(&atlas.pipeline);
    pass.set_bind_group(0, &atlas.bind_group, &[]);
    pass.draw(0..3, 0..1);
}
