//! GPU extractor operations - Pure DOP functions
//!
//! One draw of `(N-1)^3 * 15` vertices with no vertex buffers. Each vertex
//! index decodes to a voxel, a triangle slot and a corner; the vertex stage
//! does the rest from the atlas and table textures.

use super::device_caps::{create_validated_render_pipeline, create_validated_shader, ShaderStage};
use super::field_atlas_data::FieldAtlasData;
use super::gpu_extractor_data::{GpuExtractorData, MarchParams, TableTextures, VertexSlot};
use crate::constants::gpu_limits::DEPTH_FORMAT;
use crate::constants::surface::{
    ISO_LEVEL, MAX_TRIANGLES_PER_VOXEL, VERTICES_PER_TRIANGLE, VERTICES_PER_VOXEL,
};
use crate::config::Resolution;
use crate::error::EngineResult;
use crate::marching_cubes::{edge_table_texels, tri_table_texels};

// ============================================================================
// VERTEX INDEX DECODING
// ============================================================================

/// Vertices issued by the index-only draw at `resolution`
pub fn gpu_vertex_count(resolution: Resolution) -> u32 {
    let cells = resolution.cells_per_axis();
    cells * cells * cells * VERTICES_PER_VOXEL
}

/// Split a vertex index the same way `vs_marching` does
#[inline]
pub fn decode_vertex_index(index: u32) -> VertexSlot {
    VertexSlot {
        voxel: index / VERTICES_PER_VOXEL,
        triangle: (index / VERTICES_PER_TRIANGLE) % MAX_TRIANGLES_PER_VOXEL,
        corner: index % VERTICES_PER_TRIANGLE,
    }
}

/// Minimum-corner grid coordinate of a linear voxel index
#[inline]
pub fn voxel_coords(voxel: u32, cells: u32) -> (u32, u32, u32) {
    (voxel % cells, (voxel / cells) % cells, voxel / (cells * cells))
}

// ============================================================================
// TABLE TEXTURES
// ============================================================================

/// Upload the marching cubes tables as integer textures
pub fn create_table_textures(device: &wgpu::Device, queue: &wgpu::Queue) -> TableTextures {
    let tri_texels = tri_table_texels();
    let edge_texels = edge_table_texels();

    let tri_table =
        create_table_texture(device, "Tri Table", wgpu::TextureFormat::R8Uint, 16, 256);
    write_table(queue, &tri_table, &tri_texels, 16, 16, 256);

    let edge_table =
        create_table_texture(device, "Edge Table", wgpu::TextureFormat::R32Uint, 256, 1);
    write_table(
        queue,
        &edge_table,
        bytemuck::cast_slice(&edge_texels),
        256 * 4,
        256,
        1,
    );

    log::info!("[GpuExtractor] Uploaded tri table (16x256) and edge table (256x1)");

    TableTextures {
        tri_view: tri_table.create_view(&wgpu::TextureViewDescriptor::default()),
        tri_table,
        edge_view: edge_table.create_view(&wgpu::TextureViewDescriptor::default()),
        edge_table,
    }
}

fn create_table_texture(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_table(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    bytes: &[u8],
    bytes_per_row: u32,
    width: u32,
    height: u32,
) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

// ============================================================================
// PIPELINE
// ============================================================================

fn vertex_texture_entry(
    binding: u32,
    sample_type: wgpu::TextureSampleType,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Build the index-only marching cubes pipeline bound to `atlas`
///
/// `scene_layout` is group 0, shared with the batched CPU pipeline.
pub fn create_gpu_extractor(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    scene_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    tables: &TableTextures,
    atlas: &FieldAtlasData,
) -> EngineResult<GpuExtractorData> {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("GPU Marching Cubes Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            vertex_texture_entry(1, wgpu::TextureSampleType::Float { filterable: false }),
            vertex_texture_entry(2, wgpu::TextureSampleType::Uint),
            vertex_texture_entry(3, wgpu::TextureSampleType::Uint),
        ],
    });

    let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("GPU Marching Cubes Params"),
        size: std::mem::size_of::<MarchParams>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let source = format!(
        "{}\n{}",
        include_str!("../shaders/surface_lit.wgsl"),
        include_str!("../shaders/gpu_marching_cubes.wgsl")
    );
    let shader = create_validated_shader(
        device,
        "gpu_marching_cubes",
        &source,
        &[
            ("vs_marching", ShaderStage::Vertex),
            ("fs_main", ShaderStage::Fragment),
        ],
    )?;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GPU Marching Cubes Pipeline Layout"),
        bind_group_layouts: &[scene_layout, &bind_group_layout],
        push_constant_ranges: &[],
    });
    let pipeline = create_validated_render_pipeline(
        device,
        &wgpu::RenderPipelineDescriptor {
            label: Some("GPU Marching Cubes Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_marching",
                buffers: &[],
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
            depth_stencil: Some(surface_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        },
    )?;

    let bind_group =
        create_march_bind_group(device, &bind_group_layout, &params_buffer, tables, atlas);
    let mut extractor = GpuExtractorData {
        layout: atlas.layout,
        vertex_count: 0,
        params_buffer,
        bind_group_layout,
        bind_group,
        pipeline,
    };
    apply_atlas_layout(queue, &mut extractor, atlas);
    Ok(extractor)
}

/// Depth state shared by both surface pipelines
pub fn surface_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_march_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    params_buffer: &wgpu::Buffer,
    tables: &TableTextures,
    atlas: &FieldAtlasData,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("GPU Marching Cubes Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&atlas.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&tables.tri_view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&tables.edge_view),
            },
        ],
    })
}

/// Point the extractor at a replacement atlas
pub fn bind_field_atlas(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    extractor: &mut GpuExtractorData,
    tables: &TableTextures,
    atlas: &FieldAtlasData,
) {
    extractor.bind_group = create_march_bind_group(
        device,
        &extractor.bind_group_layout,
        &extractor.params_buffer,
        tables,
        atlas,
    );
    apply_atlas_layout(queue, extractor, atlas);
}

/// Upload the grid layout and size the draw for it
fn apply_atlas_layout(
    queue: &wgpu::Queue,
    extractor: &mut GpuExtractorData,
    atlas: &FieldAtlasData,
) {
    let layout = atlas.layout;
    let params = MarchParams {
        grid_size: layout.grid_size,
        tiles_x: layout.tiles_x,
        tiles_y: layout.tiles_y,
        iso_level: ISO_LEVEL,
    };
    queue.write_buffer(&extractor.params_buffer, 0, bytemuck::bytes_of(&params));

    let cells = layout.grid_size - 1;
    extractor.layout = layout;
    extractor.vertex_count = cells * cells * cells * VERTICES_PER_VOXEL;

    log::info!(
        "[GpuExtractor] Bound {}^3 atlas, {} vertices per draw",
        layout.grid_size,
        extractor.vertex_count
    );
}

/// Record the single index-only draw; group 0 must already be set
pub fn record_extraction<'a>(pass: &mut wgpu::RenderPass<'a>, extractor: &'a GpuExtractorData) {
    pass.set_pipeline(&extractor.pipeline);
    pass.set_bind_group(1, &extractor.bind_group, &[]);
    pass.draw(0..extractor.vertex_count, 0..1);
}
