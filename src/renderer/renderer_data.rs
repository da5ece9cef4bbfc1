//! Renderer data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in renderer_operations.rs

use crate::camera::CameraSnapshot;
use crate::config::{RenderMode, SurfaceSettings};
use crate::gpu::{FieldAtlasData, GpuExtractorData, TableTextures};
use crate::marching_cubes::CpuExtractorData;

/// Everything the core needs from its collaborators for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Animation time in seconds
    pub time: f32,
    pub camera: CameraSnapshot,
    pub aspect_ratio: f32,
    pub mode: RenderMode,
}

/// Current allocation sizes, all functions of the active resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSizes {
    pub grid_size: u32,
    pub field_len: usize,
    pub normal_cache_len: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub gpu_vertex_count: u32,
}

/// What one frame submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub mode: RenderMode,
    pub draw_calls: u32,
    /// Vertices issued to the rasterizer
    pub vertices: u32,
    /// Triangles emitted by the CPU path; 0 in GPU mode (never read back)
    pub triangles: u32,
}

/// Vertex buffers for one flushed batch
pub struct BatchBuffers {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
}

/// One buffer pair per flush of the current frame
///
/// Grows on demand and is reused by later frames. Separate buffers per flush
/// keep every queued upload intact until the single submit.
pub struct BatchBufferPool {
    /// Vertices per buffer pair
    pub capacity: usize,
    pub buffers: Vec<BatchBuffers>,
}

pub struct DepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// Both extraction paths plus the shared scene state
pub struct SurfaceRendererData {
    pub settings: SurfaceSettings,
    pub color_format: wgpu::TextureFormat,

    // Group 0, shared by both pipelines
    pub scene_buffer: wgpu::Buffer,
    pub scene_layout: wgpu::BindGroupLayout,
    pub scene_bind_group: wgpu::BindGroup,

    // CPU path
    pub cpu_extractor: CpuExtractorData,
    pub batched_pipeline: wgpu::RenderPipeline,
    pub batch_pool: BatchBufferPool,

    // GPU path
    pub atlas: FieldAtlasData,
    pub tables: TableTextures,
    pub gpu_extractor: GpuExtractorData,
}
