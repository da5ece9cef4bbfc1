//! Field atlas data structures - Pure DOP
//!
//! NO METHODS. Just data.

use crate::field::Blob;
use static_assertions::const_assert_eq;

/// Placement of the grid's Z-slices inside the 2D atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    pub grid_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// tiles_x * grid_size
    pub width: u32,
    /// tiles_y * grid_size
    pub height: u32,
}

/// Must match `FieldParams` in field_atlas.wgsl
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldParams {
    pub grid_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub num_blobs: u32,
}

const_assert_eq!(std::mem::size_of::<FieldParams>() % 16, 0);

// One blob per WGSL vec4<f32> slot
const_assert_eq!(std::mem::size_of::<Blob>(), 16);

/// R32Float render target holding one density per grid point
pub struct FieldAtlasData {
    pub layout: AtlasLayout,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub params_buffer: wgpu::Buffer,
    /// MAX_BLOBS vec4 slots; only the first `num_blobs` are read
    pub blob_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
}
