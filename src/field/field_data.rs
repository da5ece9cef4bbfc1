//! Field data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in field_operations.rs

/// One metaball in normalized [0,1] grid space
///
/// Layout matches a WGSL `vec4<f32>`: xyz = center, w = strength.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Blob {
    pub center: [f32; 3],
    pub strength: f32,
}

/// All blobs for one `(count, time)` pair
#[derive(Debug, Clone, PartialEq)]
pub struct BlobSet {
    pub time: f32,
    pub blobs: Vec<Blob>,
}

/// Dense cubic grid, linearized as `x + y*size + z*size*size`
#[derive(Debug, Clone)]
pub struct ScalarField {
    /// Grid points per axis
    pub size: u32,
    pub values: Vec<f32>,
}
