/// Field Module - Data-Oriented Programming (DOP) style
///
/// - field_data.rs: blob descriptors and the dense scalar grid
/// - field_operations.rs: blob trajectories and the density kernel
///
/// The same kernel is evaluated on the GPU by `shaders/field_atlas.wgsl`.

pub mod field_data;
pub mod field_operations;

pub use field_data::{Blob, BlobSet, ScalarField};
pub use field_operations::{
    blob_strength, compute_blob, compute_blob_set, create_field, density, density_normalized,
    field_index, generate_field, grid_to_normalized,
};
