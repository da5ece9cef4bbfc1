/// Batch Module - Data-Oriented Programming (DOP) style
///
/// Immediate-mode vertex batching with fixed-capacity attribute arrays:
/// - batch_data.rs: the batch arrays and counters
/// - batch_operations.rs: begin/append/flush/end
/// - submitter.rs: the draw-submission seam and a collecting submitter

pub mod batch_data;
pub mod batch_operations;
pub mod submitter;

pub use batch_data::{PrimitiveKind, TriangleBatchData};
pub use batch_operations::{
    append_pos_normal_triangle, begin, create_batch, end, flush, next_vertex, set_color,
    set_normal, set_position, set_uv,
};
pub use submitter::{CollectedMesh, DrawSubmitter};
