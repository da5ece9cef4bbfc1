/// Camera Module - Data-Oriented Programming (DOP) style
///
/// This module follows pure DOP principles:
/// - camera_data.rs: Pure data structures with NO methods
/// - camera_operations.rs: Pure functions that operate on data
///
/// The core only ever sees a `CameraSnapshot`; the free-fly camera and its
/// input snapshot exist for drivers.

pub mod camera_data;
pub mod camera_operations;

pub use camera_data::{CameraData, CameraInput, CameraSnapshot, SceneUniform};

pub use camera_operations::{
    // Initialization
    init_camera,
    init_camera_at_spawn,

    // View/projection
    build_projection_matrix,
    build_scene_uniform,
    build_view_matrix,
    build_view_projection,

    // Updates
    apply_input,
    rotate,
    snapshot,
    update_aspect_ratio,

    // Utilities
    calculate_forward_vector,
    calculate_right_vector,
    log_camera_context,
};
