//! Device capability checks and validated shader creation
//!
//! Missing capabilities and shader errors are initialization failures. wgpu
//! reports validation errors asynchronously, so creation runs inside an error
//! scope that is popped synchronously with pollster.

use crate::constants::gpu_limits::FIELD_ATLAS_FORMAT;
use crate::error::{EngineError, EngineResult};

/// Textures the marching cubes vertex stage reads
const VERTEX_STAGE_TEXTURES: u32 = 3;

/// Largest atlas edge across all resolution presets (128 * 16)
const MAX_ATLAS_DIMENSION: u32 = 2048;

/// Pipeline stage an entry point must be annotated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

fn stage_attribute(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "@vertex",
        ShaderStage::Fragment => "@fragment",
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Reject adapters that cannot run both extraction paths
pub fn check_device_capabilities(adapter: &wgpu::Adapter) -> EngineResult<()> {
    let info = adapter.get_info();
    log::info!(
        "[DeviceCaps] Adapter: {} ({:?}, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let atlas_usages = adapter
        .get_texture_format_features(FIELD_ATLAS_FORMAT)
        .allowed_usages;
    if !atlas_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
        return fail(format!("{:?} render target", FIELD_ATLAS_FORMAT));
    }
    if !atlas_usages.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        return fail(format!("{:?} texture sampling", FIELD_ATLAS_FORMAT));
    }

    let limits = adapter.limits();
    if limits.max_sampled_textures_per_shader_stage < VERTEX_STAGE_TEXTURES {
        return fail(format!(
            "{} sampled textures per stage (adapter allows {})",
            VERTEX_STAGE_TEXTURES, limits.max_sampled_textures_per_shader_stage
        ));
    }
    if limits.max_texture_dimension_2d < MAX_ATLAS_DIMENSION {
        return fail(format!(
            "2D textures of {} texels (adapter allows {})",
            MAX_ATLAS_DIMENSION, limits.max_texture_dimension_2d
        ));
    }

    log::info!("[DeviceCaps] Adapter supports float atlas rendering and vertex texture reads");
    Ok(())
}

fn fail(capability: String) -> EngineResult<()> {
    log::error!("[DeviceCaps] Missing capability: {}", capability);
    Err(EngineError::MissingCapability { capability })
}

/// Device limits to request: WebGL2 baseline raised to what the adapter offers
pub fn required_limits(adapter: &wgpu::Adapter) -> wgpu::Limits {
    wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
}

// ============================================================================
// SHADER VALIDATION
// ============================================================================

/// Check that `entry_point` is defined and carries the stage attribute
pub fn validate_shader_entry_point(
    shader_source: &str,
    entry_point: &str,
    stage: ShaderStage,
) -> Result<(), String> {
    let fn_pattern = format!("fn {}(", entry_point);
    let lines: Vec<&str> = shader_source.lines().collect();

    let Some(line_index) = lines.iter().position(|line| line.contains(&fn_pattern)) else {
        return Err(format!(
            "Entry point '{}' not found in shader. Available functions: {}",
            entry_point,
            extract_function_names(shader_source).join(", ")
        ));
    };

    let attribute = stage_attribute(stage);
    // Attributes sit on the lines directly above the function
    for prev_line in lines[..line_index].iter().rev().map(|l| l.trim()) {
        if prev_line.is_empty() || prev_line.starts_with("//") {
            continue;
        }
        if prev_line.contains(attribute) {
            return Ok(());
        }
        if !prev_line.starts_with('@') {
            break;
        }
    }

    Err(format!(
        "Entry point '{}' found but missing {} annotation",
        entry_point, attribute
    ))
}

/// Extract function names from shader source for debugging
pub fn extract_function_names(shader_source: &str) -> Vec<String> {
    shader_source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("fn "))
        .filter_map(|rest| rest.find('(').map(|end| rest[..end].trim().to_string()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Compile WGSL after checking its entry points, surfacing naga errors
pub fn create_validated_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_points: &[(&str, ShaderStage)],
) -> EngineResult<wgpu::ShaderModule> {
    for &(entry_point, stage) in entry_points {
        validate_shader_entry_point(source, entry_point, stage).map_err(|error| {
            log::error!("[DeviceCaps] Shader '{}' rejected: {}", label, error);
            EngineError::ShaderCompilation {
                label: label.to_string(),
                error,
            }
        })?;
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    pop_validation_scope(device, label)?;

    log::info!("[DeviceCaps] Compiled shader '{}'", label);
    Ok(module)
}

/// Create a render pipeline inside a validation error scope
pub fn create_validated_render_pipeline(
    device: &wgpu::Device,
    descriptor: &wgpu::RenderPipelineDescriptor,
) -> EngineResult<wgpu::RenderPipeline> {
    let label = descriptor.label.unwrap_or("unnamed pipeline");
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(descriptor);
    pop_validation_scope(device, label)?;

    log::info!("[DeviceCaps] Created pipeline '{}'", label);
    Ok(pipeline)
}

fn pop_validation_scope(device: &wgpu::Device, label: &str) -> EngineResult<()> {
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(()),
        Some(error) => {
            log::error!("[DeviceCaps] Validation failed for '{}': {}", label, error);
            Err(EngineError::ShaderCompilation {
                label: label.to_string(),
                error: error.to_string(),
            })
        }
    }
}
