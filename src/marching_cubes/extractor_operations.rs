//! CPU extractor operations - Pure DOP functions
//!
//! Frame lifecycle: `load_field` -> `clear_normals` -> `polygonize_voxel` for
//! every voxel -> final flush. `extract_surface` runs the last three steps.

use super::extractor_data::{CpuExtractorData, ExtractionStats, ExtractorStage, NormalCacheData};
use super::tables::{cube_index, CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::batch::{self, DrawSubmitter, PrimitiveKind};
use crate::config::Resolution;
use crate::constants::batching::BATCH_CAPACITY;
use crate::constants::surface::{ISO_LEVEL, TRI_TABLE_END};
use crate::field::{self, BlobSet, ScalarField};
use bit_vec::BitVec;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Allocate every CPU-side buffer for `resolution`
pub fn create_cpu_extractor(resolution: Resolution) -> CpuExtractorData {
    let size = resolution.size();
    let points = (size * size * size) as usize;

    log::info!(
        "[CpuExtractor] Allocating {}^3 grid ({} points, {} voxels)",
        size,
        points,
        resolution.cells_per_axis().pow(3)
    );

    CpuExtractorData {
        resolution,
        size,
        y_stride: size as usize,
        z_stride: (size * size) as usize,
        field: field::create_field(resolution),
        normals: NormalCacheData {
            gradients: vec![[0.0; 3]; points],
            computed: BitVec::from_elem(points, false),
        },
        edge_positions: [[0.0; 3]; 12],
        edge_normals: [[0.0; 3]; 12],
        batch: batch::create_batch(BATCH_CAPACITY),
        stage: ExtractorStage::Empty,
        stats: ExtractionStats::default(),
    }
}

/// Replace all buffers with ones sized for `resolution`
pub fn resize_cpu_extractor(extractor: &mut CpuExtractorData, resolution: Resolution) {
    if extractor.resolution == resolution {
        return;
    }
    log::info!(
        "[CpuExtractor] Resolution change {} -> {}",
        extractor.resolution.size(),
        resolution.size()
    );
    *extractor = create_cpu_extractor(resolution);
}

// ============================================================================
// FRAME LIFECYCLE
// ============================================================================

/// Regenerate the whole field for this frame's blobs
pub fn load_field(extractor: &mut CpuExtractorData, blobs: &BlobSet) {
    field::generate_field(&mut extractor.field, blobs);
    extractor.stage = ExtractorStage::FieldReady;
}

/// Invalidate every cached gradient
pub fn clear_normals(extractor: &mut CpuExtractorData) {
    extractor.normals.computed.clear();
    extractor.stage = ExtractorStage::NormalsCleared;
}

/// Compute the gradient at grid point `q` unless already cached
///
/// Central differences, clamped at the grid boundary. The gradient points
/// from high density toward low density, i.e. out of the surface.
pub fn ensure_normal(cache: &mut NormalCacheData, field: &ScalarField, q: usize) {
    if cache.computed.get(q).unwrap_or(false) {
        return;
    }

    let size = field.size as usize;
    let x = q % size;
    let y = (q / size) % size;
    let z = q / (size * size);

    let at = |x: usize, y: usize, z: usize| field.values[x + y * size + z * size * size];
    let lo = |c: usize| c.saturating_sub(1);
    let hi = |c: usize| (c + 1).min(size - 1);

    cache.gradients[q] = [
        at(lo(x), y, z) - at(hi(x), y, z),
        at(x, lo(y), z) - at(x, hi(y), z),
        at(x, y, lo(z)) - at(x, y, hi(z)),
    ];
    cache.computed.set(q, true);
}

/// Map a (fractional) grid coordinate into [-1,1] surface space
#[inline]
pub fn grid_to_surface(coord: f32, size: u32) -> f32 {
    coord / (size - 1) as f32 * 2.0 - 1.0
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Triangulate the voxel whose minimum corner is `(x, y, z)`
///
/// Returns the number of triangles emitted.
pub fn polygonize_voxel(
    extractor: &mut CpuExtractorData,
    submitter: &mut dyn DrawSubmitter,
    x: u32,
    y: u32,
    z: u32,
) -> usize {
    let q = field::field_index(x, y, z, extractor.size);
    let corner_index = |k: usize| {
        let [dx, dy, dz] = CORNER_OFFSETS[k];
        q + dx as usize + dy as usize * extractor.y_stride + dz as usize * extractor.z_stride
    };
    let corner_q: [usize; 8] = std::array::from_fn(corner_index);
    let corners: [f32; 8] = std::array::from_fn(|k| extractor.field.values[corner_q[k]]);

    let cube = cube_index(&corners, ISO_LEVEL);
    let mask = EDGE_TABLE[cube];
    if mask == 0 {
        return 0;
    }

    for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
        if mask & (1 << edge) == 0 {
            continue;
        }

        ensure_normal(&mut extractor.normals, &extractor.field, corner_q[a]);
        ensure_normal(&mut extractor.normals, &extractor.field, corner_q[b]);

        let mu = (ISO_LEVEL - corners[a]) / (corners[b] - corners[a]);
        let from = CORNER_OFFSETS[a];
        let to = CORNER_OFFSETS[b];
        let base = [x, y, z];
        let na = extractor.normals.gradients[corner_q[a]];
        let nb = extractor.normals.gradients[corner_q[b]];

        for axis in 0..3 {
            let grid = base[axis] as f32 + lerp(from[axis] as f32, to[axis] as f32, mu);
            extractor.edge_positions[edge][axis] = grid_to_surface(grid, extractor.size);
            extractor.edge_normals[edge][axis] = lerp(na[axis], nb[axis], mu);
        }
    }

    let mut triangles = 0;
    for tri in TRI_TABLE[cube].chunks_exact(3) {
        if tri[0] == TRI_TABLE_END {
            break;
        }
        batch::append_pos_normal_triangle(
            &mut extractor.batch,
            submitter,
            &extractor.edge_positions,
            &extractor.edge_normals,
            [tri[0] as usize, tri[1] as usize, tri[2] as usize],
        );
        triangles += 1;
    }
    triangles
}

/// Walk every voxel of the loaded field and stream its triangles
pub fn extract_surface(
    extractor: &mut CpuExtractorData,
    submitter: &mut dyn DrawSubmitter,
) -> ExtractionStats {
    debug_assert_eq!(
        extractor.stage,
        ExtractorStage::FieldReady,
        "extract_surface requires a freshly loaded field"
    );
    if extractor.stage != ExtractorStage::FieldReady {
        log::warn!(
            "[CpuExtractor] Extracting from a field in stage {:?}",
            extractor.stage
        );
    }

    clear_normals(extractor);
    batch::begin(&mut extractor.batch, PrimitiveKind::Triangles);
    extractor.stage = ExtractorStage::Polygonizing;

    let mut stats = ExtractionStats::default();
    let cells = extractor.resolution.cells_per_axis();
    for z in 0..cells {
        for y in 0..cells {
            for x in 0..cells {
                let emitted = polygonize_voxel(extractor, submitter, x, y, z);
                stats.voxels_visited += 1;
                if emitted == 0 {
                    stats.voxels_empty += 1;
                }
                stats.triangles += emitted;
            }
        }
    }

    batch::end(&mut extractor.batch, submitter);
    stats.draw_calls = extractor.batch.flush_count;
    extractor.stage = ExtractorStage::Flushed;
    extractor.stats = stats;

    log::debug!(
        "[CpuExtractor] {} triangles from {} voxels in {} draw calls",
        stats.triangles,
        stats.voxels_visited,
        stats.draw_calls
    );
    stats
}

/// Generate this frame's field and extract it
pub fn run_cpu_frame(
    extractor: &mut CpuExtractorData,
    blobs: &BlobSet,
    submitter: &mut dyn DrawSubmitter,
) -> ExtractionStats {
    load_field(extractor, blobs);
    extract_surface(extractor, submitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::CollectedMesh;
    use crate::marching_cubes::tables::triangle_count;

    fn extractor_with_field(resolution: Resolution, blobs: usize, time: f32) -> CpuExtractorData {
        let mut extractor = create_cpu_extractor(resolution);
        load_field(&mut extractor, &field::compute_blob_set(blobs, time));
        extractor
    }

    #[test]
    fn test_empty_edge_mask_emits_nothing() {
        let mut extractor = extractor_with_field(Resolution::R16, 10, 0.7);
        clear_normals(&mut extractor);
        let mut mesh = CollectedMesh::default();
        let size = extractor.size;

        let mut empty_voxels = 0;
        for z in 0..size - 1 {
            for y in 0..size - 1 {
                for x in 0..size - 1 {
                    let corners: [f32; 8] = std::array::from_fn(|k| {
                        let [dx, dy, dz] = CORNER_OFFSETS[k];
                        extractor.field.values[field::field_index(x + dx, y + dy, z + dz, size)]
                    });
                    let cube = cube_index(&corners, ISO_LEVEL);
                    let emitted = polygonize_voxel(&mut extractor, &mut mesh, x, y, z);
                    assert_eq!(emitted, triangle_count(cube));
                    if EDGE_TABLE[cube] == 0 {
                        assert_eq!(emitted, 0);
                        empty_voxels += 1;
                    }
                }
            }
        }
        assert!(empty_voxels > 0);
    }

    #[test]
    fn test_uniform_field_has_no_surface() {
        let mut extractor = create_cpu_extractor(Resolution::R16);
        extractor.field.values.fill(ISO_LEVEL + 1.0);
        extractor.stage = ExtractorStage::FieldReady;

        let mut mesh = CollectedMesh::default();
        let stats = extract_surface(&mut extractor, &mut mesh);

        assert_eq!(stats.triangles, 0);
        assert_eq!(stats.voxels_visited, 15 * 15 * 15);
        assert_eq!(stats.voxels_empty, stats.voxels_visited);
        assert_eq!(mesh.draw_calls, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "freshly loaded field")]
    fn test_extract_without_loaded_field_panics_in_debug() {
        let mut extractor = create_cpu_extractor(Resolution::R16);
        let mut mesh = CollectedMesh::default();
        extract_surface(&mut extractor, &mut mesh);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "freshly loaded field")]
    fn test_second_extract_of_same_field_panics_in_debug() {
        let mut extractor = extractor_with_field(Resolution::R16, 1, 0.0);
        let mut mesh = CollectedMesh::default();
        extract_surface(&mut extractor, &mut mesh);
        extract_surface(&mut extractor, &mut mesh);
    }

    #[test]
    fn test_blob_surface_is_extracted() {
        let mut extractor = create_cpu_extractor(Resolution::R32);
        let mut mesh = CollectedMesh::default();
        let stats = run_cpu_frame(&mut extractor, &field::compute_blob_set(10, 1.0), &mut mesh);

        assert!(stats.triangles > 0);
        assert_eq!(mesh.triangle_count(), stats.triangles);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        assert_eq!(mesh.draw_calls as u32, stats.draw_calls);
        assert_eq!(extractor.stage, ExtractorStage::Flushed);

        for p in &mesh.positions {
            assert!(p.iter().all(|c| (-1.0..=1.0).contains(c)), "{:?}", p);
        }
    }

    #[test]
    fn test_large_surface_spans_multiple_batches() {
        let mut extractor = create_cpu_extractor(Resolution::R64);
        let mut mesh = CollectedMesh::default();
        let stats = run_cpu_frame(&mut extractor, &field::compute_blob_set(50, 2.0), &mut mesh);

        assert!(stats.triangles * 3 > BATCH_CAPACITY);
        assert!(stats.draw_calls > 1);
        assert_eq!(mesh.triangle_count(), stats.triangles);
    }

    #[test]
    fn test_single_blob_normals_point_outward() {
        let blobs = field::compute_blob_set(1, 0.0);
        let center: Vec<f32> = blobs.blobs[0].center.iter().map(|c| c * 2.0 - 1.0).collect();

        let mut extractor = create_cpu_extractor(Resolution::R32);
        let mut mesh = CollectedMesh::default();
        run_cpu_frame(&mut extractor, &blobs, &mut mesh);

        let mut checked = 0;
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            let offset = [p[0] - center[0], p[1] - center[1], p[2] - center[2]];
            let dist = (offset[0].powi(2) + offset[1].powi(2) + offset[2].powi(2)).sqrt();
            // Only vertices on the blob shell, away from the floor
            if dist < 0.3 && p[1] > -0.5 {
                let dot = offset[0] * n[0] + offset[1] * n[1] + offset[2] * n[2];
                assert!(dot > 0.0, "normal {:?} at {:?} points inward", n, p);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_normal_cache_is_lazy_and_cleared() {
        let mut extractor = extractor_with_field(Resolution::R16, 1, 0.0);
        clear_normals(&mut extractor);
        assert!(extractor.normals.computed.none());

        let q = field::field_index(4, 5, 6, 16);
        ensure_normal(&mut extractor.normals, &extractor.field, q);
        assert!(extractor.normals.computed.get(q).unwrap_or(false));

        // A cached value survives a field change until the cache is cleared
        let cached = extractor.normals.gradients[q];
        extractor.field.values.fill(0.0);
        ensure_normal(&mut extractor.normals, &extractor.field, q);
        assert_eq!(extractor.normals.gradients[q], cached);

        clear_normals(&mut extractor);
        ensure_normal(&mut extractor.normals, &extractor.field, q);
        assert_eq!(extractor.normals.gradients[q], [0.0; 3]);
        assert!(extractor.normals.computed.get(q).unwrap_or(false));
    }

    #[test]
    fn test_normal_clamps_at_boundary() {
        let mut extractor = create_cpu_extractor(Resolution::R16);
        for (i, v) in extractor.field.values.iter_mut().enumerate() {
            *v = (i % 16) as f32; // grows along x
        }
        ensure_normal(&mut extractor.normals, &extractor.field, 0);
        ensure_normal(&mut extractor.normals, &extractor.field, 7);
        assert_eq!(extractor.normals.gradients[0], [-1.0, 0.0, 0.0]);
        assert_eq!(extractor.normals.gradients[7], [-2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_edge_crossing_interpolation() {
        let mut extractor = create_cpu_extractor(Resolution::R16);
        extractor.field.values.fill(100.0);
        // Corner 0 of voxel (0,0,0) falls below the iso level
        extractor.field.values[0] = 60.0;
        let mut mesh = CollectedMesh::default();

        clear_normals(&mut extractor);
        batch::begin(&mut extractor.batch, PrimitiveKind::Triangles);
        let emitted = polygonize_voxel(&mut extractor, &mut mesh, 0, 0, 0);
        batch::end(&mut extractor.batch, &mut mesh);

        assert_eq!(emitted, 1);
        // Edge 0 runs +x from corner 0; mu = (80 - 60) / (100 - 60) = 0.5
        let expected_x = grid_to_surface(0.5, 16);
        assert!((extractor.edge_positions[0][0] - expected_x).abs() < 1e-6);
        assert_eq!(extractor.edge_positions[0][1], -1.0);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_resize_replaces_all_buffers() {
        let mut extractor = create_cpu_extractor(Resolution::R16);
        resize_cpu_extractor(&mut extractor, Resolution::R32);

        assert_eq!(extractor.size, 32);
        assert_eq!(extractor.field.values.len(), 32 * 32 * 32);
        assert_eq!(extractor.normals.gradients.len(), 32 * 32 * 32);
        assert_eq!(extractor.normals.computed.len(), 32 * 32 * 32);
        assert_eq!(extractor.z_stride, 32 * 32);
        assert_eq!(extractor.stage, ExtractorStage::Empty);

        let mut mesh = CollectedMesh::default();
        let stats = run_cpu_frame(&mut extractor, &field::compute_blob_set(10, 1.0), &mut mesh);
        assert_eq!(stats.voxels_visited, 31 * 31 * 31);
    }
}
