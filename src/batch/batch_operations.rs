//! Batch operations - Pure DOP functions
//!
//! A batch never overruns: appending flushes through the submitter as soon as
//! fewer than one triangle's worth of slots remain.

use super::batch_data::{PrimitiveKind, TriangleBatchData};
use super::submitter::DrawSubmitter;

/// Create a batch with room for `capacity` vertices
pub fn create_batch(capacity: usize) -> TriangleBatchData {
    debug_assert!(capacity > 6, "batch capacity must exceed two triangles");
    TriangleBatchData {
        capacity,
        positions: vec![0.0; capacity * 3],
        normals: vec![0.0; capacity * 3],
        uvs: vec![0.0; capacity * 2],
        colors: vec![0.0; capacity * 4],
        count: 0,
        primitive: PrimitiveKind::Triangles,
        has_position: false,
        has_normal: false,
        has_uv: false,
        has_color: false,
        flush_count: 0,
        submitted_vertices: 0,
    }
}

/// Reset the batch for a new pass
pub fn begin(batch: &mut TriangleBatchData, primitive: PrimitiveKind) {
    batch.primitive = primitive;
    batch.count = 0;
    batch.has_position = false;
    batch.has_normal = false;
    batch.has_uv = false;
    batch.has_color = false;
    batch.flush_count = 0;
    batch.submitted_vertices = 0;
}

/// Submit whatever is batched and start over at slot 0
pub fn flush(batch: &mut TriangleBatchData, submitter: &mut dyn DrawSubmitter) {
    submitter.submit(batch);
    batch.flush_count += 1;
    batch.submitted_vertices += batch.count;
    batch.count = 0;
}

/// Finish the pass, flushing any remaining vertices
pub fn end(batch: &mut TriangleBatchData, submitter: &mut dyn DrawSubmitter) {
    if batch.count == 0 {
        return;
    }

    // Stale positions past the live range must never be drawn
    let live = batch.count * 3;
    batch.positions[live..].fill(0.0);

    flush(batch, submitter);
}

/// Append one triangle whose corners are picked out of per-edge arrays
///
/// `positions[i]`/`normals[i]` hold the attributes for edge `i`; `corners`
/// names the three edges forming the triangle.
pub fn append_pos_normal_triangle(
    batch: &mut TriangleBatchData,
    submitter: &mut dyn DrawSubmitter,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    corners: [usize; 3],
) {
    let base = batch.count * 3;
    for (slot, &corner) in corners.iter().enumerate() {
        let o = base + slot * 3;
        batch.positions[o..o + 3].copy_from_slice(&positions[corner]);
        batch.normals[o..o + 3].copy_from_slice(&normals[corner]);
    }
    batch.has_position = true;
    batch.has_normal = true;
    batch.count += 3;

    if batch.count >= batch.capacity - 3 {
        flush(batch, submitter);
    }
}

/// Set the position of the vertex under construction
pub fn set_position(batch: &mut TriangleBatchData, position: [f32; 3]) {
    let o = batch.count * 3;
    batch.positions[o..o + 3].copy_from_slice(&position);
    batch.has_position = true;
}

/// Set the normal of the vertex under construction
pub fn set_normal(batch: &mut TriangleBatchData, normal: [f32; 3]) {
    let o = batch.count * 3;
    batch.normals[o..o + 3].copy_from_slice(&normal);
    batch.has_normal = true;
}

/// Set the texture coordinate of the vertex under construction
pub fn set_uv(batch: &mut TriangleBatchData, uv: [f32; 2]) {
    let o = batch.count * 2;
    batch.uvs[o..o + 2].copy_from_slice(&uv);
    batch.has_uv = true;
}

/// Set the color of the vertex under construction
pub fn set_color(batch: &mut TriangleBatchData, color: [f32; 4]) {
    let o = batch.count * 4;
    batch.colors[o..o + 4].copy_from_slice(&color);
    batch.has_color = true;
}

/// Commit the vertex under construction
///
/// Near capacity the batch flushes, but only on a primitive boundary so no
/// primitive is split across draws.
pub fn next_vertex(batch: &mut TriangleBatchData, submitter: &mut dyn DrawSubmitter) {
    batch.count += 1;
    if batch.count >= batch.capacity - 3 && batch.count % batch.primitive.vertices() == 0 {
        flush(batch, submitter);
    }
}
