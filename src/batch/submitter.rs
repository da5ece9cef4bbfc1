//! Draw submission seam
//!
//! The batching emitter does not know how vertices reach the screen. Every
//! flush hands the batch to a `DrawSubmitter`; the renderer implements it with
//! wgpu buffers, tests and tools use `CollectedMesh`.

use super::batch_data::TriangleBatchData;

/// Receives one flushed batch per call
pub trait DrawSubmitter {
    /// Consume `batch.count` vertices from the batch arrays
    fn submit(&mut self, batch: &TriangleBatchData);
}

/// Submitter that copies every flushed vertex into plain vectors
#[derive(Debug, Default, Clone)]
pub struct CollectedMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub draw_calls: usize,
}

impl CollectedMesh {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

impl DrawSubmitter for CollectedMesh {
    fn submit(&mut self, batch: &TriangleBatchData) {
        self.draw_calls += 1;
        for v in 0..batch.count {
            let o = v * 3;
            if batch.has_position {
                self.positions.push([
                    batch.positions[o],
                    batch.positions[o + 1],
                    batch.positions[o + 2],
                ]);
            }
            if batch.has_normal {
                self.normals.push([
                    batch.normals[o],
                    batch.normals[o + 1],
                    batch.normals[o + 2],
                ]);
            }
        }
    }
}
