//! wgpu-backed draw submitter for the CPU extraction path
//!
//! Each flush uploads its live vertices into the next pooled buffer pair and
//! records a draw. The draws are replayed in one render pass after extraction
//! finishes.

use super::renderer_data::{BatchBufferPool, BatchBuffers};
use crate::batch::{DrawSubmitter, TriangleBatchData};

/// Bytes of one `[f32; 3]` vertex attribute
const ATTRIBUTE_STRIDE: u64 = 12;

pub struct GpuBatchSubmitter<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub pool: &'a mut BatchBufferPool,
    /// Vertex count per recorded draw; draw `i` uses `pool.buffers[i]`
    pub draws: Vec<u32>,
}

pub fn create_batch_pool(capacity: usize) -> BatchBufferPool {
    BatchBufferPool {
        capacity,
        buffers: Vec::new(),
    }
}

fn create_batch_buffers(device: &wgpu::Device, capacity: usize, slot: usize) -> BatchBuffers {
    let size = capacity as u64 * ATTRIBUTE_STRIDE;
    let buffer = |kind: &str| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Batch {} {}", kind, slot)),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    };
    BatchBuffers {
        positions: buffer("Positions"),
        normals: buffer("Normals"),
    }
}

/// Make sure `pool.buffers[slot]` exists
pub fn ensure_pool_slot(device: &wgpu::Device, pool: &mut BatchBufferPool, slot: usize) {
    while pool.buffers.len() <= slot {
        let next = pool.buffers.len();
        pool.buffers.push(create_batch_buffers(device, pool.capacity, next));
        log::debug!("[CpuSubmitter] Batch pool grew to {} buffer pairs", next + 1);
    }
}

pub fn create_submitter<'a>(
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    pool: &'a mut BatchBufferPool,
) -> GpuBatchSubmitter<'a> {
    GpuBatchSubmitter {
        device,
        queue,
        pool,
        draws: Vec::new(),
    }
}

impl DrawSubmitter for GpuBatchSubmitter<'_> {
    fn submit(&mut self, batch: &TriangleBatchData) {
        if batch.count == 0 {
            return;
        }

        let slot = self.draws.len();
        ensure_pool_slot(self.device, self.pool, slot);

        let live = batch.count * 3;
        let buffers = &self.pool.buffers[slot];
        self.queue.write_buffer(
            &buffers.positions,
            0,
            bytemuck::cast_slice(&batch.positions[..live]),
        );
        self.queue.write_buffer(
            &buffers.normals,
            0,
            bytemuck::cast_slice(&batch.normals[..live]),
        );
        self.draws.push(batch.count as u32);
    }
}

/// Vertex layouts for the batched pipeline: positions in slot 0, normals in 1
pub const BATCH_VERTEX_LAYOUTS: [wgpu::VertexBufferLayout<'static>; 2] = [
    wgpu::VertexBufferLayout {
        array_stride: ATTRIBUTE_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
    wgpu::VertexBufferLayout {
        array_stride: ATTRIBUTE_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    },
];
