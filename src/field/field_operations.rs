//! Field operations - Pure DOP functions
//!
//! Everything here is a total function of its inputs: the same
//! `(count, time)` always yields the same blobs and the same field bits.

use super::field_data::{Blob, BlobSet, ScalarField};
use crate::config::Resolution;
use crate::constants::field::{
    BLOB_BASE_STRENGTH, FLOOR_EPSILON, FLOOR_STRENGTH, KERNEL_EPSILON, KERNEL_THRESHOLD,
};

// ============================================================================
// BLOBS
// ============================================================================

/// Per-blob strength; falls with sqrt(count) so total magnitude stays level
pub fn blob_strength(count: usize) -> f32 {
    BLOB_BASE_STRENGTH / (((count as f32).sqrt() - 1.0) / 4.0 + 1.0)
}

/// Evaluate blob `index` on its periodic trajectory at `time`
pub fn compute_blob(index: usize, count: usize, time: f32) -> Blob {
    let i = index as f32;
    let x = (i + 1.26 * time * (1.03 + 0.5 * (0.21 * i).cos())).sin() * 0.27 + 0.5;
    let y = (i + 1.12 * time * (1.22 + 0.1424 * i).cos()).cos().abs() * 0.77;
    let z = (i + 1.32 * time * 0.1 * (0.92 + 0.53 * i).sin()).cos() * 0.27 + 0.5;

    Blob {
        center: [x, y, z],
        strength: blob_strength(count),
    }
}

/// Compute the full blob set for a frame
pub fn compute_blob_set(count: usize, time: f32) -> BlobSet {
    BlobSet {
        time,
        blobs: (0..count).map(|i| compute_blob(i, count, time)).collect(),
    }
}

// ============================================================================
// DENSITY
// ============================================================================

/// Map a grid coordinate to normalized [0,1] space
pub fn grid_to_normalized(coord: u32, size: u32) -> f32 {
    coord as f32 / (size - 1) as f32
}

/// Density at a normalized position
pub fn density_normalized(fx: f32, fy: f32, fz: f32, blobs: &BlobSet) -> f32 {
    let mut value = 0.0f32;

    for blob in &blobs.blobs {
        let dx = fx - blob.center[0];
        let dy = fy - blob.center[1];
        let dz = fz - blob.center[2];
        let dist_sq = dx * dx + dy * dy + dz * dz;
        let contribution = blob.strength / (KERNEL_EPSILON + dist_sq) - KERNEL_THRESHOLD;
        if contribution > 0.0 {
            value += contribution;
        }
    }

    // Ground plane rising toward y = 0
    let floor = FLOOR_STRENGTH / (FLOOR_EPSILON + fy * fy) - KERNEL_THRESHOLD;
    if floor > 0.0 {
        value += floor;
    }

    value
}

/// Density at an integer grid coordinate of a `size`-point grid
pub fn density(x: u32, y: u32, z: u32, size: u32, blobs: &BlobSet) -> f32 {
    density_normalized(
        grid_to_normalized(x, size),
        grid_to_normalized(y, size),
        grid_to_normalized(z, size),
        blobs,
    )
}

// ============================================================================
// GRID
// ============================================================================

/// Linear index of a grid point
#[inline]
pub fn field_index(x: u32, y: u32, z: u32, size: u32) -> usize {
    (x + y * size + z * size * size) as usize
}

/// Allocate a zeroed field for `resolution`
pub fn create_field(resolution: Resolution) -> ScalarField {
    let size = resolution.size();
    ScalarField {
        size,
        values: vec![0.0; (size * size * size) as usize],
    }
}

/// Overwrite every grid point of `field` for the given blobs
pub fn generate_field(field: &mut ScalarField, blobs: &BlobSet) {
    let size = field.size;
    let mut index = 0;
    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                field.values[index] = density(x, y, z, size, blobs);
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::surface::ISO_LEVEL;

    #[test]
    fn test_density_is_deterministic() {
        let blobs = compute_blob_set(10, 3.25);
        let a = density(5, 9, 13, 32, &blobs);
        let b = density(5, 9, 13, 32, &compute_blob_set(10, 3.25));
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_same_time_gives_identical_fields() {
        let mut first = create_field(Resolution::R32);
        let mut second = create_field(Resolution::R32);
        generate_field(&mut first, &compute_blob_set(10, 1.0));
        generate_field(&mut second, &compute_blob_set(10, 1.0));

        assert!(first
            .values
            .iter()
            .zip(&second.values)
            .all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn test_field_changes_with_time() {
        let mut first = create_field(Resolution::R16);
        let mut second = create_field(Resolution::R16);
        generate_field(&mut first, &compute_blob_set(10, 0.0));
        generate_field(&mut second, &compute_blob_set(10, 0.5));
        assert_ne!(first.values, second.values);
    }

    #[test]
    fn test_single_blob_at_time_zero() {
        let blobs = compute_blob_set(1, 0.0);
        let blob = blobs.blobs[0];

        assert!((blob.center[0] - 0.5).abs() < 1e-6);
        assert!((blob.center[1] - 0.77).abs() < 1e-6);
        assert!((blob.center[2] - 0.77).abs() < 1e-6);
        assert!((blob.strength - 1.2).abs() < 1e-6);

        // Nearest grid point to (7.5, 11.55, 11.55) on a 16-point grid
        let size = 16;
        let nearest = |c: f32| (c * (size - 1) as f32).round() as u32;
        let (x, y, z) = (
            nearest(blob.center[0]),
            nearest(blob.center[1]),
            nearest(blob.center[2]),
        );
        assert!(density(x, y, z, size, &blobs) > ISO_LEVEL);

        // Top corner: far from the blob and from the floor
        assert!(density(0, size - 1, 0, size, &blobs) < ISO_LEVEL);

        // The origin sits on the floor plane
        assert!(density(0, 0, 0, size, &blobs) > ISO_LEVEL);
    }

    #[test]
    fn test_strength_scales_with_count() {
        assert!((blob_strength(1) - 1.2).abs() < 1e-6);
        assert!(blob_strength(100) < blob_strength(10));
        assert!(blob_strength(10) < blob_strength(1));
    }

    #[test]
    fn test_blob_centers_stay_in_grid() {
        for time in [0.0, 1.0, 17.5, 400.0] {
            for blob in compute_blob_set(100, time).blobs {
                assert!(blob.center.iter().all(|c| (0.0..=1.0).contains(c)));
            }
        }
    }

    #[test]
    fn test_field_index_layout() {
        assert_eq!(field_index(0, 0, 0, 16), 0);
        assert_eq!(field_index(1, 0, 0, 16), 1);
        assert_eq!(field_index(0, 1, 0, 16), 16);
        assert_eq!(field_index(0, 0, 1, 16), 256);
        assert_eq!(field_index(15, 15, 15, 16), 4095);
    }

    #[test]
    fn test_generate_field_matches_density() {
        let blobs = compute_blob_set(10, 2.0);
        let mut field = create_field(Resolution::R16);
        generate_field(&mut field, &blobs);

        for (x, y, z) in [(0, 0, 0), (3, 7, 11), (15, 15, 15), (8, 1, 4)] {
            assert_eq!(
                field.values[field_index(x, y, z, 16)].to_bits(),
                density(x, y, z, 16, &blobs).to_bits()
            );
        }
    }

    #[test]
    fn test_no_blobs_leaves_only_floor() {
        let empty = BlobSet {
            time: 0.0,
            blobs: Vec::new(),
        };
        assert_eq!(density(4, 15, 4, 16, &empty), 0.0);
        assert!(density(4, 0, 4, 16, &empty) > 0.0);
    }
}
