//! Benchmarks for the CPU extraction path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metaball_surface::{
    field::{compute_blob_set, create_field, generate_field},
    marching_cubes::{create_cpu_extractor, run_cpu_frame},
    BlobCount, CollectedMesh, Resolution,
};

fn bench_field_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_generation");

    for resolution in [Resolution::R16, Resolution::R32, Resolution::R64] {
        let size = resolution.size() as u64;
        group.throughput(Throughput::Elements(size * size * size));

        for blobs in [BlobCount::Ten, BlobCount::Hundred] {
            let blob_set = compute_blob_set(blobs.count(), 1.5);
            let mut field = create_field(resolution);
            group.bench_with_input(
                BenchmarkId::new(format!("{}_blobs", blobs.count()), size),
                &blob_set,
                |b, blob_set| b.iter(|| generate_field(&mut field, black_box(blob_set))),
            );
        }
    }

    group.finish();
}

fn bench_cpu_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_frame");
    group.sample_size(20);

    for resolution in [Resolution::R16, Resolution::R32, Resolution::R64] {
        let blob_set = compute_blob_set(BlobCount::Ten.count(), 2.0);
        let mut extractor = create_cpu_extractor(resolution);
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution.size()),
            &blob_set,
            |b, blob_set| {
                b.iter(|| {
                    let mut mesh = CollectedMesh::default();
                    run_cpu_frame(&mut extractor, black_box(blob_set), &mut mesh)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_field_generation, bench_cpu_frame);
criterion_main!(benches);
