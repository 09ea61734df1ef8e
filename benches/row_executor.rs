use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rasterkit::engine::{blur, PixelBuffer, RowExecutor};
use rasterkit::ops::BlurKind;
use std::hint::black_box;

// Same filter, same image; only the band count changes
fn bench_worker_counts(c: &mut Criterion) {
    let data = (0..1920u32 * 1080)
        .flat_map(|i| [(i % 251) as u8, (i % 241) as u8, (i % 239) as u8])
        .collect();
    let src = PixelBuffer::from_raw(1920, 1080, 3, data).unwrap();

    let mut group = c.benchmark_group("gaussian_blur_1080p");
    for workers in [1usize, 2, 4, 8] {
        let exec = RowExecutor::new(workers).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &exec, |b, exec| {
            b.iter(|| blur(black_box(&src), BlurKind::Gaussian, 5, 1.5, exec).unwrap())
        });
    }
    group.finish();
}

criterion_group!(row_executor, bench_worker_counts);
criterion_main!(row_executor);
