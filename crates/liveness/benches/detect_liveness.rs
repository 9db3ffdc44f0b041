use camera_capture::VideoFrame;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use liveness::LivenessEngine;

fn gradient_crop(size: u32) -> VideoFrame {
    let mut data = Vec::with_capacity((size * size * 3) as usize);
    for y in 0..size {
        for x in 0..size {
            let v = ((x * 7 + y * 13) % 251) as u8;
            data.extend_from_slice(&[v, v.wrapping_add(40), v / 2]);
        }
    }
    VideoFrame::new(data, size, size, 0, 0)
}

fn bench_detect_liveness(c: &mut Criterion) {
    let engine = LivenessEngine::default();
    let history: Vec<f64> = (0..30).map(|i| (i % 5) as f64).collect();

    let mut group = c.benchmark_group("detect_liveness");
    for size in [64u32, 128, 224] {
        let crop = gradient_crop(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &crop, |b, crop| {
            b.iter(|| engine.detect_liveness(black_box(Some(crop)), black_box(Some(&history))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect_liveness);
criterion_main!(benches);
