use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gesture_launch::{
    capture::{Camera, CaptureConfig, MockCamera},
    encoding::{nv21_to_rgb, to_nv21, FrameEncoder},
};

fn frame(width: u32, height: u32) -> gesture_launch::RawFrame {
    let mut camera = MockCamera::new();
    camera
        .open(&CaptureConfig::with_dimensions(width, height))
        .unwrap();
    camera.capture().unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let encoder = FrameEncoder::new();
    let mut group = c.benchmark_group("encode");

    for (width, height) in [(320, 240), (640, 480), (1280, 720)] {
        let frame = frame(width, height);
        group.bench_with_input(
            BenchmarkId::new("frame_to_tensor", format!("{width}x{height}")),
            &frame,
            |b, frame| b.iter(|| encoder.encode(black_box(frame)).unwrap()),
        );
    }
    group.finish();
}

fn bench_color(c: &mut Criterion) {
    let frame = frame(640, 480);
    let nv21 = to_nv21(&frame).unwrap();

    c.bench_function("nv21_to_rgb_640x480", |b| {
        b.iter(|| nv21_to_rgb(black_box(&nv21), 640, 480))
    });
}

criterion_group!(benches, bench_encode, bench_color);
criterion_main!(benches);
