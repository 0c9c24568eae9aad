use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::Rgb;
use rover_core::Frame;
use rover_vision::{Calibration, PerspectiveRectifier, PixelClassifier};

/// Create benchmark frame resembling the simulator: bright ground below the horizon,
/// dark rock walls at the sides
fn create_benchmark_frame(width: u32, height: u32) -> Frame {
    Frame::from_fn(width, height, |x, y| {
        let horizon = height / 2;
        let wall = x < width / 6 || x > 5 * width / 6;
        if y < horizon {
            Rgb([120, 110, 100])
        } else if wall {
            Rgb([60, 50, 40])
        } else {
            let noise = ((x * 7 + y * 13) % 17) as u8;
            Rgb([170 + noise, 165 + noise, 160 + noise])
        }
    })
}

fn bench_rectify(c: &mut Criterion) {
    let mut group = c.benchmark_group("rectify");

    for &(width, height) in &[(320u32, 160u32), (640, 320), (1280, 640)] {
        let cal = Calibration::new(width, height);
        let rectifier = PerspectiveRectifier::from_calibration(&cal).unwrap();
        let frame = create_benchmark_frame(width, height);
        let mut out = Frame::new(width, height);

        group.bench_with_input(
            BenchmarkId::new("rectify_into", format!("{}x{}", width, height)),
            &frame,
            |b, frame| {
                b.iter(|| rectifier.rectify_into(black_box(frame), &mut out).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let cal = Calibration::simulator();
    let classifier = PixelClassifier::new(cal.thresholds);
    let frame = create_benchmark_frame(cal.frame_width, cal.frame_height);

    let mut group = c.benchmark_group("classify");
    group.bench_function("three_classes_320x160", |b| {
        b.iter(|| black_box(classifier.classify(black_box(&frame)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_rectify, bench_classify);
criterion_main!(benches);
