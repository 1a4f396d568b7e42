//! Criterion benchmarks for the gesture classifier hot path.
//!
//! The classifier runs on every touch sample (up to a few hundred per second
//! per contact), so per-sample cost matters.
//!
//! Run with: `cargo bench --bench classifier_bench`

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trackpad_core::gesture::{GestureClassifier, GestureConfig, Point};

fn bench_single_finger_move_stream(c: &mut Criterion) {
    c.bench_function("classify_move_stream_120_samples", |b| {
        b.iter(|| {
            let mut classifier = GestureClassifier::new(GestureConfig::default());
            let start = Instant::now();
            classifier.touch_began(1, Point::new(0.0, 0.0), start);
            let mut emitted = 0;
            for i in 1..=120u64 {
                let t = start + Duration::from_millis(i * 8);
                let pos = Point::new(i as f32 * 2.0, i as f32);
                emitted += classifier.touch_moved(1, black_box(pos), t).len();
            }
            classifier.touch_ended(1, start + Duration::from_secs(1));
            black_box(emitted)
        })
    });
}

fn bench_two_finger_scroll_stream(c: &mut Criterion) {
    c.bench_function("classify_scroll_stream_120_samples", |b| {
        b.iter(|| {
            let mut classifier = GestureClassifier::new(GestureConfig::default());
            let start = Instant::now();
            classifier.touch_began(1, Point::new(100.0, 100.0), start);
            classifier.touch_began(2, Point::new(160.0, 100.0), start);
            let mut emitted = 0;
            for i in 1..=120u64 {
                let t = start + Duration::from_millis(i * 8);
                let y = 100.0 + i as f32 * 2.0;
                emitted += classifier
                    .touch_moved(1, black_box(Point::new(100.0, y)), t)
                    .len();
                emitted += classifier
                    .touch_moved(2, black_box(Point::new(160.0, y)), t)
                    .len();
            }
            classifier.touch_ended(1, start + Duration::from_secs(1));
            classifier.touch_ended(2, start + Duration::from_secs(1));
            black_box(emitted)
        })
    });
}

criterion_group!(
    benches,
    bench_single_finger_move_stream,
    bench_two_finger_scroll_stream
);
criterion_main!(benches);
