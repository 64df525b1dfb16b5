//! Benchmarks for signal and landmark smoothing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use form_tracker::filters::{
    exponential::ExponentialFilter, landmark::LandmarkSmoother, median::MedianFilter,
    moving_average::MovingAverageFilter, NoFilter, SignalFilter,
};
use form_tracker::landmarks::{Landmark, Pose};

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Noisy knee/ankle width ratio
    let test_data: Vec<f64> = (0..100)
        .map(|i| {
            let t = f64::from(i) * 0.1;
            1.2 + 0.2 * t.sin() + 0.05 * rand::random::<f64>()
        })
        .collect();

    let filter_configs = vec![
        ("no_filter", Box::new(NoFilter) as Box<dyn SignalFilter>),
        ("moving_average_5", Box::new(MovingAverageFilter::new(5))),
        ("moving_average_10", Box::new(MovingAverageFilter::new(10))),
        ("median_5", Box::new(MedianFilter::new(5))),
        ("median_9", Box::new(MedianFilter::new(9))),
        ("exponential_0.3", Box::new(ExponentialFilter::new(0.3))),
        ("exponential_0.5", Box::new(ExponentialFilter::new(0.5))),
    ];

    for (name, mut filter) in filter_configs {
        group.bench_with_input(BenchmarkId::new("single_update", name), &test_data[0], |b, &value| {
            b.iter(|| black_box(filter.apply(black_box(value))));
        });

        group.bench_with_input(BenchmarkId::new("sequence_100", name), &test_data, |b, data| {
            b.iter(|| {
                filter.reset();
                for &value in data {
                    black_box(filter.apply(black_box(value)));
                }
            });
        });
    }

    group.finish();
}

fn benchmark_landmark_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("landmark_smoother");

    let poses: Vec<Pose> = (0..30)
        .map(|_| {
            let mut pose = Pose::default();
            for lm in &mut pose.landmarks {
                *lm = Landmark::new(
                    320.0 + 5.0 * rand::random::<f64>(),
                    240.0 + 5.0 * rand::random::<f64>(),
                    rand::random::<f64>(),
                );
            }
            pose
        })
        .collect();

    for alpha in [0.3, 0.5] {
        let mut smoother = LandmarkSmoother::new(alpha, 0.2).expect("valid alpha");
        group.bench_with_input(BenchmarkId::new("sequence_30", alpha), &poses, |b, poses| {
            b.iter(|| {
                smoother.reset();
                for pose in poses {
                    black_box(smoother.smooth(black_box(pose)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_filters, benchmark_landmark_smoother);
criterion_main!(benches);
