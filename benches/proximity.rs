use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use geoalarm::{
    evaluate, haversine_km, AlarmSession, Coordinate, LogAlerter, MonitorConfig, PositionSample,
    ProximityMonitor,
};

fn approach_path(n: u32) -> Vec<Coordinate> {
    // Walk due south onto the target from ~1.1 km out.
    (0..n)
        .map(|i| Coordinate::new(37.01 - 0.01 * f64::from(i) / f64::from(n), -122.0).unwrap())
        .collect()
}

fn bench_haversine(c: &mut Criterion) {
    let a = Coordinate::new(37.7749, -122.4194).unwrap();
    let b = Coordinate::new(37.7750, -122.4183).unwrap();
    c.bench_function("proximity/haversine", |bench| {
        bench.iter(|| haversine_km(black_box(&a), black_box(&b)));
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let target = Coordinate::new(37.0, -122.0).unwrap();
    let path = approach_path(1024);

    let mut group = c.benchmark_group("proximity");
    group.throughput(Throughput::Elements(path.len() as u64));
    group.bench_function("evaluate_path", |bench| {
        bench.iter(|| {
            path.iter()
                .filter(|p| evaluate(**p, Some(target), true).is_trigger())
                .count()
        });
    });
    group.bench_function("session_path", |bench| {
        bench.iter(|| {
            let mut session = AlarmSession::default();
            session.set_target(target);
            session.set_armed(true);
            path.iter()
                .filter_map(|p| session.observe(PositionSample::now(*p)))
                .count()
        });
    });
    group.finish();
}

fn bench_monitor_round_trip(c: &mut Criterion) {
    let target = Coordinate::new(37.0, -122.0).unwrap();
    let path = approach_path(256);

    c.bench_function("proximity/monitor_round_trip", |bench| {
        bench.iter_custom(|iters| {
            let (monitor, _events) =
                ProximityMonitor::start(MonitorConfig::default(), Box::new(LogAlerter::new())).unwrap();
            monitor.set_target(target).unwrap();
            let feed = monitor.feed();

            let mut total = Duration::ZERO;
            for _ in 0..iters {
                let start = std::time::Instant::now();
                for p in &path {
                    feed.push_sample(PositionSample::now(*p)).unwrap();
                }
                // Snapshot waits until the worker has consumed the path.
                monitor.snapshot().unwrap();
                total += start.elapsed();
            }
            total
        });
    });
}

criterion_group!(benches, bench_haversine, bench_evaluate, bench_monitor_round_trip);
criterion_main!(benches);
