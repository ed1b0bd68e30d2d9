use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;
use urania::aspects::{AspectDetector, Placement};
use urania::houses::House;
use urania::patterns::PatternDetector;
use urania::western::Body;

fn placements() -> Vec<Placement> {
    Body::ALL
        .iter()
        .enumerate()
        .map(|(i, &body)| Placement::at_mean_motion(body, (i as f64) * 30.0 + 2.5))
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let detector = AspectDetector::natal();
    let a = Placement::at_mean_motion(Body::Moon, 100.0);
    let b = Placement::at_mean_motion(Body::Saturn, 278.0);

    c.bench_function("detect", |bench| {
        bench.iter(|| detector.detect(black_box(&a), black_box(&b)))
    });
}

fn bench_aspects_within(c: &mut Criterion) {
    let detector = AspectDetector::natal();
    let placements = placements();

    c.bench_function("aspects_within_12_bodies", |bench| {
        bench.iter(|| detector.aspects_within(black_box(&placements)))
    });
}

fn bench_patterns(c: &mut Criterion) {
    let detector = AspectDetector::natal();
    let placements = placements();
    let aspects = detector.aspects_within(&placements);
    let houses: BTreeMap<Body, House> = placements
        .iter()
        .map(|p| (p.body, House::from_index((p.longitude / 30.0) as usize)))
        .collect();

    c.bench_function("patterns_12_bodies", |bench| {
        bench.iter(|| PatternDetector::new().detect(black_box(&aspects), black_box(&houses)))
    });
}

criterion_group!(benches, bench_detect, bench_aspects_within, bench_patterns);
criterion_main!(benches);
