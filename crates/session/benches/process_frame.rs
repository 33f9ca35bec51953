//! Per-frame latency against the ~33 ms budget of a 30 Hz camera
//!
//! Run with: cargo bench -p session

use affect::synthetic::FaceBuilder;
use affect::{AffectConfig, Detection};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use session::MonitoringSession;

fn bench_process_face(c: &mut Criterion) {
    let face = Detection::Face(FaceBuilder::neutral().smiling().build());
    let mut session = MonitoringSession::new(AffectConfig::default(), 0).unwrap();
    let mut t = 0u64;

    c.bench_function("process_frame/face", |b| {
        b.iter(|| {
            t += 33;
            session.process_frame(black_box(&face), t).unwrap()
        })
    });
}

fn bench_process_no_face(c: &mut Criterion) {
    let mut session = MonitoringSession::new(AffectConfig::default(), 0).unwrap();
    let mut t = 0u64;

    c.bench_function("process_frame/no_face", |b| {
        b.iter(|| {
            t += 33;
            session.process_frame(black_box(&Detection::NoFace), t).unwrap()
        })
    });
}

criterion_group!(benches, bench_process_face, bench_process_no_face);
criterion_main!(benches);
