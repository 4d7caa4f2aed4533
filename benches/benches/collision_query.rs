// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::{DVec3, dvec3};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use setpiece_collision::ColliderIndex;
use setpiece_geom::SpatialParams;

fn grid_index(n: usize, spacing: f64) -> ColliderIndex {
    let mut index = ColliderIndex::new(SpatialParams::default());
    let size = dvec3(0.2, 0.2, 0.2);
    for y in 0..n {
        for x in 0..n {
            let center = dvec3(x as f64 * spacing, y as f64 * spacing, 0.1);
            index.upsert(&format!("box_{x}_{y}"), center, size);
        }
    }
    index
}

fn bench_collides_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("collides_at");
    for n in [8_usize, 16, 32] {
        let index = grid_index(n, 0.5);
        let probe = DVec3::new(n as f64 * 0.25, n as f64 * 0.25, 0.1);
        group.bench_with_input(BenchmarkId::from_parameter(n * n), &index, |b, index| {
            b.iter(|| {
                black_box(index.collides_at(None, black_box(probe), dvec3(0.2, 0.2, 0.2)))
            });
        });
    }
    group.finish();
}

fn bench_find_safe_position(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_safe_position");
    for n in [8_usize, 16] {
        // Tight spacing: the preferred point always collides and the polar
        // sampler has to work for its answer.
        let index = grid_index(n, 0.3);
        let preferred = DVec3::new(n as f64 * 0.15, n as f64 * 0.15, 0.1);
        group.bench_with_input(BenchmarkId::from_parameter(n * n), &index, |b, index| {
            let mut rng = SmallRng::seed_from_u64(7);
            b.iter(|| {
                black_box(index.find_safe_position(
                    &mut rng,
                    dvec3(0.2, 0.2, 0.2),
                    black_box(preferred),
                    1.0,
                    20,
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_collides_at, bench_find_safe_position);
criterion_main!(benches);
