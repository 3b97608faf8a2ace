// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![cfg(feature = "compare_rstar")]

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_spatial::{BulkTree2D, Point2, QuadTree, ScratchPool, SpatialQuery};

use rstar::RTree;

fn gen_points(count: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| [rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0)])
        .collect()
}

fn bench_rstar_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_compare_build");
    for &n in &[10_000usize, 100_000] {
        let pts = gen_points(n, 11);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("understory_bulk_n{n}"), |b| {
            b.iter(|| {
                let tree = BulkTree2D::new(0..n, |&i| Point2::new(pts[i][0], pts[i][1]));
                black_box(tree.map(|t| t.node_count()))
            });
        });
        group.bench_function(format!("understory_quad_n{n}"), |b| {
            b.iter(|| {
                let tree = QuadTree::new(0..n, |&i| Point2::new(pts[i][0], pts[i][1]));
                black_box(tree.map(|t| t.node_count()))
            });
        });
        group.bench_function(format!("rstar_bulk_load_n{n}"), |b| {
            b.iter_batched(
                || pts.clone(),
                |pts| black_box(RTree::bulk_load(pts).size()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_rstar_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("rstar_compare_query");
    let pts = gen_points(100_000, 12);
    let targets = gen_points(256, 13);
    let Ok(bulk) = BulkTree2D::new(0..pts.len(), |&i| Point2::new(pts[i][0], pts[i][1])) else {
        return;
    };
    let rtree = RTree::bulk_load(pts.clone());
    group.throughput(Throughput::Elements(targets.len() as u64));

    for &k in &[1usize, 10] {
        group.bench_function(format!("understory_nearest_k{k}"), |b| {
            let pool = ScratchPool::new();
            let mut hits = Vec::new();
            b.iter(|| {
                for p in &targets {
                    let mut scratch = pool.acquire();
                    let at = Point2::new(p[0], p[1]);
                    bulk.approximate_nearest_neighbors_with(&mut scratch, at, k, &mut hits);
                }
                black_box(hits.len())
            });
        });
        group.bench_function(format!("rstar_nearest_k{k}"), |b| {
            b.iter(|| {
                let mut total = 0;
                for p in &targets {
                    total += rtree.nearest_neighbor_iter(p).take(k).count();
                }
                black_box(total)
            });
        });
    }

    group.bench_function("understory_range_r20", |b| {
        let mut hits = Vec::new();
        b.iter(|| {
            let mut total = 0;
            for p in &targets {
                total += bulk
                    .elements_in_range(Point2::new(p[0], p[1]), 20.0, &mut hits)
                    .len();
            }
            black_box(total)
        });
    });
    group.bench_function("rstar_range_r20", |b| {
        b.iter(|| {
            let mut total = 0;
            for p in &targets {
                total += rtree.locate_within_distance(*p, 400.0).count();
            }
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_rstar_build, bench_rstar_queries);
criterion_main!(benches);
