// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_spatial::{
    Aabb2D, Aabb3D, BulkLoadConfig, BulkTree2D, BulkTree3D, KdBuild, KdTree, Point2, Point3,
    QuadTree, ScratchPool, SpatialQuery, TreeConfig,
};

fn gen_points_2d(count: usize, extent: f64, seed: u64) -> Vec<Point2<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Point2::new(rng.random_range(0.0..extent), rng.random_range(0.0..extent)))
        .collect()
}

fn gen_points_3d(count: usize, extent: f64, seed: u64) -> Vec<Point3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point3::new(
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
                rng.random_range(0.0..extent),
            )
        })
        .collect()
}

fn gen_clustered_2d(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Point2<f64>> {
    let mut rng = StdRng::seed_from_u64(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let (cx, cy) = (rng.random_range(0.0..2000.0), rng.random_range(0.0..2000.0));
        for _ in 0..per_cluster {
            let dx = rng.random_range(-0.5..0.5) * spread;
            let dy = rng.random_range(-0.5..0.5) * spread;
            out.push(Point2::new(cx + dx, cy + dy));
        }
    }
    out
}

fn gen_rects(count: usize, extent: f64, size: f64) -> Vec<Aabb2D<f64>> {
    let mut rng = StdRng::seed_from_u64(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| {
            let x0 = rng.random_range(0.0..extent - size);
            let y0 = rng.random_range(0.0..extent - size);
            Aabb2D::<f64>::from_xywh(x0, y0, size, size)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[1_000usize, 10_000, 100_000] {
        let pts2 = gen_points_2d(n, 1000.0, 1);
        let pts3 = gen_points_3d(n, 1000.0, 2);
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("quad_n{n}"), |b| {
            b.iter(|| black_box(QuadTree::new(0..n, |&i| pts2[i]).map(|t| t.node_count())));
        });
        group.bench_function(format!("kd_balanced_n{n}"), |b| {
            b.iter(|| black_box(KdTree::new(0..n, |&i| pts3[i]).map(|t| t.node_count())));
        });
        group.bench_function(format!("kd_unbalanced_n{n}"), |b| {
            b.iter(|| {
                let tree = KdTree::with_config(
                    0..n,
                    |&i| pts3[i],
                    TreeConfig::default(),
                    KdBuild::Unbalanced,
                );
                black_box(tree.map(|t| t.node_count()))
            });
        });
        group.bench_function(format!("bulk_2d_n{n}"), |b| {
            b.iter(|| black_box(BulkTree2D::new(0..n, |&i| pts2[i]).map(|t| t.node_count())));
        });
        group.bench_function(format!("bulk_3d_n{n}"), |b| {
            b.iter(|| black_box(BulkTree3D::new(0..n, |&i| pts3[i]).map(|t| t.node_count())));
        });
    }
    group.finish();
}

fn bench_range_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_2d");
    let pts = gen_points_2d(50_000, 1000.0, 3);
    let targets = gen_points_2d(256, 1000.0, 4);
    let quad = QuadTree::new(0..pts.len(), |&i| pts[i]).ok();
    let bulk = BulkTree2D::new(0..pts.len(), |&i| pts[i]).ok();
    let (Some(quad), Some(bulk)) = (quad, bulk) else {
        return;
    };
    group.throughput(Throughput::Elements(targets.len() as u64));

    for &radius in &[5.0, 25.0] {
        group.bench_function(format!("quad_r{radius}"), |b| {
            let pool = ScratchPool::new();
            let mut hits = Vec::new();
            b.iter(|| {
                let mut total = 0;
                for &p in &targets {
                    let mut scratch = pool.acquire();
                    total += quad
                        .elements_in_range_with(&mut scratch, p, radius, 0.0, &mut hits)
                        .len();
                }
                black_box(total)
            });
        });
        group.bench_function(format!("bulk_r{radius}"), |b| {
            let pool = ScratchPool::new();
            let mut hits = Vec::new();
            b.iter(|| {
                let mut total = 0;
                for &p in &targets {
                    let mut scratch = pool.acquire();
                    total += bulk
                        .elements_in_range_with(&mut scratch, p, radius, 0.0, &mut hits)
                        .len();
                }
                black_box(total)
            });
        });
        group.bench_function(format!("quad_ring_r{radius}"), |b| {
            let mut hits = Vec::new();
            b.iter(|| {
                let mut total = 0;
                for &p in &targets {
                    total += quad
                        .elements_in_range_excluding(p, radius, radius * 0.5, &mut hits)
                        .len();
                }
                black_box(total)
            });
        });
    }
    group.finish();
}

fn bench_range_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_3d");
    let pts = gen_points_3d(50_000, 1000.0, 5);
    let targets = gen_points_3d(256, 1000.0, 6);
    let balanced = KdTree::new(0..pts.len(), |&i| pts[i]).ok();
    let bulk = BulkTree3D::new(0..pts.len(), |&i| pts[i]).ok();
    let (Some(balanced), Some(bulk)) = (balanced, bulk) else {
        return;
    };
    group.throughput(Throughput::Elements(targets.len() as u64));

    group.bench_function("kd_r40", |b| {
        let mut hits = Vec::new();
        b.iter(|| {
            let mut total = 0;
            for &p in &targets {
                total += balanced.elements_in_range(p, 40.0, &mut hits).len();
            }
            black_box(total)
        });
    });
    group.bench_function("bulk_r40", |b| {
        let mut hits = Vec::new();
        b.iter(|| {
            let mut total = 0;
            for &p in &targets {
                total += bulk.elements_in_range(p, 40.0, &mut hits).len();
            }
            black_box(total)
        });
    });
    group.bench_function("kd_bounds_80", |b| {
        let mut hits = Vec::new();
        b.iter(|| {
            let mut total = 0;
            for &p in &targets {
                let q = Aabb3D::around(p, 40.0);
                total += balanced.elements_in_bounds(&q, &mut hits).len();
            }
            black_box(total)
        });
    });
    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    let pts = gen_clustered_2d(64, 500, 120.0);
    let targets = gen_points_2d(256, 2000.0, 7);
    let quad = QuadTree::new(0..pts.len(), |&i| pts[i]).ok();
    let bulk = BulkTree2D::new(0..pts.len(), |&i| pts[i]).ok();
    let (Some(quad), Some(bulk)) = (quad, bulk) else {
        return;
    };
    group.throughput(Throughput::Elements(targets.len() as u64));

    for &k in &[1usize, 16] {
        group.bench_function(format!("quad_k{k}"), |b| {
            let pool = ScratchPool::new();
            let mut hits = Vec::new();
            b.iter(|| {
                for &p in &targets {
                    let mut scratch = pool.acquire();
                    quad.approximate_nearest_neighbors_with(&mut scratch, p, k, &mut hits);
                }
                black_box(hits.len())
            });
        });
        group.bench_function(format!("bulk_k{k}"), |b| {
            let pool = ScratchPool::new();
            let mut hits = Vec::new();
            b.iter(|| {
                for &p in &targets {
                    let mut scratch = pool.acquire();
                    bulk.approximate_nearest_neighbors_with(&mut scratch, p, k, &mut hits);
                }
                black_box(hits.len())
            });
        });
    }
    group.finish();
}

fn bench_bulk_rects(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_rects");
    let rects = gen_rects(20_000, 2000.0, 12.0);
    group.throughput(Throughput::Elements(rects.len() as u64));
    for &branch in &[2usize, 4, 8, 16] {
        group.bench_function(format!("build_query_b{branch}"), |b| {
            b.iter_batched(
                || BulkLoadConfig::default().with_branch_factor(branch),
                |config| {
                    let Ok(tree) = BulkTree2D::with_config(0..rects.len(), |&i| rects[i], config)
                    else {
                        return;
                    };
                    let q = Aabb2D::<f64>::from_xywh(100.0, 100.0, 400.0, 400.0);
                    black_box(tree.elements_in_bounds(&q, &mut Vec::new()).len());
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_range_2d,
    bench_range_3d,
    bench_nearest,
    bench_bulk_rects,
);
criterion_main!(benches);
