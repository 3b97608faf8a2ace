// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bulk-loaded tree over rectangles.
//!
//! Pack kurbo rectangles into a bulk tree, reuse one scratch pool across many queries, and
//! find the rectangles closest to the pointer.
//!
//! Run:
//! - `RUST_LOG=understory_spatial=debug cargo run -p understory_spatial_demos --example bulk_nearest`

use kurbo::{Point, Rect};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_spatial::{BulkLoadConfig, BulkTree2D, Point2, ScratchPool, SpatialQuery};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A 32x32 grid of tiles with a gap between them.
    let tiles: Vec<Rect> = (0..32 * 32_u32)
        .map(|i| {
            let (x, y) = (f64::from(i % 32) * 10.0, f64::from(i / 32) * 10.0);
            Rect::new(x, y, x + 8.0, y + 8.0)
        })
        .collect();

    let config = BulkLoadConfig::default()
        .with_bucket_size(8)
        .with_branch_factor(8);
    let tree = match BulkTree2D::with_config(0..tiles.len(), |&i| tiles[i], config) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("could not build: {err}");
            return;
        }
    };
    info!(nodes = tree.node_count(), depth = tree.depth(), "packed tiles");

    let pool = ScratchPool::new();
    let mut hits = Vec::new();
    let mut touched = 0;
    for step in 0..100_u32 {
        let pointer = Point::new(f64::from(step) * 3.1, f64::from(step) * 2.7);
        let mut scratch = pool.acquire();
        tree.elements_in_range_with(&mut scratch, pointer.into(), 6.0, 0.0, &mut hits);
        touched += hits.len();
    }
    println!("tiles near the pointer path: {touched} (pool holds {})", pool.idle());

    let pointer = Point2::new(123.0, 77.0);
    let mut scratch = pool.acquire();
    tree.approximate_nearest_neighbors_with(&mut scratch, pointer, 4, &mut hits);
    for &i in &hits {
        println!("near {pointer:?}: tile {i} at {:?}", tiles[i]);
    }
}
