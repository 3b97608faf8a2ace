// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! K-d tree build modes.
//!
//! Build the same skewed point cloud with median and center splits and compare the shape
//! of the resulting trees.
//!
//! Run:
//! - `RUST_LOG=understory_spatial=debug cargo run -p understory_spatial_demos --example kd_modes`

use tracing_subscriber::EnvFilter;
use understory_spatial::{KdBuild, KdTree, Point3, SpatialQuery, TreeConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Dense near the origin, sparse further out.
    let points: Vec<Point3<f32>> = (0..2000_u16)
        .map(|i| {
            let t = f32::from(i) / 2000.0;
            let r = t * t * t * 100.0;
            let a = f32::from(i) * 0.61;
            Point3::new(r * a.cos(), r * a.sin(), f32::from(i % 7))
        })
        .collect();

    for mode in [KdBuild::Balanced, KdBuild::Unbalanced] {
        let tree = match KdTree::with_config(
            0..points.len(),
            |&i| points[i],
            TreeConfig::default(),
            mode,
        ) {
            Ok(tree) => tree,
            Err(err) => {
                eprintln!("could not build: {err}");
                return;
            }
        };
        let leaves = tree.leaf_ranges();
        let largest = leaves.iter().map(|r| r.len()).max().unwrap_or(0);
        println!(
            "{mode:?}: {} nodes, {} leaves, depth {}, largest leaf {largest}",
            tree.node_count(),
            leaves.len(),
            tree.depth(),
        );

        let mut hits = Vec::new();
        tree.elements_in_range(Point3::new(0.0, 0.0, 3.0), 2.0, &mut hits);
        println!("  within 2 of (0, 0, 3): {}", hits.len());
    }
}
