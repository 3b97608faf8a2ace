// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad tree basics.
//!
//! Index a handful of named sites, then ask what lies within a ring and which sites are
//! closest to a query point.
//!
//! Run:
//! - `RUST_LOG=understory_spatial=trace cargo run -p understory_spatial_demos --example quad_basics`

use tracing_subscriber::EnvFilter;
use understory_spatial::{Aabb2D, Point2, QuadTree, SpatialQuery, TreeConfig};

#[derive(Clone, Debug, PartialEq)]
struct Site {
    name: &'static str,
    at: Point2<f64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let sites: Vec<Site> = [
        ("well", 0.0, 0.0),
        ("mill", 3.0, 1.0),
        ("inn", -2.0, 4.0),
        ("gate", 8.0, 8.0),
        ("shrine", 1.0, -1.5),
        ("tower", -6.0, -6.0),
    ]
    .into_iter()
    .map(|(name, x, y)| Site {
        name,
        at: Point2::new(x, y),
    })
    .collect();

    let config = TreeConfig::default()
        .with_bucket_size(2)
        .with_boundary(Aabb2D::new(-10.0, -10.0, 10.0, 10.0));
    let tree = match QuadTree::with_config(sites, |s| s.at, config) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("could not build: {err}");
            return;
        }
    };
    println!(
        "{} sites, {} nodes, depth {}, boundary {:?}",
        tree.len(),
        tree.node_count(),
        tree.depth(),
        tree.boundary()
    );

    // Between 1 and 5 units from the well.
    let mut hits = Vec::new();
    tree.elements_in_range_excluding(Point2::new(0.0, 0.0), 5.0, 1.0, &mut hits);
    let names: Vec<_> = hits.iter().map(|s| s.name).collect();
    println!("ring around the well: {names:?}");

    // The two closest sites to a traveler near the gate.
    tree.approximate_nearest_neighbors(Point2::new(6.0, 5.0), 2, &mut hits);
    let names: Vec<_> = hits.iter().map(|s| s.name).collect();
    println!("closest to (6, 5): {names:?}");
}
