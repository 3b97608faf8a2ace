// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_spatial --heading-base-level=0

//! Understory Spatial: immutable spatial trees for "what is near here" queries.
//!
//! Three build-once, query-many structures share one query contract, [`SpatialQuery`]:
//!
//! - [`QuadTree`]: 2D points, split into quadrants around each node's center.
//! - [`KdTree`]: 3D points, split at the median of one axis ([`KdBuild::Balanced`]) or at
//!   the center of the node's box ([`KdBuild::Unbalanced`]).
//! - [`BulkTree`] ([`BulkTree2D`], [`BulkTree3D`]): boxes or points, sorted along a Morton
//!   curve with a linear-time radix sort and packed bottom-up into fixed-fanout nodes.
//!
//! Every tree answers range queries (with an optional minimum range), box queries, and
//! nearest-neighbor queries. Nearest-neighbor results hold distinct values, so stored
//! values must be `PartialEq`. Queries clear and fill a caller-owned buffer and hand the same
//! buffer back, so a loop of queries does not allocate. Trees are immutable; rebuild from
//! the new element set when it changes.
//!
//! # Example
//!
//! ```rust
//! use understory_spatial::{Point2, QuadTree, SpatialQuery};
//!
//! let sites = [("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 0.0, 1.0), ("d", 5.0, 5.0)];
//! let tree = QuadTree::new(sites, |s| Point2::new(s.1, s.2)).unwrap();
//!
//! let mut near = Vec::new();
//! tree.elements_in_range(Point2::new(0.0, 0.0), 1.5, &mut near);
//! assert_eq!(near.len(), 3);
//!
//! tree.approximate_nearest_neighbors(Point2::new(4.0, 4.0), 1, &mut near);
//! assert_eq!(near[0].0, "d");
//! ```
//!
//! Code written against [`SpatialQuery`] works with any of the trees:
//!
//! ```rust
//! use understory_spatial::{
//!     BulkLoadConfig, BulkTree3D, KdBuild, KdTree, Point3, SpatialQuery, TreeConfig,
//! };
//!
//! fn crowded<Q: SpatialQuery<u32>>(q: &Q, at: Q::Point, radius: Q::Scalar) -> bool {
//!     q.elements_in_range(at, radius, &mut Vec::new()).len() > 2
//! }
//!
//! let points: Vec<Point3<f64>> = (0..64_u32)
//!     .map(|i| Point3::new(f64::from(i % 4), f64::from(i / 4 % 4), f64::from(i / 16)))
//!     .collect();
//! let kd = KdTree::with_config(
//!     0..64_u32,
//!     |&i| points[i as usize],
//!     TreeConfig::default(),
//!     KdBuild::Unbalanced,
//! )
//! .unwrap();
//! let bulk = BulkTree3D::with_config(
//!     0..64_u32,
//!     |&i| points[i as usize],
//!     BulkLoadConfig::default().with_branch_factor(8),
//! )
//! .unwrap();
//!
//! let center = Point3::new(1.5, 1.5, 1.5);
//! assert_eq!(crowded(&kd, center, 1.0), crowded(&bulk, center, 1.0));
//! ```
//!
//! ## Nearest neighbors are approximate for two of the trees
//!
//! [`QuadTree`] and [`KdTree`] descend greedily toward the closest child and widen only
//! until enough candidates are found, so a closer element just across a partition border
//! can be missed. [`BulkTree`] searches best-first and returns the exact nearest set.
//!
//! ## Scratch space
//!
//! The plain query methods allocate traversal scratch per call. Hot loops can pass a
//! [`Scratch`] to the `*_with` variants, or borrow one from a [`ScratchPool`]; the pool's
//! guard clears and returns it on every exit path.
//!
//! ### Float semantics
//!
//! Coordinates are `f32` or `f64`. Squared distances are accumulated in `f64`. Inputs with
//! NaN or infinite coordinates are rejected at build time with [`BuildError`]. Degenerate
//! node boxes are padded to [`Scalar::min_extent`] so containment stays well defined.
//!
//! This crate is `no_std` and uses `alloc`. Build events are reported through `tracing`.

#![no_std]

extern crate alloc;

pub mod bounds;
pub mod config;
pub mod error;
pub mod query;
pub mod scratch;
pub mod sphere;
pub mod trees;
pub mod types;

mod interop;
mod morton;
mod node;
mod traverse;

pub use bounds::{Bounds, ball_contains, ball_intersects};
pub use config::{BulkLoadConfig, DEFAULT_BRANCH_FACTOR, DEFAULT_BUCKET_SIZE, KdBuild, TreeConfig};
pub use error::BuildError;
pub use node::{Entry, Node};
pub use query::SpatialQuery;
pub use scratch::{PooledScratch, Scratch, ScratchPool};
pub use sphere::{Circle, Sphere};
pub use trees::{BulkTree, BulkTree2D, BulkTree3D, KdTree, QuadTree};
pub use types::{Aabb2D, Aabb3D, Point2, Point3, Scalar};
