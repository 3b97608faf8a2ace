// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The three immutable trees.
//!
//! - `quad`: 2D points, four-way split around each node's center.
//! - `kd`: 3D points, binary splits at the median (balanced) or the box center (unbalanced).
//! - `bulk`: 2D/3D boxes or points, Morton-ordered and packed bottom-up.
//!
//! All three keep their entries in source order and reorder a separate `u32` index array,
//! so every node covers one contiguous slice of it. They answer the same
//! [`SpatialQuery`](crate::SpatialQuery) contract and can be swapped without touching call
//! sites.
//!
//! Nearest neighbors
//! -----------------
//! `quad` and `kd` descend greedily toward the closest child and widen into skipped
//! siblings only until `count` candidates are gathered. This is fast but approximate:
//! a nearer point across a partition border can be missed. `bulk` searches best-first over
//! closest-point box distances with an early exit, which returns the exact nearest set.

pub mod bulk;
pub mod kd;
pub mod quad;

pub use bulk::{BulkTree, BulkTree2D, BulkTree3D};
pub use kd::KdTree;
pub use quad::QuadTree;
