// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bulk-loaded bounding-volume tree over 2D or 3D boxes.

use alloc::vec::Vec;
use core::cmp::Reverse;
use core::fmt;
use core::ops::Range;

use tracing::{debug, trace};

use crate::bounds::{Bounds, ball_contains, ball_intersects};
use crate::config::BulkLoadConfig;
use crate::error::BuildError;
use crate::morton::{radix_sort, sort_key};
use crate::node::{Entry, Hierarchy, Node, collect_entries, pos, resolve_boundary};
use crate::query::{SpatialQuery, range_radii};
use crate::scratch::{Candidate, Scratch};
use crate::traverse::{Visit, walk};
use crate::types::{Aabb2D, Aabb3D};

/// Immutable bounding-volume tree packed bottom-up from Morton-sorted elements.
///
/// Element centers are quantized against the tree boundary and sorted by Morton key with a
/// radix sort, so construction is linear. Sorted elements are cut into leaves of
/// `bucket_size`, then every `branch_factor` consecutive nodes are grouped under a parent
/// until one root remains.
///
/// Points can be indexed directly: any projection returning `G: Into<B>` works, and
/// points become zero-size boxes. Range queries test zero-size boxes with the exact point
/// distance, so they agree with the point trees.
///
/// Nearest-neighbor search is best-first and returns the exact `count` nearest distinct
/// values by closest-point distance. A value stored more than once is ranked by its
/// nearest copy.
#[derive(Clone)]
pub struct BulkTree<V, B> {
    entries: Vec<Entry<V, B>>,
    hierarchy: Hierarchy<B>,
    branch_factor: usize,
}

/// Bulk-loaded tree over 2D boxes or points.
pub type BulkTree2D<V, T = f64> = BulkTree<V, Aabb2D<T>>;

/// Bulk-loaded tree over 3D boxes or points.
pub type BulkTree3D<V, T = f64> = BulkTree<V, Aabb3D<T>>;

impl<V, B: Bounds> BulkTree<V, B> {
    /// Build with the default configuration.
    pub fn new<G, P>(source: impl IntoIterator<Item = V>, project: P) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> G,
        G: Into<B>,
    {
        Self::with_config(source, project, BulkLoadConfig::default())
    }

    /// Build from `source`, bounding each value with `project`.
    pub fn with_config<G, P>(
        source: impl IntoIterator<Item = V>,
        project: P,
        config: BulkLoadConfig<B>,
    ) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> G,
        G: Into<B>,
    {
        config.validate()?;
        let (entries, data) = collect_entries(source, |v| project(v).into(), |b: &B| *b)?;
        let frame = resolve_boundary(data, config.boundary);
        let hierarchy = if entries.is_empty() {
            trace!("empty bulk-loaded tree");
            Hierarchy::empty(frame)
        } else {
            pack(&entries, frame, config.bucket_size, config.branch_factor)
        };
        debug!(
            elements = entries.len(),
            nodes = hierarchy.nodes.len(),
            depth = hierarchy.depth(),
            bucket_size = config.bucket_size,
            branch_factor = config.branch_factor,
            dim = B::DIM,
            "built bulk-loaded tree"
        );
        Ok(Self {
            entries,
            hierarchy,
            branch_factor: config.branch_factor,
        })
    }

    /// Children per internal node.
    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    /// Stored entries, in source order.
    pub fn entries(&self) -> &[Entry<V, B>] {
        &self.entries
    }

    /// Flat node arena; the children of a node are adjacent.
    pub fn nodes(&self) -> &[Node<B>] {
        &self.hierarchy.nodes
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.hierarchy.nodes.len()
    }

    /// Levels from the root to the deepest leaf.
    pub fn depth(&self) -> usize {
        self.hierarchy.depth()
    }

    /// Index-array ranges of every leaf.
    pub fn leaf_ranges(&self) -> Vec<Range<usize>> {
        self.hierarchy.leaf_ranges()
    }

    #[inline]
    fn geometry(&self, i: u32) -> &B {
        &self.entries[i as usize].geometry
    }
}

fn pack<V, B: Bounds>(
    entries: &[Entry<V, B>],
    frame: B,
    bucket_size: usize,
    branch_factor: usize,
) -> Hierarchy<B> {
    let mut keyed: Vec<(u64, u32)> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (sort_key(&e.geometry.center(), &frame), pos(i)))
        .collect();
    radix_sort(&mut keyed);
    let indices: Vec<u32> = keyed.into_iter().map(|(_, i)| i).collect();

    let leaves = indices.len().div_ceil(bucket_size);
    let mut nodes: Vec<Node<B>> = Vec::with_capacity(leaves + leaves / (branch_factor - 1) + 1);
    for (chunk, ids) in indices.chunks(bucket_size).enumerate() {
        let bounds = ids
            .iter()
            .map(|&i| entries[i as usize].geometry)
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or(frame);
        nodes.push(Node::leaf(
            bounds.padded(),
            pos(chunk * bucket_size),
            pos(ids.len()),
        ));
    }

    let mut level = 0..nodes.len();
    while level.len() > 1 {
        let next = nodes.len();
        let mut first = level.start;
        while first < level.end {
            let end = (first + branch_factor).min(level.end);
            let group = &nodes[first..end];
            let bounds = group
                .iter()
                .map(Node::bounds)
                .reduce(|acc, b| acc.union(&b))
                .unwrap_or(frame);
            let count: usize = group.iter().map(Node::len).sum();
            let start = group[0].range().start;
            nodes.push(Node::internal(
                bounds.padded(),
                pos(start),
                pos(count),
                pos(first),
                pos(end - first),
            ));
            first = end;
        }
        level = next..nodes.len();
    }

    let root = nodes.len() - 1;
    let root_bounds = nodes[root].bounds().union(&frame);
    nodes[root].set_bounds(root_bounds);
    Hierarchy {
        nodes,
        indices,
        root: pos(root),
    }
}

impl<V: Clone + PartialEq, B: Bounds> SpatialQuery<V> for BulkTree<V, B> {
    type Scalar = B::Scalar;
    type Point = B::Point;
    type Bounds = B;

    fn boundary(&self) -> B {
        self.hierarchy.root().bounds()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn elements_in_range_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: B::Point,
        range: B::Scalar,
        minimum_range: B::Scalar,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        let Some((outer, inner)) = range_radii(range, minimum_range) else {
            return out;
        };
        let query = B::around(position, range);
        let accepts = |g: &B| {
            let near = if g.is_point_like() {
                g.distance_squared_to_point(&position) <= outer
            } else {
                ball_intersects(g, &position, outer)
            };
            near && !inner.is_some_and(|m| ball_contains(g, &position, m))
        };
        walk(
            &self.hierarchy,
            &mut scratch.stack,
            |b| {
                if !b.intersects(&query) || !ball_intersects(b, &position, outer) {
                    Visit::Skip
                } else if inner.is_none() && ball_contains(b, &position, outer) {
                    Visit::Whole
                } else {
                    Visit::Descend
                }
            },
            |slice, whole| {
                for &i in slice {
                    if whole || accepts(self.geometry(i)) {
                        out.push(self.entries[i as usize].value.clone());
                    }
                }
            },
        );
        out
    }

    fn elements_in_bounds_with<'o>(
        &self,
        scratch: &mut Scratch,
        bounds: &B,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        walk(
            &self.hierarchy,
            &mut scratch.stack,
            |b| {
                if !b.intersects(bounds) {
                    Visit::Skip
                } else if bounds.contains(b) {
                    Visit::Whole
                } else {
                    Visit::Descend
                }
            },
            |slice, whole| {
                for &i in slice {
                    if whole || self.geometry(i).intersects(bounds) {
                        out.push(self.entries[i as usize].value.clone());
                    }
                }
            },
        );
        out
    }

    fn approximate_nearest_neighbors_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: B::Point,
        count: usize,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        if count == 0 || self.entries.is_empty() {
            return out;
        }
        let Scratch {
            candidates,
            frontier,
            best,
            ..
        } = scratch;
        candidates.clear();
        frontier.clear();
        best.clear();

        let h = &self.hierarchy;
        let root_distance = h.root().bounds().distance_squared_to_point(&position);
        frontier.push(Reverse(Candidate::new(root_distance, h.root)));
        while let Some(Reverse(next)) = frontier.pop() {
            let full = best.len() == count;
            if full && best.peek().is_some_and(|worst| next.distance > worst.distance) {
                break;
            }
            let node = h.node(next.id);
            if node.is_leaf() {
                for &i in h.slice(node) {
                    let c = Candidate::new(self.geometry(i).distance_squared_to_point(&position), i);
                    let value = &self.entries[i as usize].value;
                    let twin = best
                        .iter()
                        .find(|b| self.entries[b.id as usize].value == *value)
                        .copied();
                    if let Some(twin) = twin {
                        // Keep the nearer copy of a value already in the set.
                        if c < twin {
                            best.retain(|b| b.id != twin.id);
                            best.push(c);
                        }
                    } else if best.len() < count {
                        best.push(c);
                    } else if best.peek().is_some_and(|worst| c.distance < worst.distance) {
                        best.pop();
                        best.push(c);
                    }
                }
            } else {
                for child in node.children() {
                    let d = h.node(child).bounds().distance_squared_to_point(&position);
                    if best.len() < count || best.peek().is_some_and(|worst| d <= worst.distance) {
                        frontier.push(Reverse(Candidate::new(d, child)));
                    }
                }
            }
        }

        candidates.extend(best.drain());
        candidates.sort_unstable();
        out.extend(
            candidates
                .iter()
                .map(|c| self.entries[c.id as usize].value.clone()),
        );
        out
    }
}

impl<V, B: Bounds> fmt::Debug for BulkTree<V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkTree")
            .field("len", &self.entries.len())
            .field("nodes", &self.hierarchy.nodes.len())
            .field("branch_factor", &self.branch_factor)
            .field("boundary", &self.hierarchy.root().bounds())
            .finish_non_exhaustive()
    }
}
