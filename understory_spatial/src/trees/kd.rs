// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-split (k-d) tree over 3D points.

use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use tracing::{debug, trace};

use crate::bounds::{ball_contains, ball_intersects};
use crate::config::{KdBuild, TreeConfig};
use crate::error::BuildError;
use crate::node::{Entry, Hierarchy, Node, collect_entries, pos, resolve_boundary};
use crate::query::{SpatialQuery, range_radii};
use crate::scratch::Scratch;
use crate::traverse::{Visit, greedy_nearest, walk};
use crate::types::{Aabb3D, Point3, Scalar};

/// Ranges at or below this size are finished with an insertion sort during median selection.
const INSERTION_THRESHOLD: usize = 16;

/// Immutable 3D point tree with binary axis-aligned splits.
///
/// [`KdBuild::Balanced`] splits every node at the exact median of one axis, cycling
/// x, y, z by depth. [`KdBuild::Unbalanced`] cuts at the center of the node's box on the
/// current axis and stops when a cut leaves one side empty. Both share the same queries.
///
/// Node boxes are the padded bounds of their points, so whole subtrees can be accepted
/// when their box lies inside the query sphere. Nearest-neighbor search descends toward
/// the child whose box center is closer and is approximate, like [`QuadTree`]'s.
///
/// [`QuadTree`]: crate::QuadTree
#[derive(Clone)]
pub struct KdTree<V, T = f64> {
    entries: Vec<Entry<V, Point3<T>>>,
    hierarchy: Hierarchy<Aabb3D<T>>,
    mode: KdBuild,
}

impl<V, T: Scalar> KdTree<V, T> {
    /// Build a balanced tree with the default configuration.
    pub fn new<P>(source: impl IntoIterator<Item = V>, project: P) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> Point3<T>,
    {
        Self::with_config(source, project, TreeConfig::default(), KdBuild::Balanced)
    }

    /// Build from `source` with an explicit configuration and build mode.
    pub fn with_config<P>(
        source: impl IntoIterator<Item = V>,
        project: P,
        config: TreeConfig<Aabb3D<T>>,
        mode: KdBuild,
    ) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> Point3<T>,
    {
        config.validate()?;
        let (entries, data) = collect_entries(source, project, |p| Aabb3D::from_point(*p))?;
        let boundary = resolve_boundary(data, config.boundary);
        if entries.is_empty() {
            trace!("empty k-d tree");
            return Ok(Self {
                entries,
                hierarchy: Hierarchy::empty(boundary),
                mode,
            });
        }
        let hierarchy = Builder::new(&entries, config.bucket_size, mode).build(boundary);
        debug!(
            elements = entries.len(),
            nodes = hierarchy.nodes.len(),
            depth = hierarchy.depth(),
            bucket_size = config.bucket_size,
            ?mode,
            "built k-d tree"
        );
        Ok(Self {
            entries,
            hierarchy,
            mode,
        })
    }

    /// How the tree was partitioned.
    pub fn mode(&self) -> KdBuild {
        self.mode
    }

    /// Stored entries, in source order.
    pub fn entries(&self) -> &[Entry<V, Point3<T>>] {
        &self.entries
    }

    /// Flat node arena; the children of a node are adjacent.
    pub fn nodes(&self) -> &[Node<Aabb3D<T>>] {
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
    fn point(&self, i: u32) -> &Point3<T> {
        &self.entries[i as usize].geometry
    }
}

struct Builder<'a, V, T> {
    entries: &'a [Entry<V, Point3<T>>],
    bucket_size: usize,
    mode: KdBuild,
    indices: Vec<u32>,
    nodes: Vec<Node<Aabb3D<T>>>,
}

impl<'a, V, T: Scalar> Builder<'a, V, T> {
    fn new(entries: &'a [Entry<V, Point3<T>>], bucket_size: usize, mode: KdBuild) -> Self {
        Self {
            entries,
            bucket_size,
            mode,
            indices: (0..entries.len()).map(pos).collect(),
            nodes: Vec::new(),
        }
    }

    fn tight_bounds(&self, range: Range<usize>) -> Aabb3D<T> {
        self.indices[range]
            .iter()
            .map(|&i| Aabb3D::from_point(self.entries[i as usize].geometry))
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or_else(|| Aabb3D::from_point(Point3::new(T::zero(), T::zero(), T::zero())))
            .padded()
    }

    fn build(mut self, boundary: Aabb3D<T>) -> Hierarchy<Aabb3D<T>> {
        let n = self.indices.len();
        let root = Node::leaf(self.tight_bounds(0..n), 0, pos(n));
        self.nodes.push(root);

        let mut work = alloc::vec![(0_usize, 0_usize)];
        while let Some((id, axis)) = work.pop() {
            let node = self.nodes[id];
            if node.len() <= self.bucket_size {
                continue;
            }
            let range = node.range();
            let Some(mid) = self.split(range.clone(), axis, &node.bounds()) else {
                continue;
            };
            let first = self.nodes.len();
            let left = self.tight_bounds(range.start..mid);
            let right = self.tight_bounds(mid..range.end);
            self.nodes
                .push(Node::leaf(left, pos(range.start), pos(mid - range.start)));
            self.nodes.push(Node::leaf(right, pos(mid), pos(range.end - mid)));
            self.nodes[id] = Node::internal(
                node.bounds(),
                pos(range.start),
                pos(node.len()),
                pos(first),
                2,
            );
            let next = (axis + 1) % 3;
            work.push((first, next));
            work.push((first + 1, next));
        }

        // Children follow their parent in the arena, so a reverse sweep sees them first.
        for id in (0..self.nodes.len()).rev() {
            let node = self.nodes[id];
            if node.is_leaf() {
                continue;
            }
            let bounds = node
                .children()
                .map(|c| self.nodes[c as usize].bounds())
                .fold(node.bounds(), |acc, b| acc.union(&b));
            self.nodes[id].set_bounds(bounds);
        }
        let root_bounds = self.nodes[0].bounds().union(&boundary);
        self.nodes[0].set_bounds(root_bounds);

        Hierarchy {
            nodes: self.nodes,
            indices: self.indices,
            root: 0,
        }
    }

    /// Reorder `range` and return the split position, or `None` to keep a leaf.
    fn split(&mut self, range: Range<usize>, axis: usize, bounds: &Aabb3D<T>) -> Option<usize> {
        let entries = self.entries;
        let key = |i: u32| entries[i as usize].geometry.axis(axis);
        let slice = &mut self.indices[range.clone()];
        match self.mode {
            KdBuild::Balanced => {
                let half = slice.len() / 2;
                select_nth(slice, half, key);
                Some(range.start + half)
            }
            KdBuild::Unbalanced => {
                let cut = T::mid(bounds.axis_min(axis), bounds.axis_max(axis));
                let left = partition_le(slice, cut, key);
                if left == 0 || left == slice.len() {
                    trace!(count = slice.len(), axis, "one-sided k-d cut, kept as leaf");
                    return None;
                }
                Some(range.start + left)
            }
        }
    }
}

/// Move indices whose key is at most `cut` to the front; return how many there are.
fn partition_le<T: Scalar>(s: &mut [u32], cut: T, key: impl Fn(u32) -> T) -> usize {
    let mut left = 0;
    for i in 0..s.len() {
        if key(s[i]) <= cut {
            s.swap(left, i);
            left += 1;
        }
    }
    left
}

/// Reorder `s` so that `s[nth]` holds the element of rank `nth` by `key`, with no greater
/// key before it and no smaller key after it.
fn select_nth<T: Scalar>(s: &mut [u32], nth: usize, key: impl Fn(u32) -> T) {
    let (mut lo, mut hi) = (0, s.len());
    while hi - lo > INSERTION_THRESHOLD {
        let pivot = median_of_three(key(s[lo]), key(s[lo + (hi - lo) / 2]), key(s[hi - 1]));
        let (lt, gt) = partition3(&mut s[lo..hi], pivot, &key);
        let (lt, gt) = (lo + lt, lo + gt);
        if nth < lt {
            hi = lt;
        } else if nth >= gt {
            lo = gt;
        } else {
            return;
        }
    }
    insertion_sort(&mut s[lo..hi], &key);
}

fn median_of_three<T: PartialOrd>(a: T, b: T, c: T) -> T {
    if a < b {
        if b < c {
            b
        } else if a < c {
            c
        } else {
            a
        }
    } else if a < c {
        a
    } else if b < c {
        c
    } else {
        b
    }
}

/// Three-way partition around `pivot`: returns the start of the equal run and the start
/// of the greater run.
fn partition3<T: Scalar>(s: &mut [u32], pivot: T, key: &impl Fn(u32) -> T) -> (usize, usize) {
    let (mut lt, mut i, mut gt) = (0, 0, s.len());
    while i < gt {
        let k = key(s[i]);
        if k < pivot {
            s.swap(lt, i);
            lt += 1;
            i += 1;
        } else if k > pivot {
            gt -= 1;
            s.swap(i, gt);
        } else {
            i += 1;
        }
    }
    (lt, gt)
}

fn insertion_sort<T: Scalar>(s: &mut [u32], key: &impl Fn(u32) -> T) {
    for i in 1..s.len() {
        let mut j = i;
        while j > 0 && key(s[j - 1]) > key(s[j]) {
            s.swap(j - 1, j);
            j -= 1;
        }
    }
}

impl<V: Clone + PartialEq, T: Scalar> SpatialQuery<V> for KdTree<V, T> {
    type Scalar = T;
    type Point = Point3<T>;
    type Bounds = Aabb3D<T>;

    fn boundary(&self) -> Aabb3D<T> {
        self.hierarchy.root().bounds()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn elements_in_range_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: Point3<T>,
        range: T,
        minimum_range: T,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        let Some((outer, inner)) = range_radii(range, minimum_range) else {
            return out;
        };
        let query = Aabb3D::around(position, range);
        walk(
            &self.hierarchy,
            &mut scratch.stack,
            |b| {
                if !b.intersects(&query) || !ball_intersects(b, &position, outer) {
                    return Visit::Skip;
                }
                if inner.is_some_and(|m| ball_contains(b, &position, m)) {
                    return Visit::Skip;
                }
                let clear_of_inner = inner.is_none_or(|m| !ball_intersects(b, &position, m));
                if clear_of_inner && ball_contains(b, &position, outer) {
                    Visit::Whole
                } else {
                    Visit::Descend
                }
            },
            |slice, whole| {
                for &i in slice {
                    if !whole {
                        let d2 = self.point(i).distance_squared(&position);
                        if d2 > outer || inner.is_some_and(|m| d2 <= m) {
                            continue;
                        }
                    }
                    out.push(self.entries[i as usize].value.clone());
                }
            },
        );
        out
    }

    fn elements_in_bounds_with<'o>(
        &self,
        scratch: &mut Scratch,
        bounds: &Aabb3D<T>,
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
                    if whole || bounds.contains_point(self.point(i)) {
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
        position: Point3<T>,
        count: usize,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        if count == 0 || self.entries.is_empty() {
            return out;
        }
        greedy_nearest(
            &self.hierarchy,
            count,
            scratch,
            |b| b.center().distance_squared(&position),
            |i| self.point(i).distance_squared(&position),
            |a, b| self.entries[a as usize].value == self.entries[b as usize].value,
        );
        out.extend(
            scratch
                .candidates
                .iter()
                .map(|c| self.entries[c.id as usize].value.clone()),
        );
        out
    }
}

impl<V, T: Scalar> fmt::Debug for KdTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KdTree")
            .field("len", &self.entries.len())
            .field("nodes", &self.hierarchy.nodes.len())
            .field("mode", &self.mode)
            .field("boundary", &self.hierarchy.root().bounds())
            .finish_non_exhaustive()
    }
}
