// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadrant-partition tree over 2D points.

use alloc::vec::Vec;
use core::fmt;
use core::ops::Range;

use tracing::{debug, trace};

use crate::config::TreeConfig;
use crate::error::BuildError;
use crate::node::{Entry, Hierarchy, Node, collect_entries, pos, resolve_boundary};
use crate::query::{SpatialQuery, range_radii};
use crate::scratch::Scratch;
use crate::traverse::{Visit, greedy_nearest, walk};
use crate::types::{Aabb2D, Point2, Scalar};

/// Immutable 2D point tree that splits each node into four quadrants around its center.
///
/// Points on a vertical center line go east, points on a horizontal one go north. A node
/// stays a leaf while it holds at most `bucket_size` points, when every point falls into the
/// same quadrant, or once its box shrinks below [`Scalar::min_extent`].
///
/// Nearest-neighbor search descends greedily into the closest quadrant and widens into
/// skipped siblings until enough candidates exist. It is approximate: a closer point just
/// across a quadrant border can be missed.
#[derive(Clone)]
pub struct QuadTree<V, T = f64> {
    entries: Vec<Entry<V, Point2<T>>>,
    hierarchy: Hierarchy<Aabb2D<T>>,
}

impl<V, T: Scalar> QuadTree<V, T> {
    /// Build with the default configuration.
    pub fn new<P>(source: impl IntoIterator<Item = V>, project: P) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> Point2<T>,
    {
        Self::with_config(source, project, TreeConfig::default())
    }

    /// Build from `source`, positioning each value with `project`.
    pub fn with_config<P>(
        source: impl IntoIterator<Item = V>,
        project: P,
        config: TreeConfig<Aabb2D<T>>,
    ) -> Result<Self, BuildError>
    where
        P: Fn(&V) -> Point2<T>,
    {
        config.validate()?;
        let (entries, data) = collect_entries(source, project, |p| Aabb2D::from_point(*p))?;
        let boundary = resolve_boundary(data, config.boundary);
        if entries.is_empty() {
            trace!("empty quad tree");
            return Ok(Self {
                entries,
                hierarchy: Hierarchy::empty(boundary),
            });
        }
        let hierarchy = build(&entries, boundary, config.bucket_size);
        debug!(
            elements = entries.len(),
            nodes = hierarchy.nodes.len(),
            depth = hierarchy.depth(),
            bucket_size = config.bucket_size,
            "built quad tree"
        );
        Ok(Self { entries, hierarchy })
    }

    /// Stored entries, in source order.
    pub fn entries(&self) -> &[Entry<V, Point2<T>>] {
        &self.entries
    }

    /// Flat node arena; the children of a node are adjacent.
    pub fn nodes(&self) -> &[Node<Aabb2D<T>>] {
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
    fn point(&self, i: u32) -> &Point2<T> {
        &self.entries[i as usize].geometry
    }
}

/// Quadrant id `(north << 1) | east` of `p` relative to `center`.
#[inline]
fn quadrant<T: Scalar>(p: &Point2<T>, center: &Point2<T>) -> u8 {
    let east = p.x >= center.x;
    let north = p.y >= center.y;
    (u8::from(north) << 1) | u8::from(east)
}

fn quadrant_bounds<T: Scalar>(b: &Aabb2D<T>, center: &Point2<T>, q: usize) -> Aabb2D<T> {
    let (min_x, max_x) = if q & 1 == 1 {
        (center.x, b.max_x)
    } else {
        (b.min_x, center.x)
    };
    let (min_y, max_y) = if q & 2 == 2 {
        (center.y, b.max_y)
    } else {
        (b.min_y, center.y)
    };
    Aabb2D::new(min_x, min_y, max_x, max_y)
}

fn build<V, T: Scalar>(
    entries: &[Entry<V, Point2<T>>],
    boundary: Aabb2D<T>,
    bucket_size: usize,
) -> Hierarchy<Aabb2D<T>> {
    let n = entries.len();
    let mut indices: Vec<u32> = (0..n).map(pos).collect();
    let mut nodes = alloc::vec![Node::leaf(boundary, 0, pos(n))];
    let mut buffer: Vec<u32> = Vec::with_capacity(n);
    let mut quadrants: Vec<u8> = Vec::with_capacity(n);
    let min_extent = T::widen(T::min_extent());

    let mut work = alloc::vec![0_usize];
    while let Some(id) = work.pop() {
        let node = nodes[id];
        if node.len() <= bucket_size {
            continue;
        }
        let bounds = node.bounds();
        if bounds.max_extent() < min_extent {
            trace!(count = node.len(), "quad node below minimum extent, kept as leaf");
            continue;
        }
        let center = bounds.center();
        let range = node.range();
        let slice = &mut indices[range.clone()];

        // One pass to tag and count, one to scatter; both keep the source order per quadrant.
        let mut counts = [0_usize; 4];
        quadrants.clear();
        for &i in slice.iter() {
            let q = quadrant(&entries[i as usize].geometry, &center);
            counts[usize::from(q)] += 1;
            quadrants.push(q);
        }
        if counts.contains(&node.len()) {
            trace!(count = node.len(), "all points share a quadrant, kept as leaf");
            continue;
        }
        let mut offsets = [0_usize; 4];
        for q in 1..4 {
            offsets[q] = offsets[q - 1] + counts[q - 1];
        }
        buffer.clear();
        buffer.resize(slice.len(), 0);
        for (&i, &q) in slice.iter().zip(&quadrants) {
            let q = usize::from(q);
            buffer[offsets[q]] = i;
            offsets[q] += 1;
        }
        slice.copy_from_slice(&buffer);

        let first = nodes.len();
        let mut start = range.start;
        for (q, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = Node::leaf(quadrant_bounds(&bounds, &center, q), pos(start), pos(count));
            nodes.push(child);
            start += count;
        }
        let child_count = nodes.len() - first;
        nodes[id] = Node::internal(
            bounds,
            pos(range.start),
            pos(node.len()),
            pos(first),
            pos(child_count),
        );
        work.extend(first..first + child_count);
    }

    Hierarchy {
        nodes,
        indices,
        root: 0,
    }
}

impl<V: Clone + PartialEq, T: Scalar> SpatialQuery<V> for QuadTree<V, T> {
    type Scalar = T;
    type Point = Point2<T>;
    type Bounds = Aabb2D<T>;

    fn boundary(&self) -> Aabb2D<T> {
        self.hierarchy.root().bounds()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn elements_in_range_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: Point2<T>,
        range: T,
        minimum_range: T,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        out.clear();
        let Some((outer, inner)) = range_radii(range, minimum_range) else {
            return out;
        };
        let query = Aabb2D::around(position, range);
        walk(
            &self.hierarchy,
            &mut scratch.stack,
            |b| {
                if !b.intersects(&query) {
                    Visit::Skip
                } else if query.contains(b) {
                    Visit::Whole
                } else {
                    Visit::Descend
                }
            },
            |slice, _| {
                for &i in slice {
                    let d2 = self.point(i).distance_squared(&position);
                    if d2 <= outer && inner.is_none_or(|m| d2 > m) {
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
        bounds: &Aabb2D<T>,
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
        position: Point2<T>,
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
            |b| b.distance_squared_to_point(&position),
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

impl<V, T: Scalar> fmt::Debug for QuadTree<V, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("len", &self.entries.len())
            .field("nodes", &self.hierarchy.nodes.len())
            .field("boundary", &self.hierarchy.root().bounds())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn five_points() -> QuadTree<Point2<f64>> {
        let pts = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (5.0, 5.0), (10.0, 10.0)]
            .map(|(x, y)| Point2::new(x, y));
        QuadTree::with_config(pts, |p| *p, TreeConfig::default().with_bucket_size(2)).unwrap()
    }

    fn random_points(seed: u64, n: usize) -> Vec<Point2<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Point2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)))
            .collect()
    }

    #[test]
    fn quadrant_ties_go_north_and_east() {
        let c = Point2::new(1.0, 1.0);
        assert_eq!(quadrant(&Point2::new(0.0, 0.0), &c), 0);
        assert_eq!(quadrant(&Point2::new(1.0, 0.0), &c), 1);
        assert_eq!(quadrant(&Point2::new(0.0, 1.0), &c), 2);
        assert_eq!(quadrant(&Point2::new(1.0, 1.0), &c), 3);
    }

    #[test]
    fn five_point_scenario() {
        let tree = five_points();
        let mut buf = Vec::new();
        let got = tree.elements_in_range(Point2::new(0.0, 0.0), 1.5, &mut buf);
        got.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        assert_eq!(
            *got,
            [Point2::new(0.0, 0.0), Point2::new(0.0, 1.0), Point2::new(1.0, 0.0)]
        );

        let got = tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 2, &mut buf);
        assert_eq!(*got, [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
    }

    #[test]
    fn queries_return_the_callers_buffer() {
        let tree = five_points();
        let mut buf = vec![Point2::new(99.0, 99.0)];
        let got: *const Vec<Point2<f64>> =
            tree.elements_in_range(Point2::new(0.0, 0.0), -1.0, &mut buf);
        assert!(core::ptr::eq(got, &buf));
        assert!(buf.is_empty(), "negative range clears the buffer");
        buf.push(Point2::new(99.0, 99.0));
        let got: *const Vec<Point2<f64>> =
            tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 0, &mut buf);
        assert!(core::ptr::eq(got, &buf));
        assert!(buf.is_empty(), "zero count clears the buffer");
    }

    #[test]
    fn zero_range_matches_exact_positions() {
        let tree = five_points();
        let mut buf = Vec::new();
        tree.elements_in_range(Point2::new(5.0, 5.0), 0.0, &mut buf);
        assert_eq!(buf, [Point2::new(5.0, 5.0)]);
        tree.elements_in_range(Point2::new(5.0, 5.000001), 0.0, &mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn minimum_range_excludes_the_inner_disc() {
        let tree = five_points();
        let mut buf = Vec::new();
        tree.elements_in_range_excluding(Point2::new(0.0, 0.0), 8.0, 0.5, &mut buf);
        buf.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        assert_eq!(
            buf,
            [Point2::new(0.0, 1.0), Point2::new(1.0, 0.0), Point2::new(5.0, 5.0)]
        );
    }

    #[test]
    fn coincident_points_collapse_into_a_leaf() {
        let tree = QuadTree::with_config(
            0..100_u32,
            |_| Point2::new(3.0_f32, -2.0),
            TreeConfig::default().with_bucket_size(4),
        )
        .unwrap();
        assert_eq!(tree.node_count(), 1);
        let mut buf = Vec::new();
        tree.elements_in_range(Point2::new(3.0, -2.0), 0.0, &mut buf);
        assert_eq!(buf.len(), 100);
        tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 7, &mut buf);
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_tree_answers_nothing() {
        let tree = QuadTree::<u8>::new([], |_| Point2::new(0.0, 0.0)).unwrap();
        assert!(tree.is_empty());
        assert!(tree.boundary().is_valid());
        let mut buf = vec![1_u8];
        assert!(tree.elements_in_range(Point2::new(0.0, 0.0), 10.0, &mut buf).is_empty());
        let all = Aabb2D::new(-1.0, -1.0, 1.0, 1.0);
        assert!(tree.elements_in_bounds(&all, &mut buf).is_empty());
        assert!(tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 3, &mut buf).is_empty());
    }

    #[test]
    fn boundary_override_only_grows() {
        let frame = Aabb2D::new(-100.0, -100.0, 100.0, 100.0);
        let tree = QuadTree::with_config(
            [Point2::new(0.0, 0.0), Point2::new(500.0, 0.0)],
            |p| *p,
            TreeConfig::default().with_boundary(frame),
        )
        .unwrap();
        assert_eq!(tree.boundary(), Aabb2D::new(-100.0, -100.0, 500.0, 100.0));

        let empty = QuadTree::<()>::with_config(
            [],
            |_| Point2::new(0.0, 0.0),
            TreeConfig::default().with_boundary(frame),
        )
        .unwrap();
        assert_eq!(empty.boundary(), frame);
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let err = QuadTree::new([0.0, 1.0, f64::NAN], |&x| Point2::new(x, 0.0)).unwrap_err();
        assert_eq!(err, BuildError::InvalidGeometry { index: 2 });
    }

    #[test]
    fn structure_invariants_hold() {
        let pts = random_points(1, 2_000);
        let tree =
            QuadTree::with_config(pts.clone(), |p| *p, TreeConfig::default().with_bucket_size(8))
                .unwrap();
        tree.hierarchy
            .assert_invariants(pts.len(), |b, i| b.contains_point(&pts[i as usize]));
        assert!(tree.depth() > 2);
    }

    #[test]
    fn range_and_bounds_match_brute_force() {
        let pts = random_points(2, 1_500);
        let tree = QuadTree::new(0..pts.len(), |&i| pts[i]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut scratch = Scratch::new();
        let mut buf = Vec::new();
        for _ in 0..200 {
            let c = Point2::new(rng.random_range(-60.0..60.0), rng.random_range(-60.0..60.0));
            let r: f64 = rng.random_range(0.0..20.0);
            let m: f64 = rng.random_range(-2.0..8.0);
            tree.elements_in_range_with(&mut scratch, c, r, m, &mut buf);
            buf.sort_unstable();
            let expected: Vec<usize> = (0..pts.len())
                .filter(|&i| {
                    let d2 = pts[i].distance_squared(&c);
                    d2 <= r * r && (m <= 0.0 || d2 > m * m)
                })
                .collect();
            assert_eq!(buf, expected);

            let q = Aabb2D::new(c.x - r, c.y - m.abs(), c.x + r * 0.5, c.y + m.abs());
            tree.elements_in_bounds_with(&mut scratch, &q, &mut buf);
            buf.sort_unstable();
            let expected: Vec<usize> =
                (0..pts.len()).filter(|&i| q.contains_point(&pts[i])).collect();
            assert_eq!(buf, expected);
        }
    }

    #[test]
    fn nearest_neighbors_are_sorted_and_mostly_exact() {
        let pts = random_points(4, 1_000);
        let tree = QuadTree::new(0..pts.len(), |&i| pts[i]).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let mut buf = Vec::new();
        let (mut hits, mut total) = (0, 0);
        for _ in 0..100 {
            let c = Point2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
            let k = 5;
            tree.approximate_nearest_neighbors(c, k, &mut buf);
            assert_eq!(buf.len(), k);
            let d: Vec<f64> = buf.iter().map(|&i| pts[i].distance_squared(&c)).collect();
            assert!(d.windows(2).all(|w| w[0] <= w[1]), "ascending distance");

            let mut exact: Vec<usize> = (0..pts.len()).collect();
            exact.sort_by(|&a, &b| {
                pts[a]
                    .distance_squared(&c)
                    .total_cmp(&pts[b].distance_squared(&c))
            });
            hits += buf.iter().filter(|i| exact[..k].contains(i)).count();
            total += k;
        }
        assert!(hits * 100 >= total * 60, "recall {hits}/{total}");
    }

    #[test]
    fn larger_count_keeps_members_that_stay_nearest() {
        let pts = random_points(6, 1_200);
        let config = TreeConfig::default().with_bucket_size(6);
        let tree = QuadTree::with_config(0..pts.len(), |&i| pts[i], config).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let (mut small, mut large) = (Vec::new(), Vec::new());
        for _ in 0..50 {
            let c = Point2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0));
            tree.approximate_nearest_neighbors(c, 3, &mut small);
            tree.approximate_nearest_neighbors(c, 12, &mut large);
            let mut exact: Vec<usize> = (0..pts.len()).collect();
            exact.sort_by(|&a, &b| {
                pts[a]
                    .distance_squared(&c)
                    .total_cmp(&pts[b].distance_squared(&c))
            });
            for i in small.iter().filter(|i| exact[..12].contains(i)) {
                assert!(large.contains(i), "{i} dropped at {c:?}");
            }
        }
    }

    #[test]
    fn repeated_values_are_reported_once() {
        let sites = [
            ("a", 0.0, 0.0),
            ("a", 0.0, 0.0),
            ("b", 1.0, 0.0),
            ("c", 2.0, 0.0),
            ("d", 5.0, 0.0),
        ];
        let tree = QuadTree::new(sites, |s| Point2::new(s.1, s.2)).unwrap();
        let mut buf = Vec::new();
        tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 2, &mut buf);
        let names: Vec<&str> = buf.iter().map(|s| s.0).collect();
        assert_eq!(names, ["a", "b"]);
        tree.approximate_nearest_neighbors(Point2::new(0.0, 0.0), 9, &mut buf);
        let names: Vec<&str> = buf.iter().map(|s| s.0).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn count_beyond_len_returns_everything_in_order() {
        let tree = five_points();
        let mut buf = Vec::new();
        tree.approximate_nearest_neighbors(Point2::new(10.0, 10.0), 50, &mut buf);
        assert_eq!(buf.len(), 5);
        assert_eq!(buf[0], Point2::new(10.0, 10.0));
        assert_eq!(buf[4], Point2::new(0.0, 0.0));
    }
}
