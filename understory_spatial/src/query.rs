// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The query contract shared by every tree.

use alloc::vec::Vec;

use crate::bounds::Bounds;
use crate::scratch::Scratch;
use crate::types::Scalar;

/// Read-only spatial queries over a built tree.
///
/// Every query clears the caller's buffer, fills it, and returns the same buffer so it
/// can be reused across calls. Queries never fail: a negative or NaN range, or a count of
/// zero, yields an empty buffer.
///
/// The `*_with` forms take caller-owned [`Scratch`] space (see
/// [`ScratchPool`](crate::ScratchPool)); the plain forms allocate a fresh one per call.
pub trait SpatialQuery<V> {
    /// Coordinate type.
    type Scalar: Scalar;
    /// Query position type.
    type Point: Copy;
    /// Box type of the tree.
    type Bounds: Bounds<Scalar = Self::Scalar, Point = Self::Point>;

    /// Box enclosing every element (padded), or the configured boundary of an empty tree.
    fn boundary(&self) -> Self::Bounds;

    /// Number of stored elements.
    fn len(&self) -> usize;

    /// True if the tree stores no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values whose geometry lies within `range` of `position` but farther than
    /// `minimum_range` from it.
    ///
    /// A `range` of zero matches exact positions only. A `minimum_range` of zero or less
    /// excludes nothing.
    fn elements_in_range_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: Self::Point,
        range: Self::Scalar,
        minimum_range: Self::Scalar,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V>;

    /// Values whose geometry intersects `bounds` (point trees: lies inside it).
    fn elements_in_bounds_with<'o>(
        &self,
        scratch: &mut Scratch,
        bounds: &Self::Bounds,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V>;

    /// Up to `count` distinct values ordered by ascending distance from `position`.
    ///
    /// Values that compare equal are reported once, at the distance of their nearest copy.
    /// The quadrant and axis-split trees answer approximately; see their type docs.
    fn approximate_nearest_neighbors_with<'o>(
        &self,
        scratch: &mut Scratch,
        position: Self::Point,
        count: usize,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V>;

    /// Values within `range` of `position`.
    fn elements_in_range<'o>(
        &self,
        position: Self::Point,
        range: Self::Scalar,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        let zero = <Self::Scalar as Scalar>::zero();
        self.elements_in_range_with(&mut Scratch::new(), position, range, zero, out)
    }

    /// Values within `range` of `position` but not within `minimum_range`.
    fn elements_in_range_excluding<'o>(
        &self,
        position: Self::Point,
        range: Self::Scalar,
        minimum_range: Self::Scalar,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        self.elements_in_range_with(&mut Scratch::new(), position, range, minimum_range, out)
    }

    /// Values intersecting `bounds`.
    fn elements_in_bounds<'o>(&self, bounds: &Self::Bounds, out: &'o mut Vec<V>) -> &'o mut Vec<V> {
        self.elements_in_bounds_with(&mut Scratch::new(), bounds, out)
    }

    /// Up to `count` values nearest to `position`, nearest first.
    fn approximate_nearest_neighbors<'o>(
        &self,
        position: Self::Point,
        count: usize,
        out: &'o mut Vec<V>,
    ) -> &'o mut Vec<V> {
        self.approximate_nearest_neighbors_with(&mut Scratch::new(), position, count, out)
    }
}

/// Squared outer radius and, if positive, squared inner radius of a range query.
///
/// `None` when the range is negative or NaN.
pub(crate) fn range_radii<T: Scalar>(range: T, minimum_range: T) -> Option<(f64, Option<f64>)> {
    let r = T::widen(range);
    if r.is_nan() || r < 0.0 {
        return None;
    }
    let m = T::widen(minimum_range);
    let inner = (m > 0.0).then_some(m * m);
    Some((r * r, inner))
}
