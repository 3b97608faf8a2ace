// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dimension-generic view over [`Aabb2D`] and [`Aabb3D`].
//!
//! Traversal, bulk loading, and the sphere predicates are written once against [`Bounds`]
//! and shared by every tree.

use core::fmt::Debug;

use crate::types::{Aabb2D, Aabb3D, Point2, Point3, Scalar};

/// Relative squared-distance slack used when a sphere merely touches a box.
///
/// Keeps exact edge and corner contacts from being rejected by rounding. Scaled by the
/// squared radius, so zero-radius queries only match exact positions.
pub const TOUCH_TOLERANCE: f64 = 1e-6;

/// Boxes whose extent is below this on every axis are treated as points.
pub const POINT_LIKE_EXTENT: f64 = 1e-12;

/// Axis-aligned box abstraction shared by the 2D and 3D trees.
pub trait Bounds: Copy + Debug + PartialEq {
    /// Coordinate type.
    type Scalar: Scalar;
    /// Point type of the same dimension.
    type Point: Copy + Debug;

    /// Number of axes.
    const DIM: usize;

    /// Quantization width per axis when computing Morton keys.
    const MORTON_BITS: u32;

    /// A zero-size box at the origin.
    fn origin() -> Self;

    /// A zero-size box at the point.
    fn from_point(p: Self::Point) -> Self;

    /// The box enclosing the ball of `radius` around `center`.
    fn around(center: Self::Point, radius: Self::Scalar) -> Self;

    /// The smallest box enclosing both.
    fn union(&self, other: &Self) -> Self;

    /// Whether the two boxes share at least one point.
    fn intersects(&self, other: &Self) -> bool;

    /// Whether `other` lies entirely inside this box.
    fn contains(&self, other: &Self) -> bool;

    /// Center point.
    fn center(&self) -> Self::Point;

    /// True if every coordinate is finite and the box is not inverted.
    fn is_valid(&self) -> bool;

    /// Grow degenerate axes to the scalar's minimum node extent.
    fn padded(&self) -> Self;

    /// Minimum coordinate along `axis`.
    fn lo(&self, axis: usize) -> Self::Scalar;

    /// Maximum coordinate along `axis`.
    fn hi(&self, axis: usize) -> Self::Scalar;

    /// Coordinate of `p` along `axis`.
    fn coord(p: &Self::Point, axis: usize) -> Self::Scalar;

    /// Squared distance from `p` to the closest point of the box (zero inside).
    fn distance_squared_to_point(&self, p: &Self::Point) -> f64;

    /// Squared distance from `p` to the farthest corner of the box.
    fn farthest_distance_squared_to_point(&self, p: &Self::Point) -> f64;

    /// Largest extent over all axes.
    fn max_extent(&self) -> f64;

    /// True if the box is small enough to be treated as a point.
    fn is_point_like(&self) -> bool {
        self.max_extent() <= POINT_LIKE_EXTENT
    }
}

/// Whether the ball (`center`, `radius_sq`) touches the box.
///
/// Compares the closest point of the box against the radius, allowing
/// [`TOUCH_TOLERANCE`] of `radius_sq`.
pub fn ball_intersects<B: Bounds>(b: &B, center: &B::Point, radius_sq: f64) -> bool {
    b.distance_squared_to_point(center) <= radius_sq * (1.0 + TOUCH_TOLERANCE)
}

/// Whether the box lies entirely inside the ball (`center`, `radius_sq`).
///
/// Point-like boxes only need their near corner inside; everything else is decided by the
/// farthest corner, picked per axis.
pub fn ball_contains<B: Bounds>(b: &B, center: &B::Point, radius_sq: f64) -> bool {
    if b.is_point_like() && b.distance_squared_to_point(center) <= radius_sq {
        return true;
    }
    b.farthest_distance_squared_to_point(center) <= radius_sq
}

impl<T: Scalar> Bounds for Aabb2D<T> {
    type Scalar = T;
    type Point = Point2<T>;

    const DIM: usize = 2;
    const MORTON_BITS: u32 = 16;

    fn origin() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero())
    }

    fn from_point(p: Point2<T>) -> Self {
        Self::from_point(p)
    }

    fn around(center: Point2<T>, radius: T) -> Self {
        Self::around(center, radius)
    }

    fn union(&self, other: &Self) -> Self {
        Self::union(self, other)
    }

    fn intersects(&self, other: &Self) -> bool {
        Self::intersects(self, other)
    }

    fn contains(&self, other: &Self) -> bool {
        Self::contains(self, other)
    }

    fn center(&self) -> Point2<T> {
        Self::center(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }

    fn padded(&self) -> Self {
        Self::padded(self)
    }

    fn lo(&self, axis: usize) -> T {
        if axis == 0 { self.min_x } else { self.min_y }
    }

    fn hi(&self, axis: usize) -> T {
        if axis == 0 { self.max_x } else { self.max_y }
    }

    fn coord(p: &Point2<T>, axis: usize) -> T {
        if axis == 0 { p.x } else { p.y }
    }

    fn distance_squared_to_point(&self, p: &Point2<T>) -> f64 {
        Self::distance_squared_to_point(self, p)
    }

    fn farthest_distance_squared_to_point(&self, p: &Point2<T>) -> f64 {
        Self::farthest_distance_squared_to_point(self, p)
    }

    fn max_extent(&self) -> f64 {
        Self::max_extent(self)
    }
}

impl<T: Scalar> Bounds for Aabb3D<T> {
    type Scalar = T;
    type Point = Point3<T>;

    const DIM: usize = 3;
    const MORTON_BITS: u32 = 10;

    fn origin() -> Self {
        Self::new(T::zero(), T::zero(), T::zero(), T::zero(), T::zero(), T::zero())
    }

    fn from_point(p: Point3<T>) -> Self {
        Self::from_point(p)
    }

    fn around(center: Point3<T>, radius: T) -> Self {
        Self::around(center, radius)
    }

    fn union(&self, other: &Self) -> Self {
        Self::union(self, other)
    }

    fn intersects(&self, other: &Self) -> bool {
        Self::intersects(self, other)
    }

    fn contains(&self, other: &Self) -> bool {
        Self::contains(self, other)
    }

    fn center(&self) -> Point3<T> {
        Self::center(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }

    fn padded(&self) -> Self {
        Self::padded(self)
    }

    fn lo(&self, axis: usize) -> T {
        self.axis_min(axis)
    }

    fn hi(&self, axis: usize) -> T {
        self.axis_max(axis)
    }

    fn coord(p: &Point3<T>, axis: usize) -> T {
        p.axis(axis)
    }

    fn distance_squared_to_point(&self, p: &Point3<T>) -> f64 {
        Self::distance_squared_to_point(self, p)
    }

    fn farthest_distance_squared_to_point(&self, p: &Point3<T>) -> f64 {
        Self::farthest_distance_squared_to_point(self, p)
    }

    fn max_extent(&self) -> f64 {
        Self::max_extent(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_corner_touch_is_an_intersection() {
        // 0.3 and 0.4 are not exactly representable; the corner sits at distance 0.5 up to rounding.
        let b = Aabb2D::new(0.3, 0.4, 1.0, 1.0);
        let c = Point2::new(0.0, 0.0);
        assert!(ball_intersects(&b, &c, 0.25));
        assert!(!ball_intersects(&b, &c, 0.24));
    }

    #[test]
    fn touch_slack_scales_with_the_radius() {
        let near = Aabb2D::from_point(Point2::new(0.0014, 0.0));
        let c = Point2::new(0.0, 0.0);
        assert!(!ball_intersects(&near, &c, 1e-6));
        assert!(ball_intersects(&near, &c, 0.0014 * 0.0014));
        let far = Aabb2D::from_point(Point2::new(1000.0, 0.0));
        assert!(!ball_intersects(&far, &c, 999.0 * 999.0));
    }

    #[test]
    fn zero_radius_only_matches_exact_positions() {
        let p = Aabb2D::from_point(Point2::new(1.0, 1.0));
        assert!(ball_intersects(&p, &Point2::new(1.0, 1.0), 0.0));
        assert!(!ball_intersects(&p, &Point2::new(1.0, 1.0 + 1e-9), 0.0));
    }

    #[test]
    fn containment_uses_the_farthest_corner() {
        let b = Aabb3D::new(-1.0, -1.0, -1.0, 1.0, 1.0, 1.0);
        let c = Point3::new(0.0, 0.0, 0.0);
        assert!(ball_contains(&b, &c, 3.0));
        assert!(!ball_contains(&b, &c, 2.99));
        // Off-center: the +x face is farther.
        let c = Point3::new(-0.5, 0.0, 0.0);
        assert!(!ball_contains(&b, &c, 3.0));
        assert!(ball_contains(&b, &c, 1.5 * 1.5 + 2.0));
    }

    #[test]
    fn point_like_box_takes_the_fast_path() {
        let p = Aabb3D::from_point(Point3::new(2.0, 0.0, 0.0));
        assert!(p.is_point_like());
        assert!(ball_contains(&p, &Point3::new(0.0, 0.0, 0.0), 4.0));
        assert!(!ball_contains(&p, &Point3::new(0.0, 0.0, 0.0), 3.99));
    }

    #[test]
    fn axis_accessors_agree_with_fields() {
        let b = Aabb2D::new(1.0_f32, 2.0, 3.0, 4.0);
        assert_eq!((Bounds::lo(&b, 0), Bounds::lo(&b, 1)), (1.0, 2.0));
        assert_eq!((Bounds::hi(&b, 0), Bounds::hi(&b, 1)), (3.0, 4.0));
        assert_eq!(<Aabb2D<f32> as Bounds>::DIM, 2);
        assert_eq!(<Aabb3D<f32> as Bounds>::MORTON_BITS, 10);
    }
}
