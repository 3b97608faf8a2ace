// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Circles and spheres with box predicates.

use crate::bounds::{ball_contains, ball_intersects};
use crate::types::{Aabb2D, Aabb3D, Point2, Point3, Scalar};

/// A circle in 2D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Circle<T> {
    /// Center point.
    pub center: Point2<T>,
    /// Radius; negative radii contain nothing.
    pub radius: T,
}

impl<T: Scalar> Circle<T> {
    /// Create a new circle.
    pub const fn new(center: Point2<T>, radius: T) -> Self {
        Self { center, radius }
    }

    /// Squared radius in the `f64` accumulator.
    pub fn radius_squared(&self) -> f64 {
        let r = T::widen(self.radius);
        r * r
    }

    /// Whether the circle touches the box (closest-point test with touch tolerance).
    pub fn intersects(&self, b: &Aabb2D<T>) -> bool {
        self.radius >= T::zero() && ball_intersects(b, &self.center, self.radius_squared())
    }

    /// Whether the box lies entirely inside the circle.
    pub fn overlaps(&self, b: &Aabb2D<T>) -> bool {
        self.radius >= T::zero() && ball_contains(b, &self.center, self.radius_squared())
    }

    /// Whether the point lies inside or on the circle.
    pub fn contains_point(&self, p: &Point2<T>) -> bool {
        self.radius >= T::zero() && self.center.distance_squared(p) <= self.radius_squared()
    }

    /// The square box enclosing the circle.
    pub fn bounds(&self) -> Aabb2D<T> {
        Aabb2D::around(self.center, self.radius)
    }
}

/// A sphere in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere<T> {
    /// Center point.
    pub center: Point3<T>,
    /// Radius; negative radii contain nothing.
    pub radius: T,
}

impl<T: Scalar> Sphere<T> {
    /// Create a new sphere.
    pub const fn new(center: Point3<T>, radius: T) -> Self {
        Self { center, radius }
    }

    /// Squared radius in the `f64` accumulator.
    pub fn radius_squared(&self) -> f64 {
        let r = T::widen(self.radius);
        r * r
    }

    /// Whether the sphere touches the box (closest-point test with touch tolerance).
    pub fn intersects(&self, b: &Aabb3D<T>) -> bool {
        self.radius >= T::zero() && ball_intersects(b, &self.center, self.radius_squared())
    }

    /// Whether the box lies entirely inside the sphere.
    pub fn overlaps(&self, b: &Aabb3D<T>) -> bool {
        self.radius >= T::zero() && ball_contains(b, &self.center, self.radius_squared())
    }

    /// Whether the point lies inside or on the sphere.
    pub fn contains_point(&self, p: &Point3<T>) -> bool {
        self.radius >= T::zero() && self.center.distance_squared(p) <= self.radius_squared()
    }

    /// The cube enclosing the sphere.
    pub fn bounds(&self) -> Aabb3D<T> {
        Aabb3D::around(self.center, self.radius)
    }
}
