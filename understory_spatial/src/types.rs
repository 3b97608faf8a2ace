// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::ops::{Add, Mul, Sub};

/// Numeric scalar abstraction for tree coordinates.
///
/// Coordinates stay in `Self`, while squared distances are accumulated in `f64`
/// (`f32` is widened) so that radius comparisons do not lose precision.
pub trait Scalar:
    Copy + PartialOrd + Debug + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    /// Zero value for the scalar type.
    fn zero() -> Self;

    /// Smallest extent a tree node may have along any axis.
    ///
    /// Degenerate node boxes (coincident points, flat sets) are padded up to this size.
    fn min_extent() -> Self;

    /// Midpoint between a and b.
    fn mid(a: Self, b: Self) -> Self;

    /// Convert a scalar to the `f64` accumulator.
    fn widen(v: Self) -> f64;

    /// True if the value is neither NaN nor infinite.
    fn is_finite(v: Self) -> bool;
}

impl Scalar for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn min_extent() -> Self {
        1e-4
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        f64::from(v)
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }
}

impl Scalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn min_extent() -> Self {
        1e-9
    }

    #[inline]
    fn mid(a: Self, b: Self) -> Self {
        0.5 * (a + b)
    }

    #[inline]
    fn widen(v: Self) -> f64 {
        v
    }

    #[inline]
    fn is_finite(v: Self) -> bool {
        v.is_finite()
    }
}

/// A point in 2D.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
}

impl<T> Point2<T> {
    /// Create a new point.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Scalar> Point2<T> {
    /// Squared euclidean distance to another point, accumulated in `f64`.
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = T::widen(self.x) - T::widen(other.x);
        let dy = T::widen(self.y) - T::widen(other.y);
        dx * dx + dy * dy
    }

    /// True if both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        T::is_finite(self.x) && T::is_finite(self.y)
    }
}

/// A point in 3D.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3<T> {
    /// X coordinate.
    pub x: T,
    /// Y coordinate.
    pub y: T,
    /// Z coordinate.
    pub z: T,
}

impl<T> Point3<T> {
    /// Create a new point.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Scalar> Point3<T> {
    /// Squared euclidean distance to another point, accumulated in `f64`.
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = T::widen(self.x) - T::widen(other.x);
        let dy = T::widen(self.y) - T::widen(other.y);
        let dz = T::widen(self.z) - T::widen(other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// True if all coordinates are finite.
    pub fn is_finite(&self) -> bool {
        T::is_finite(self.x) && T::is_finite(self.y) && T::is_finite(self.z)
    }

    /// Coordinate along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub fn axis(&self, axis: usize) -> T {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Axis-aligned bounding box in 2D.
///
/// Intervals are closed: a box with `min == max` on an axis still contains that coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb2D<T> {
    /// Minimum x (left)
    pub min_x: T,
    /// Minimum y (top)
    pub min_y: T,
    /// Maximum x (right)
    pub max_x: T,
    /// Maximum y (bottom)
    pub max_y: T,
}

impl<T> Aabb2D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl<T: Scalar> Aabb2D<T> {
    /// A zero-size box at the point.
    pub fn from_point(p: Point2<T>) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// The square box enclosing the circle of `radius` around `center`.
    pub fn around(center: Point2<T>, radius: T) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        )
    }

    /// Whether this AABB contains the point.
    pub fn contains_point(&self, p: &Point2<T>) -> bool {
        le(self.min_x, p.x) && le(self.min_y, p.y) && le(p.x, self.max_x) && le(p.y, self.max_y)
    }

    /// Whether the two boxes share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        le(self.min_x, other.max_x)
            && le(other.min_x, self.max_x)
            && le(self.min_y, other.max_y)
            && le(other.min_y, self.max_y)
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        le(self.min_x, other.min_x)
            && le(other.max_x, self.max_x)
            && le(self.min_y, other.min_y)
            && le(other.max_y, self.max_y)
    }

    /// The smallest box enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        union_aabb(*self, *other)
    }

    /// Center point.
    pub fn center(&self) -> Point2<T> {
        Point2::new(T::mid(self.min_x, self.max_x), T::mid(self.min_y, self.max_y))
    }

    /// True if every coordinate is finite and the box is not inverted.
    pub fn is_valid(&self) -> bool {
        T::is_finite(self.min_x)
            && T::is_finite(self.min_y)
            && T::is_finite(self.max_x)
            && T::is_finite(self.max_y)
            && le(self.min_x, self.max_x)
            && le(self.min_y, self.max_y)
    }

    /// Grow degenerate axes to [`Scalar::min_extent`] around their center.
    pub fn padded(&self) -> Self {
        let (min_x, max_x) = pad_axis(self.min_x, self.max_x);
        let (min_y, max_y) = pad_axis(self.min_y, self.max_y);
        Self::new(min_x, min_y, max_x, max_y)
    }

    /// Squared distance from `p` to the closest point of the box (zero inside).
    pub fn distance_squared_to_point(&self, p: &Point2<T>) -> f64 {
        let dx = axis_gap(p.x, self.min_x, self.max_x);
        let dy = axis_gap(p.y, self.min_y, self.max_y);
        dx * dx + dy * dy
    }

    /// Squared distance from `p` to the farthest corner of the box.
    pub fn farthest_distance_squared_to_point(&self, p: &Point2<T>) -> f64 {
        let dx = axis_reach(p.x, self.min_x, self.max_x);
        let dy = axis_reach(p.y, self.min_y, self.max_y);
        dx * dx + dy * dy
    }

    /// Largest extent over both axes.
    pub fn max_extent(&self) -> f64 {
        let w = T::widen(self.max_x) - T::widen(self.min_x);
        let h = T::widen(self.max_y) - T::widen(self.min_y);
        w.max(h)
    }
}

impl Aabb2D<f32> {
    /// Create an AABB from origin and size in f32.
    pub const fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + w,
            max_y: y + h,
        }
    }
}

impl Aabb2D<f64> {
    /// Create an AABB from origin and size in f64.
    pub const fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + w,
            max_y: y + h,
        }
    }
}

impl<T: Scalar> From<Point2<T>> for Aabb2D<T> {
    fn from(p: Point2<T>) -> Self {
        Self::from_point(p)
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb3D<T> {
    /// Minimum x
    pub min_x: T,
    /// Minimum y
    pub min_y: T,
    /// Minimum z
    pub min_z: T,
    /// Maximum x
    pub max_x: T,
    /// Maximum y
    pub max_y: T,
    /// Maximum z
    pub max_z: T,
}

impl<T> Aabb3D<T> {
    /// Create a new AABB from min/max corners.
    pub const fn new(min_x: T, min_y: T, min_z: T, max_x: T, max_y: T, max_z: T) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }
}

impl<T: Scalar> Aabb3D<T> {
    /// A zero-size box at the point.
    pub fn from_point(p: Point3<T>) -> Self {
        Self::new(p.x, p.y, p.z, p.x, p.y, p.z)
    }

    /// The cube enclosing the sphere of `radius` around `center`.
    pub fn around(center: Point3<T>, radius: T) -> Self {
        Self::new(
            center.x - radius,
            center.y - radius,
            center.z - radius,
            center.x + radius,
            center.y + radius,
            center.z + radius,
        )
    }

    /// Minimum coordinate along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub fn axis_min(&self, axis: usize) -> T {
        match axis {
            0 => self.min_x,
            1 => self.min_y,
            _ => self.min_z,
        }
    }

    /// Maximum coordinate along `axis` (0 = x, 1 = y, anything else = z).
    #[inline]
    pub fn axis_max(&self, axis: usize) -> T {
        match axis {
            0 => self.max_x,
            1 => self.max_y,
            _ => self.max_z,
        }
    }

    /// Whether this AABB contains the point.
    pub fn contains_point(&self, p: &Point3<T>) -> bool {
        le(self.min_x, p.x)
            && le(self.min_y, p.y)
            && le(self.min_z, p.z)
            && le(p.x, self.max_x)
            && le(p.y, self.max_y)
            && le(p.z, self.max_z)
    }

    /// Whether the two boxes share at least one point.
    pub fn intersects(&self, other: &Self) -> bool {
        le(self.min_x, other.max_x)
            && le(other.min_x, self.max_x)
            && le(self.min_y, other.max_y)
            && le(other.min_y, self.max_y)
            && le(self.min_z, other.max_z)
            && le(other.min_z, self.max_z)
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &Self) -> bool {
        le(self.min_x, other.min_x)
            && le(other.max_x, self.max_x)
            && le(self.min_y, other.min_y)
            && le(other.max_y, self.max_y)
            && le(self.min_z, other.min_z)
            && le(other.max_z, self.max_z)
    }

    /// The smallest box enclosing both.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            min_t(self.min_x, other.min_x),
            min_t(self.min_y, other.min_y),
            min_t(self.min_z, other.min_z),
            max_t(self.max_x, other.max_x),
            max_t(self.max_y, other.max_y),
            max_t(self.max_z, other.max_z),
        )
    }

    /// Center point.
    pub fn center(&self) -> Point3<T> {
        Point3::new(
            T::mid(self.min_x, self.max_x),
            T::mid(self.min_y, self.max_y),
            T::mid(self.min_z, self.max_z),
        )
    }

    /// True if every coordinate is finite and the box is not inverted.
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| {
            let lo = self.axis_min(axis);
            let hi = self.axis_max(axis);
            T::is_finite(lo) && T::is_finite(hi) && le(lo, hi)
        })
    }

    /// Grow degenerate axes to [`Scalar::min_extent`] around their center.
    pub fn padded(&self) -> Self {
        let (min_x, max_x) = pad_axis(self.min_x, self.max_x);
        let (min_y, max_y) = pad_axis(self.min_y, self.max_y);
        let (min_z, max_z) = pad_axis(self.min_z, self.max_z);
        Self::new(min_x, min_y, min_z, max_x, max_y, max_z)
    }

    /// Squared distance from `p` to the closest point of the box (zero inside).
    pub fn distance_squared_to_point(&self, p: &Point3<T>) -> f64 {
        let dx = axis_gap(p.x, self.min_x, self.max_x);
        let dy = axis_gap(p.y, self.min_y, self.max_y);
        let dz = axis_gap(p.z, self.min_z, self.max_z);
        dx * dx + dy * dy + dz * dz
    }

    /// Squared distance from `p` to the farthest corner of the box.
    pub fn farthest_distance_squared_to_point(&self, p: &Point3<T>) -> f64 {
        let dx = axis_reach(p.x, self.min_x, self.max_x);
        let dy = axis_reach(p.y, self.min_y, self.max_y);
        let dz = axis_reach(p.z, self.min_z, self.max_z);
        dx * dx + dy * dy + dz * dz
    }

    /// Largest extent over all three axes.
    pub fn max_extent(&self) -> f64 {
        (0..3)
            .map(|axis| T::widen(self.axis_max(axis)) - T::widen(self.axis_min(axis)))
            .fold(0.0, f64::max)
    }
}

impl<T: Scalar> From<Point3<T>> for Aabb3D<T> {
    fn from(p: Point3<T>) -> Self {
        Self::from_point(p)
    }
}

/// Distance from `v` to the closed interval `[lo, hi]`, zero inside.
#[inline]
fn axis_gap<T: Scalar>(v: T, lo: T, hi: T) -> f64 {
    let (v, lo, hi) = (T::widen(v), T::widen(lo), T::widen(hi));
    if v < lo {
        lo - v
    } else if v > hi {
        v - hi
    } else {
        0.0
    }
}

/// Distance from `v` to whichever end of `[lo, hi]` is farther.
#[inline]
fn axis_reach<T: Scalar>(v: T, lo: T, hi: T) -> f64 {
    let (v, lo, hi) = (T::widen(v), T::widen(lo), T::widen(hi));
    // For lo <= hi the larger of the two signed gaps is always the farther face.
    (v - lo).max(hi - v)
}

fn pad_axis<T: Scalar>(lo: T, hi: T) -> (T, T) {
    let extent = hi - lo;
    if le(T::min_extent(), extent) {
        return (lo, hi);
    }
    let c = T::mid(lo, hi);
    let half = T::mid(T::zero(), T::min_extent());
    (min_t(lo, c - half), max_t(hi, c + half))
}

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

pub(crate) fn le<T: PartialOrd>(a: T, b: T) -> bool {
    a.partial_cmp(&b)
        .map(|o| o != Ordering::Greater)
        .unwrap_or(false)
}

pub(crate) fn union_aabb<T: PartialOrd + Copy>(a: Aabb2D<T>, b: Aabb2D<T>) -> Aabb2D<T> {
    Aabb2D {
        min_x: min_t(a.min_x, b.min_x),
        min_y: min_t(a.min_y, b.min_y),
        max_x: max_t(a.max_x, b.max_x),
        max_y: max_t(a.max_y, b.max_y),
    }
}
