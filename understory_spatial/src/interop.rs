// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions to and from [`kurbo`] 2D geometry.

use kurbo::{Point, Rect};

use crate::sphere::Circle;
use crate::types::{Aabb2D, Point2};

impl From<Point> for Point2<f64> {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point2<f64>> for Point {
    fn from(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for Aabb2D<f64> {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }
}

/// Rectangles are normalized, so a flipped `Rect` still yields a valid box.
impl From<Rect> for Aabb2D<f64> {
    fn from(r: Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.x1, r.y1)
    }
}

impl From<Aabb2D<f64>> for Rect {
    fn from(b: Aabb2D<f64>) -> Self {
        Self::new(b.min_x, b.min_y, b.max_x, b.max_y)
    }
}

impl From<kurbo::Circle> for Circle<f64> {
    fn from(c: kurbo::Circle) -> Self {
        Self::new(c.center.into(), c.radius)
    }
}
