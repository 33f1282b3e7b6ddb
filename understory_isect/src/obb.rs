// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Oriented bounding boxes in screen space.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect, Vec2};

/// An oriented bounding box: a rectangle with arbitrary rotation.
///
/// The box is described by its center, a unit direction for its local x axis,
/// and the half extents along its local x and y axes. The local y axis is the
/// x axis turned by 90 degrees.
///
/// All queries treat the boundary as part of the box, so two boxes that share
/// an edge or a corner intersect.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obb {
    center: Point,
    axis: Vec2,
    half: Vec2,
}

impl Obb {
    /// Create a box from its center, half extents and unit x axis.
    ///
    /// A zero or non-finite axis falls back to the screen x axis.
    pub fn new(center: Point, half_extents: Vec2, axis: Vec2) -> Self {
        let len = axis.hypot();
        let axis = if len.is_finite() && len > 0.0 {
            if (len - 1.0).abs() <= f64::EPSILON {
                axis
            } else {
                axis / len
            }
        } else {
            Vec2::new(1.0, 0.0)
        };
        Self {
            center,
            axis,
            half: Vec2::new(half_extents.x.max(0.0), half_extents.y.max(0.0)),
        }
    }

    /// Create an axis-aligned box from its center and half extents.
    pub fn axis_aligned(center: Point, half_extents: Vec2) -> Self {
        Self::new(center, half_extents, Vec2::new(1.0, 0.0))
    }

    /// Create a box rotated by `angle` radians (clockwise on a y-down screen).
    pub fn rotated(center: Point, half_extents: Vec2, angle: f64) -> Self {
        Self::new(center, half_extents, Vec2::from_angle(angle))
    }

    /// Create an axis-aligned box covering `rect`.
    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::axis_aligned(
            rect.center(),
            Vec2::new(0.5 * rect.width(), 0.5 * rect.height()),
        )
    }

    /// Center of the box.
    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    /// Unit direction of the box's local x axis.
    #[inline]
    pub fn axis(&self) -> Vec2 {
        self.axis
    }

    /// Unit direction of the box's local y axis.
    #[inline]
    pub fn perp(&self) -> Vec2 {
        Vec2::new(-self.axis.y, self.axis.x)
    }

    /// Half extents along the local x and y axes.
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.half
    }

    /// Whether the box is aligned with the screen axes.
    pub fn is_axis_aligned(&self) -> bool {
        self.axis.y == 0.0 || self.axis.x == 0.0
    }

    /// The same box moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            center: self.center + delta,
            ..*self
        }
    }

    /// The box grown by `dx` along its x axis and `dy` along its y axis on each side.
    pub fn inflated(&self, dx: f64, dy: f64) -> Self {
        Self {
            half: Vec2::new((self.half.x + dx).max(0.0), (self.half.y + dy).max(0.0)),
            ..*self
        }
    }

    /// The four corners, counter-clockwise starting at local (-x, -y).
    pub fn corners(&self) -> [Point; 4] {
        let ax = self.axis * self.half.x;
        let ay = self.perp() * self.half.y;
        let c = self.center;
        [c - ax - ay, c + ax - ay, c + ax + ay, c - ax + ay]
    }

    /// The smallest axis-aligned rectangle containing the box.
    pub fn bounding_box(&self) -> Rect {
        let perp = self.perp();
        let ex = self.half.x * self.axis.x.abs() + self.half.y * perp.x.abs();
        let ey = self.half.x * self.axis.y.abs() + self.half.y * perp.y.abs();
        Rect::new(
            self.center.x - ex,
            self.center.y - ey,
            self.center.x + ex,
            self.center.y + ey,
        )
    }

    /// Radius of the projection of this box onto the direction `dir`.
    #[inline]
    fn projected_radius(&self, dir: Vec2) -> f64 {
        self.half.x * self.axis.dot(dir).abs() + self.half.y * self.perp().dot(dir).abs()
    }

    /// Exact intersection test using the separating axis theorem.
    ///
    /// Touching boxes intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use kurbo::{Point, Vec2};
    /// use understory_isect::Obb;
    ///
    /// let a = Obb::axis_aligned(Point::new(0.0, 0.0), Vec2::new(5.0, 5.0));
    /// let b = Obb::axis_aligned(Point::new(10.0, 0.0), Vec2::new(5.0, 5.0));
    /// assert!(a.intersects(&b));
    ///
    /// let c = Obb::axis_aligned(Point::new(11.0, 0.0), Vec2::new(5.0, 5.0));
    /// assert!(!a.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        let d = other.center - self.center;
        let axes = [self.axis, self.perp(), other.axis, other.perp()];
        for dir in axes {
            let dist = d.dot(dir).abs();
            if dist > self.projected_radius(dir) + other.projected_radius(dir) {
                return false;
            }
        }
        true
    }

    /// Whether the point lies inside the box or on its boundary.
    pub fn contains(&self, pt: Point) -> bool {
        let d = pt - self.center;
        d.dot(self.axis).abs() <= self.half.x && d.dot(self.perp()).abs() <= self.half.y
    }

    /// Distance from the point to the box, zero for points inside.
    pub fn distance_to(&self, pt: Point) -> f64 {
        let d = pt - self.center;
        let dx = (d.dot(self.axis).abs() - self.half.x).max(0.0);
        let dy = (d.dot(self.perp()).abs() - self.half.y).max(0.0);
        Vec2::new(dx, dy).hypot()
    }
}
