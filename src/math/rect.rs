//! 2D rectangles: axis-aligned and oriented

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// Axis-aligned 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rect from origin and size
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Bounding rect of `points`, `None` when empty
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let mut rect = Rect::new(first, first);
        for &p in &points[1..] {
            rect.min = rect.min.min(p);
            rect.max = rect.max.max(p);
        }
        Some(rect)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Grow by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// True when the interiors overlap. Shared edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Rectangle with an arbitrary orientation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrientedRect {
    pub center: Vec2,
    /// Unit vector of the rect's local x axis; local y is its perpendicular
    pub axis: Vec2,
    pub half_extents: Vec2,
}

impl OrientedRect {
    /// Axis-aligned rect expressed as an oriented one
    pub fn from_rect(rect: &Rect) -> Self {
        Self {
            center: rect.center(),
            axis: Vec2::X,
            half_extents: rect.size() * 0.5,
        }
    }

    pub fn area(&self) -> f32 {
        4.0 * self.half_extents.x * self.half_extents.y
    }

    /// Rotation of the local x axis in radians
    pub fn angle(&self) -> f32 {
        self.axis.y.atan2(self.axis.x)
    }

    /// Corners in counter-clockwise order
    pub fn corners(&self) -> [Vec2; 4] {
        let ax = self.axis * self.half_extents.x;
        let ay = self.axis.perp() * self.half_extents.y;
        [
            self.center - ax - ay,
            self.center + ax - ay,
            self.center + ax + ay,
            self.center - ax + ay,
        ]
    }
}
