//! Convex hull and minimum-area bounding rectangle in 2D

use crate::core::types::Vec2;
use crate::math::rect::OrientedRect;

/// Areas below this are treated as degenerate
pub const AREA_EPSILON: f32 = 1e-9;

/// Z component of `(a - o) x (b - o)`; positive for a counter-clockwise turn
#[inline]
pub fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns indices into `points`, counter-clockwise, starting at the lowest-x
/// (then lowest-y) point. Duplicate and collinear points are dropped, so a
/// collinear input yields its two extreme points.
pub fn convex_hull(points: &[Vec2]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a].x.total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);

    if order.len() < 3 {
        return order;
    }

    let mut lower: Vec<usize> = Vec::with_capacity(order.len());
    for &i in &order {
        while lower.len() >= 2
            && cross(points[lower[lower.len() - 2]], points[lower[lower.len() - 1]], points[i]) <= 0.0
        {
            lower.pop();
        }
        lower.push(i);
    }

    let mut upper: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order.iter().rev() {
        while upper.len() >= 2
            && cross(points[upper[upper.len() - 2]], points[upper[upper.len() - 1]], points[i]) <= 0.0
        {
            upper.pop();
        }
        upper.push(i);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Signed polygon area (shoelace); positive for counter-clockwise winding
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.perp_dot(b);
    }
    sum * 0.5
}

/// Minimum-area enclosing rectangle of a convex hull.
///
/// Rotating-calipers argument: the optimal rectangle has one side collinear
/// with a hull edge, so every edge direction is tried. Returns `None` for
/// hulls with fewer than 3 points or (near) zero area.
pub fn min_area_rect(hull: &[Vec2]) -> Option<OrientedRect> {
    if hull.len() < 3 || signed_area(hull).abs() <= AREA_EPSILON {
        return None;
    }

    let mut best: Option<(f32, OrientedRect)> = None;
    for i in 0..hull.len() {
        let edge = hull[(i + 1) % hull.len()] - hull[i];
        let Some(axis) = edge.try_normalize() else {
            continue;
        };
        let normal = axis.perp();

        let (mut min_u, mut max_u) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_v, mut max_v) = (f32::INFINITY, f32::NEG_INFINITY);
        for &p in hull {
            let u = p.dot(axis);
            let v = p.dot(normal);
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let center_u = (min_u + max_u) * 0.5;
            let center_v = (min_v + max_v) * 0.5;
            best = Some((area, OrientedRect {
                center: axis * center_u + normal * center_v,
                axis,
                half_extents: Vec2::new((max_u - min_u) * 0.5, (max_v - min_v) * 0.5),
            }));
        }
    }

    best.map(|(_, rect)| rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_with_interior_point() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&2));
        let poly: Vec<Vec2> = hull.iter().map(|&i| pts[i]).collect();
        assert!((signed_area(&poly) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_points() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull, vec![0, 2]);
        let poly: Vec<Vec2> = pts.to_vec();
        assert!(min_area_rect(&poly).is_none());
    }

    #[test]
    fn test_duplicates_removed() {
        let pts = [Vec2::ZERO, Vec2::ZERO, Vec2::X, Vec2::Y];
        assert_eq!(convex_hull(&pts).len(), 3);
    }

    #[test]
    fn test_min_area_rect_rotated_square() {
        // Unit square rotated 45 degrees: AABB area is 2, OBB area is 1
        let h = std::f32::consts::FRAC_1_SQRT_2;
        let hull = [
            Vec2::new(0.0, -h),
            Vec2::new(h, 0.0),
            Vec2::new(0.0, h),
            Vec2::new(-h, 0.0),
        ];
        let obb = min_area_rect(&hull).unwrap();
        assert!((obb.area() - 1.0).abs() < 1e-5);
        assert!(obb.center.length() < 1e-5);
    }
}
