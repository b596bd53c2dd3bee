//! Ring extrusion along a polyline with a parallel-transported frame

use std::f32::consts::{PI, TAU};

use crate::core::types::{Quat, Vec2, Vec3};
use crate::mesh::MeshData;

/// Polyline with cumulative arc lengths, sampled by normalized arc length
#[derive(Debug, Clone)]
pub struct Backbone {
    points: Vec<Vec3>,
    arcs: Vec<f32>,
}

impl Backbone {
    /// Consecutive duplicate points are dropped so no segment has zero length
    pub fn new(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut filtered: Vec<Vec3> = Vec::new();
        for p in points {
            if filtered.last().is_none_or(|last| last.distance_squared(p) > 1e-12) {
                filtered.push(p);
            }
        }
        let mut arcs = Vec::with_capacity(filtered.len());
        let mut total = 0.0;
        for (i, p) in filtered.iter().enumerate() {
            if i > 0 {
                total += filtered[i - 1].distance(*p);
            }
            arcs.push(total);
        }
        Self { points: filtered, arcs }
    }

    pub fn length(&self) -> f32 {
        self.arcs.last().copied().unwrap_or(0.0)
    }

    /// Center and unit tangent at normalized arc length `t`.
    ///
    /// Exactly on an interior point the tangent is the miter of both segments.
    pub fn sample(&self, t: f32) -> (Vec3, Vec3) {
        let Some(&first) = self.points.first() else {
            return (Vec3::ZERO, Vec3::Y);
        };
        if self.points.len() < 2 {
            return (first, Vec3::Y);
        }
        let s = t.clamp(0.0, 1.0) * self.length();
        let k = self.arcs.partition_point(|&a| a <= s).clamp(1, self.points.len() - 1) - 1;
        let (a, b) = (self.points[k], self.points[k + 1]);
        let span = self.arcs[k + 1] - self.arcs[k];
        let f = ((s - self.arcs[k]) / span).clamp(0.0, 1.0);
        let dir = (b - a).normalize_or(Vec3::Y);

        let tangent = if f < 1e-5 && k > 0 {
            let incoming = (a - self.points[k - 1]).normalize_or(dir);
            (incoming + dir).normalize_or(dir)
        } else {
            dir
        };
        (a.lerp(b, f), tangent)
    }
}

/// Shortest rotation taking `from` onto `to`, stable for (anti)parallel input
pub fn rotation_arc(from: Vec3, to: Vec3) -> Quat {
    const DOT_THRESHOLD: f32 = 0.9999;
    let dot = from.dot(to);
    if dot < -DOT_THRESHOLD {
        return Quat::from_axis_angle(from.any_orthonormal_vector(), PI);
    }
    if dot > DOT_THRESHOLD {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from, to)
}

/// Ring rotations for a sequence of tangents; each maps local +Y onto its tangent
pub fn transport_frames(tangents: &[Vec3]) -> Vec<Quat> {
    let mut frames = Vec::with_capacity(tangents.len());
    let mut previous = Vec3::Y;
    let mut rotation = Quat::IDENTITY;
    for &tangent in tangents {
        rotation = (rotation_arc(previous, tangent) * rotation).normalize();
        previous = tangent;
        frames.push(rotation);
    }
    frames
}

/// Local ring direction at angle `theta`: cos on local X, sin on local Z
#[inline]
pub fn ring_direction(theta: f32) -> Vec3 {
    let (sin, cos) = theta.sin_cos();
    Vec3::new(cos, 0.0, sin)
}

/// Push one ring of `segments` vertices with no seam duplicate.
///
/// `radius` receives the vertex index and its angle.
pub fn push_ring(
    mesh: &mut MeshData,
    center: Vec3,
    rotation: Quat,
    segments: u32,
    v: f32,
    radius: impl Fn(u32, f32) -> f32,
) -> u32 {
    let start = mesh.vertex_count() as u32;
    for j in 0..segments {
        let u = j as f32 / segments as f32;
        let theta = u * TAU;
        let normal = rotation * ring_direction(theta);
        let tangent = rotation * ring_direction(theta + PI * 0.5);
        mesh.push_vertex(center + normal * radius(j, theta), normal, tangent.extend(1.0), Vec2::new(u, v));
    }
    start
}

/// Two triangles per quad between consecutive rings, wrapping around
pub fn connect_rings(mesh: &mut MeshData, bottom: u32, top: u32, segments: u32, id: u32) {
    for j in 0..segments {
        let next = (j + 1) % segments;
        let (a, b) = (bottom + j, bottom + next);
        let (c, d) = (top + j, top + next);
        mesh.push_triangle(a, c, b, id);
        mesh.push_triangle(b, c, d, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backbone_sample_straight() {
        let backbone = Backbone::new([Vec3::ZERO, Vec3::Y, Vec3::Y * 2.0]);
        assert_eq!(backbone.length(), 2.0);
        let (center, tangent) = backbone.sample(0.25);
        assert!(center.abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), 1e-6));
        assert!(tangent.abs_diff_eq(Vec3::Y, 1e-6));
        let (end, _) = backbone.sample(1.0);
        assert!(end.abs_diff_eq(Vec3::Y * 2.0, 1e-6));
    }

    #[test]
    fn test_backbone_drops_duplicates() {
        let backbone = Backbone::new([Vec3::ZERO, Vec3::ZERO, Vec3::X]);
        let (_, tangent) = backbone.sample(0.0);
        assert!(tangent.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_miter_at_corner() {
        let backbone = Backbone::new([Vec3::ZERO, Vec3::Y, Vec3::Y + Vec3::X]);
        let (center, tangent) = backbone.sample(0.5);
        assert!(center.abs_diff_eq(Vec3::Y, 1e-6));
        assert!(tangent.abs_diff_eq((Vec3::X + Vec3::Y).normalize(), 1e-5));
    }

    #[test]
    fn test_transport_frames_follow_tangent() {
        let tangents = [Vec3::Y, (Vec3::Y + Vec3::X).normalize(), Vec3::X, Vec3::NEG_Y];
        for (rotation, tangent) in transport_frames(&tangents).iter().zip(tangents) {
            assert!((*rotation * Vec3::Y).abs_diff_eq(tangent, 1e-4));
        }
    }

    #[test]
    fn test_ring_winding_faces_outward() {
        let mut mesh = MeshData::new();
        let bottom = push_ring(&mut mesh, Vec3::ZERO, Quat::IDENTITY, 8, 0.0, |_, _| 1.0);
        let top = push_ring(&mut mesh, Vec3::Y, Quat::IDENTITY, 8, 1.0, |_, _| 1.0);
        connect_rings(&mut mesh, bottom, top, 8, 0);
        assert_eq!(mesh.triangle_count(), 16);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.positions[i as usize]);
            let face = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            let outward = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(face.dot(outward) > 0.0);
        }
    }
}
