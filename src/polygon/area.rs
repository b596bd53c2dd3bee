//! Planar polygon captured from a fragment

use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3, Vec4};
use crate::math::{OrientedRect, Rect};
use crate::mesh::MeshData;

/// Convex outline plus interior topology of one fragment, flattened onto its plane.
///
/// `points[..=last_convex_point_index]` is the counter-clockwise hull; any
/// remaining points are interior topology points. All per-vertex arrays are
/// parallel to `points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonArea {
    pub name: String,
    pub lod: usize,
    pub points: Vec<Vec2>,
    pub last_convex_point_index: usize,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    /// Local `[0, 1]` coordinates against `aabb`; atlas remapping rewrites these
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub aabb: Rect,
    pub obb: OrientedRect,
    pub plane_normal: Vec3,
    pub plane_up: Vec3,
    pub hash: u64,
}

impl PolygonArea {
    /// Area with no geometry, still carrying its identity
    pub fn empty(name: impl Into<String>, lod: usize, plane_normal: Vec3, plane_up: Vec3, hash: u64) -> Self {
        let aabb = Rect::new(Vec2::ZERO, Vec2::ZERO);
        Self {
            name: name.into(),
            lod,
            points: Vec::new(),
            last_convex_point_index: 0,
            positions: Vec::new(),
            normals: Vec::new(),
            tangents: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            aabb,
            obb: OrientedRect::from_rect(&aabb),
            plane_normal,
            plane_up,
            hash,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn hull_points(&self) -> &[Vec2] {
        if self.points.is_empty() {
            return &[];
        }
        &self.points[..=self.last_convex_point_index]
    }

    pub fn topology_points(&self) -> &[Vec2] {
        if self.points.is_empty() {
            return &[];
        }
        &self.points[self.last_convex_point_index + 1..]
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Sum of triangle areas in plane units
    pub fn surface_area(&self) -> f32 {
        self.indices
            .chunks_exact(3)
            .map(|t| {
                let [a, b, c] = [t[0], t[1], t[2]].map(|i| self.points[i as usize]);
                (b - a).perp_dot(c - a).abs() * 0.5
            })
            .sum()
    }

    /// Texture size in pixels at `texel_density` pixels per unit, at least 1x1
    pub fn texture_size(&self, texel_density: f32) -> (u32, u32) {
        let px = |v: f32| ((v * texel_density).ceil().max(1.0)) as u32;
        (px(self.aabb.width()), px(self.aabb.height()))
    }

    /// Geometry as a mesh; every triangle gets `id`
    pub fn to_mesh(&self, id: u32) -> MeshData {
        let mut mesh = MeshData::with_capacity(self.points.len(), self.triangle_count());
        for i in 0..self.points.len() {
            mesh.push_vertex(self.positions[i], self.normals[i], self.tangents[i], self.uvs[i]);
        }
        for t in self.indices.chunks_exact(3) {
            mesh.push_triangle(t[0], t[1], t[2], id);
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_area() {
        let area = PolygonArea::empty("leaf", 0, Vec3::X, Vec3::Y, 42);
        assert!(area.is_empty());
        assert!(area.hull_points().is_empty());
        assert!(area.topology_points().is_empty());
        assert_eq!(area.surface_area(), 0.0);
        assert_eq!(area.texture_size(64.0), (1, 1));
        assert!(area.to_mesh(0).is_empty());
    }
}
