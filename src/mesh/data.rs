//! Vertex and index buffers shared by every mesh builder

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Vec2, Vec3, Vec4};
use crate::math::{Aabb, ContentHasher};

/// Default tangent: +X with positive handedness
pub const DEFAULT_TANGENT: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);

/// Interleaved vertex layout (80 bytes, no padding)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
    /// Material channel: metallic, glossiness, subsurface, style id
    pub uv2: [f32; 4],
    pub color: [f32; 4],
}

/// Structure-of-arrays mesh.
///
/// Every per-vertex vector has the same length; `triangle_ids` has one entry
/// per triangle (`indices.len() / 3`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec4>,
    pub uvs: Vec<Vec2>,
    pub uv2: Vec<Vec4>,
    pub colors: Vec<Vec4>,
    pub indices: Vec<u32>,
    /// Element id per triangle (branch level, sprout group)
    pub triangle_ids: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            tangents: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            uv2: Vec::with_capacity(vertices),
            colors: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
            triangle_ids: Vec::with_capacity(triangles),
        }
    }

    /// Append a vertex with white color and an empty material channel
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, tangent: Vec4, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.tangents.push(tangent);
        self.uvs.push(uv);
        self.uv2.push(Vec4::ZERO);
        self.colors.push(Vec4::ONE);
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32, id: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
        self.triangle_ids.push(id);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// All attribute arrays agree in length and every index is in range
    pub fn is_consistent(&self) -> bool {
        let n = self.positions.len();
        [self.normals.len(), self.tangents.len(), self.uvs.len(), self.uv2.len(), self.colors.len()]
            .iter()
            .all(|&len| len == n)
            && self.indices.len() % 3 == 0
            && self.triangle_ids.len() == self.triangle_count()
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Merge `other` into this mesh, offsetting its indices
    pub fn append(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.tangents.extend_from_slice(&other.tangents);
        self.uvs.extend_from_slice(&other.uvs);
        self.uv2.extend_from_slice(&other.uv2);
        self.colors.extend_from_slice(&other.colors);
        self.indices.extend(other.indices.iter().map(|&i| i + base));
        self.triangle_ids.extend_from_slice(&other.triangle_ids);
    }

    /// Apply an affine transform to positions, normals and tangents
    pub fn transform(&mut self, matrix: &Mat4) {
        let normal_matrix = matrix.inverse().transpose();
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        for n in &mut self.normals {
            *n = normal_matrix.transform_vector3(*n).normalize_or_zero();
        }
        for t in &mut self.tangents {
            let xyz = matrix.transform_vector3(t.truncate()).normalize_or_zero();
            *t = xyz.extend(t.w);
        }
    }

    /// Overwrite every triangle id
    pub fn set_triangle_ids(&mut self, id: u32) {
        self.triangle_ids.iter_mut().for_each(|t| *t = id);
    }

    /// Area-weighted smooth normals from the current triangles
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let face = (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            accum[a] += face;
            accum[b] += face;
            accum[c] += face;
        }
        for (normal, sum) in self.normals.iter_mut().zip(accum) {
            if let Some(n) = sum.try_normalize() {
                *normal = n;
            }
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// FNV-1a over positions, uvs and indices
    pub fn content_hash(&self) -> u64 {
        let mut hasher = ContentHasher::new();
        hasher.write_u64(self.positions.len() as u64);
        for p in &self.positions {
            for v in p.to_array() {
                hasher.write_f32(v);
            }
        }
        for uv in &self.uvs {
            hasher.write_f32(uv.x);
            hasher.write_f32(uv.y);
        }
        for &i in &self.indices {
            hasher.write_u32(i);
        }
        for &id in &self.triangle_ids {
            hasher.write_u32(id);
        }
        hasher.finish()
    }

    /// Interleaved vertex buffer ready for `bytemuck::cast_slice`
    pub fn interleaved(&self) -> Vec<Vertex> {
        (0..self.positions.len())
            .map(|i| Vertex {
                position: self.positions[i].to_array(),
                normal: self.normals.get(i).copied().unwrap_or(Vec3::Y).to_array(),
                tangent: self.tangents.get(i).copied().unwrap_or(DEFAULT_TANGENT).to_array(),
                uv: self.uvs.get(i).copied().unwrap_or(Vec2::ZERO).to_array(),
                uv2: self.uv2.get(i).copied().unwrap_or(Vec4::ZERO).to_array(),
                color: self.colors.get(i).copied().unwrap_or(Vec4::ONE).to_array(),
            })
            .collect()
    }
}
