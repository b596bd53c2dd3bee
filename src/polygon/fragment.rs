//! Fragment definitions: which triangles to capture and from which plane

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3};
use crate::math::ContentHasher;

/// Projection plane with an optional cut.
///
/// The 2D basis is `right = normal x up`, `up`; with the default plane
/// (normal +X, up +Y) right is +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutPlane {
    pub normal: Vec3,
    pub up: Vec3,
    /// Triangles entirely behind `dot(p, normal) < offset` are dropped
    pub offset: Option<f32>,
}

impl Default for CutPlane {
    fn default() -> Self {
        Self { normal: Vec3::X, up: Vec3::Y, offset: None }
    }
}

/// Orthonormal projection basis of a [`CutPlane`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub right: Vec3,
    pub up: Vec3,
    pub normal: Vec3,
}

impl PlaneBasis {
    pub fn project(&self, p: Vec3) -> Vec2 {
        Vec2::new(p.dot(self.right), p.dot(self.up))
    }

    /// Point on the plane at `depth` along the normal
    pub fn unproject(&self, p: Vec2, depth: f32) -> Vec3 {
        self.right * p.x + self.up * p.y + self.normal * depth
    }
}

impl CutPlane {
    pub fn new(normal: Vec3, up: Vec3) -> Self {
        Self { normal, up, offset: None }
    }

    /// Front view: looking along -Z with +Y up
    pub fn front() -> Self {
        Self::new(Vec3::Z, Vec3::Y)
    }

    /// Side view: looking along -X with +Y up
    pub fn side() -> Self {
        Self::default()
    }

    /// Top view: looking down with -Z up
    pub fn top() -> Self {
        Self::new(Vec3::Y, Vec3::NEG_Z)
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// `None` for a zero normal or an `up` parallel to the normal
    pub fn basis(&self) -> Option<PlaneBasis> {
        let normal = self.normal.try_normalize()?;
        let up = (self.up - normal * self.up.dot(normal)).try_normalize()?;
        Some(PlaneBasis { right: normal.cross(up), up, normal })
    }

    pub fn is_behind(&self, p: Vec3) -> bool {
        match (self.offset, self.normal.try_normalize()) {
            (Some(offset), Some(n)) => p.dot(n) < offset,
            _ => false,
        }
    }

    fn hash_into(&self, hasher: &mut ContentHasher) {
        for v in self.normal.to_array().into_iter().chain(self.up.to_array()) {
            hasher.write_f32(v);
        }
        match self.offset {
            Some(offset) => {
                hasher.write_u32(1);
                hasher.write_f32(offset);
            }
            None => hasher.write_u32(0),
        }
    }
}

/// Request to capture a subset of a composite mesh as one polygon area
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fragment {
    pub name: String,
    /// Element ids to keep; empty keeps everything
    pub include_ids: BTreeSet<u32>,
    pub exclude_ids: BTreeSet<u32>,
    pub plane: CutPlane,
    pub lod: usize,
}

impl Fragment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn include(mut self, id: u32) -> Self {
        self.include_ids.insert(id);
        self
    }

    pub fn exclude(mut self, id: u32) -> Self {
        self.exclude_ids.insert(id);
        self
    }

    pub fn with_plane(mut self, plane: CutPlane) -> Self {
        self.plane = plane;
        self
    }

    pub fn with_lod(mut self, lod: usize) -> Self {
        self.lod = lod;
        self
    }

    /// Whether a triangle with element id `id` belongs to this fragment
    pub fn selects(&self, id: u32) -> bool {
        (self.include_ids.is_empty() || self.include_ids.contains(&id)) && !self.exclude_ids.contains(&id)
    }

    pub(crate) fn hash_into(&self, hasher: &mut ContentHasher) {
        hasher.write_str(&self.name);
        hasher.write_u64(self.lod as u64);
        hasher.write_u64(self.include_ids.len() as u64);
        for &id in &self.include_ids {
            hasher.write_u32(id);
        }
        hasher.write_u64(self.exclude_ids.len() as u64);
        for &id in &self.exclude_ids {
            hasher.write_u32(id);
        }
        self.plane.hash_into(hasher);
    }
}
