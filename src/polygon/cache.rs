//! Caller-owned cache of extracted polygon areas keyed by content hash

use std::collections::HashMap;

use crate::mesh::MeshData;
use crate::polygon::{Fragment, PolygonArea, PolygonAreaBuilder};

#[derive(Debug, Default)]
pub struct PolygonAreaCache {
    areas: HashMap<u64, PolygonArea>,
    hits: usize,
    misses: usize,
}

impl PolygonAreaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached area for the fragment, extracting it on a miss
    pub fn get_or_extract(&mut self, composite: &MeshData, fragment: &Fragment) -> &PolygonArea {
        let hash = PolygonAreaBuilder::fragment_hash(composite, fragment);
        if self.areas.contains_key(&hash) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.areas
            .entry(hash)
            .or_insert_with(|| PolygonAreaBuilder::extract_fragment(composite, fragment))
    }

    pub fn get(&self, hash: u64) -> Option<&PolygonArea> {
        self.areas.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn clear(&mut self) {
        self.areas.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Vec2, Vec3};
    use crate::mesh::data::DEFAULT_TANGENT;

    fn triangle(z: f32) -> MeshData {
        let mut mesh = MeshData::new();
        let a = mesh.push_vertex(Vec3::new(0.0, 0.0, z), Vec3::X, DEFAULT_TANGENT, Vec2::ZERO);
        let b = mesh.push_vertex(Vec3::new(0.0, 0.0, z + 1.0), Vec3::X, DEFAULT_TANGENT, Vec2::ZERO);
        let c = mesh.push_vertex(Vec3::new(0.0, 1.0, z), Vec3::X, DEFAULT_TANGENT, Vec2::ZERO);
        mesh.push_triangle(a, b, c, 0);
        mesh
    }

    #[test]
    fn test_hit_after_first_extract() {
        let mut cache = PolygonAreaCache::new();
        let mesh = triangle(0.0);
        let fragment = Fragment::new("tri");
        let hash = cache.get_or_extract(&mesh, &fragment).hash;
        cache.get_or_extract(&mesh, &fragment);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(hash).is_some());
    }

    #[test]
    fn test_changed_geometry_misses() {
        let mut cache = PolygonAreaCache::new();
        let fragment = Fragment::new("tri");
        cache.get_or_extract(&triangle(0.0), &fragment);
        cache.get_or_extract(&triangle(1.0), &fragment);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
