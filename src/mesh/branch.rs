//! Tapered tubes for every non-trunk branch, roots included

use crate::mesh::tube::{connect_rings, push_ring, transport_frames};
use crate::mesh::MeshData;
use crate::params::BranchDescriptor;
use crate::skeleton::{Branch, Skeleton};

/// Fewest ring segments any branch gets
const MIN_RADIAL_SEGMENTS: u32 = 3;

/// Triangle id shared by every root tube, kept clear of branch levels
pub const ROOT_ELEMENT_ID: u32 = u32::MAX;

pub struct BranchMeshBuilder<'a> {
    descriptor: &'a BranchDescriptor,
    resolution_scale: f32,
}

impl<'a> BranchMeshBuilder<'a> {
    pub fn new(descriptor: &'a BranchDescriptor) -> Self {
        Self { descriptor, resolution_scale: 1.0 }
    }

    pub fn with_resolution_scale(mut self, scale: f32) -> Self {
        self.resolution_scale = scale.max(0.0);
        self
    }

    /// Ring segments at `level`; each level halves the trunk's count
    pub fn radial_segments(&self, level: u32) -> u32 {
        let trunk = self.descriptor.trunk_mesh.radial_segments() as f32 * self.resolution_scale;
        ((trunk / (1u32 << level.min(16)) as f32).round() as u32).max(MIN_RADIAL_SEGMENTS)
    }

    /// One ring per node; triangle ids carry the branch level, or
    /// [`ROOT_ELEMENT_ID`] for roots
    pub fn build(&self, skeleton: &Skeleton) -> MeshData {
        let mut mesh = MeshData::new();
        for branch in skeleton.branches().iter().skip(1) {
            self.build_branch(skeleton, branch, &mut mesh);
        }
        log::debug!(
            "Branch meshes: {} branches, {} vertices, {} triangles",
            skeleton.branch_count().saturating_sub(1),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        mesh
    }

    fn build_branch(&self, skeleton: &Skeleton, branch: &Branch, mesh: &mut MeshData) {
        if branch.nodes.len() < 2 {
            return;
        }
        let nodes: Vec<_> = branch.nodes.iter().map(|&n| &skeleton.nodes()[n]).collect();
        let tangents: Vec<_> = nodes
            .iter()
            .enumerate()
            .map(|(k, node)| {
                let incoming = (k > 0).then(|| node.position - nodes[k - 1].position);
                let outgoing = nodes.get(k + 1).map(|next| next.position - node.position);
                let sum = incoming.unwrap_or_default().normalize_or_zero()
                    + outgoing.unwrap_or_default().normalize_or_zero();
                sum.normalize_or(node.direction)
            })
            .collect();
        let frames = transport_frames(&tangents);

        let segments = self.radial_segments(branch.level);
        let id = if branch.is_root { ROOT_ELEMENT_ID } else { branch.level };
        let mut previous = None;
        let mut travelled = 0.0;
        for (k, (node, rotation)) in nodes.iter().zip(frames).enumerate() {
            if k > 0 {
                travelled += node.position.distance(nodes[k - 1].position);
            }
            let v = if branch.length > 0.0 { travelled / branch.length } else { 0.0 };
            let ring = push_ring(mesh, node.position, rotation, segments, v, |_, _| node.radius);
            if let Some(bottom) = previous {
                connect_rings(mesh, bottom, ring, segments, id);
            }
            previous = Some(ring);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::BranchLevel;

    #[test]
    fn test_trunk_only_has_no_branch_mesh() {
        let desc = BranchDescriptor::trunk_only(0.4, 0.2);
        let skel = Skeleton::build(&desc).unwrap();
        assert!(BranchMeshBuilder::new(&desc).build(&skel).is_empty());
    }

    #[test]
    fn test_tube_counts_and_ids() {
        let mut desc = BranchDescriptor::trunk_only(0.4, 0.2);
        desc.levels = vec![BranchLevel { min_frequency: 2, max_frequency: 2, segments: 3, ..Default::default() }];
        desc.active_levels = 1;
        let skel = Skeleton::build(&desc).unwrap();
        let builder = BranchMeshBuilder::new(&desc);
        let mesh = builder.build(&skel);
        let radial = builder.radial_segments(1) as usize;
        assert_eq!(radial, 4);
        assert_eq!(mesh.vertex_count(), 2 * 4 * radial);
        assert_eq!(mesh.triangle_count(), 2 * 3 * radial * 2);
        assert!(mesh.triangle_ids.iter().all(|&id| id == 1));
        assert!(mesh.is_consistent());
    }

    #[test]
    fn test_roots_carry_their_own_id() {
        let mut desc = BranchDescriptor::trunk_only(0.4, 0.2);
        desc.levels = vec![BranchLevel { min_frequency: 2, max_frequency: 2, segments: 3, ..Default::default() }];
        desc.active_levels = 1;
        desc.roots = Some(BranchLevel::roots());
        let skel = Skeleton::build(&desc).unwrap();
        assert!(skel.root_branches().count() > 0);
        let mesh = BranchMeshBuilder::new(&desc).build(&skel);
        let roots = mesh.triangle_ids.iter().filter(|&&id| id == ROOT_ELEMENT_ID).count();
        let level_one = mesh.triangle_ids.iter().filter(|&&id| id == 1).count();
        assert!(roots > 0);
        assert!(level_one > 0);
        assert_eq!(roots + level_one, mesh.triangle_count());
    }

    #[test]
    fn test_rings_follow_node_radius() {
        let mut desc = BranchDescriptor::trunk_only(0.4, 0.2);
        desc.levels = vec![BranchLevel { min_frequency: 1, max_frequency: 1, ..Default::default() }];
        desc.active_levels = 1;
        let skel = Skeleton::build(&desc).unwrap();
        let builder = BranchMeshBuilder::new(&desc);
        let mesh = builder.build(&skel);
        let radial = builder.radial_segments(1) as usize;
        let branch = &skel.branches()[1];
        for (k, &n) in branch.nodes.iter().enumerate() {
            let node = &skel.nodes()[n];
            for p in &mesh.positions[k * radial..(k + 1) * radial] {
                assert!((p.distance(node.position) - node.radius).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_level_halves_segments() {
        let desc = BranchDescriptor::default();
        let builder = BranchMeshBuilder::new(&desc);
        let trunk = desc.trunk_mesh.radial_segments();
        assert_eq!(builder.radial_segments(0), trunk);
        assert!(builder.radial_segments(1) <= trunk);
        assert_eq!(builder.radial_segments(12), MIN_RADIAL_SEGMENTS);
    }
}
