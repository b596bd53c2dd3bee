//! Tree generation pipeline
//!
//! The pipeline orchestrates:
//! 1. Skeleton construction from the descriptor
//! 2. Bending, smoothing and noise deformation
//! 3. Trunk and branch meshes
//! 4. Sprout placement (sequential) and sprout meshes (rayon)

pub mod config;

pub use config::GenerationConfig;

use std::time::Instant;

use rayon::prelude::*;

use crate::core::types::{Mat4, Quat, Vec3};
use crate::core::{ProgressReporter, Result};
use crate::math::SimpleRng;
use crate::mesh::tube::rotation_arc;
use crate::mesh::{BranchMeshBuilder, MeshData, SproutMeshBuilder, SproutPlacement, TrunkMeshBuilder};
use crate::params::{BranchDescriptor, SproutMapArea};
use crate::skeleton::{BendReport, BranchBender, Skeleton};

const SPROUT_STREAM: u64 = 0x5b40_7000;

/// Sibling phase increment around the carrying branch
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Everything one generation pass produces
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTree {
    pub lod: usize,
    pub skeleton: Skeleton,
    pub bend_report: BendReport,
    pub trunk: MeshData,
    pub branches: MeshData,
    /// All sprouts merged, triangle ids = sprout group ids
    pub sprouts: MeshData,
    pub sprout_count: usize,
}

impl GeneratedTree {
    /// Trunk, branches and sprouts in one buffer
    pub fn composite(&self) -> MeshData {
        let mut mesh = self.trunk.clone();
        mesh.append(&self.branches);
        mesh.append(&self.sprouts);
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.trunk.triangle_count() + self.branches.triangle_count() + self.sprouts.triangle_count()
    }
}

/// One sprout ready to be built: which group, which texture area, where
#[derive(Debug, Clone, Copy)]
struct PlacedSprout {
    group: usize,
    area: SproutMapArea,
    placement: SproutPlacement,
    transform: Mat4,
}

pub struct TreeGenerator {
    config: GenerationConfig,
}

impl TreeGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate the finest LOD
    pub fn generate(&self, descriptor: &BranchDescriptor, progress: &mut impl ProgressReporter) -> Result<GeneratedTree> {
        self.generate_lod(descriptor, 0, progress)
    }

    /// Generate `lod`, with trunk and branch resolution scaled by the config's falloff
    pub fn generate_lod(
        &self,
        descriptor: &BranchDescriptor,
        lod: usize,
        progress: &mut impl ProgressReporter,
    ) -> Result<GeneratedTree> {
        self.config.validate()?;
        let start = Instant::now();

        progress.report("Building skeleton", 0.0);
        let mut skeleton = Skeleton::build(descriptor)?;

        progress.report("Bending branches", 0.15);
        let bend_report = BranchBender::new(&descriptor.bending, descriptor.seed).bend(&mut skeleton);

        let scale = self.config.lod_scale(lod);
        progress.report("Building trunk", 0.3);
        let trunk = TrunkMeshBuilder::new(descriptor).with_resolution_scale(scale).build(&skeleton);

        progress.report("Building branches", 0.45);
        let branches = BranchMeshBuilder::new(descriptor).with_resolution_scale(scale).build(&skeleton);

        progress.report("Building sprouts", 0.6);
        let placed = place_sprouts(descriptor, &skeleton, lod);
        let sprouts = self.build_sprouts(descriptor, &placed);

        progress.report("Done", 1.0);
        let elapsed = start.elapsed();
        log::info!(
            "Generated tree (seed {}, LOD {}): {} nodes, {} sprouts, {} triangles in {:.1}ms",
            descriptor.seed,
            lod,
            skeleton.node_count(),
            placed.len(),
            trunk.triangle_count() + branches.triangle_count() + sprouts.triangle_count(),
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(GeneratedTree {
            lod,
            skeleton,
            bend_report,
            trunk,
            branches,
            sprouts,
            sprout_count: placed.len(),
        })
    }

    /// Build every placed sprout and merge in placement order
    fn build_sprouts(&self, descriptor: &BranchDescriptor, placed: &[PlacedSprout]) -> MeshData {
        let build = |sprout: &PlacedSprout| {
            let group = &descriptor.sprouts[sprout.group];
            let style = group.style_id.and_then(|id| descriptor.style(id));
            let mut mesh = SproutMeshBuilder::new(group).with_style(style).build(&sprout.area, &sprout.placement);
            mesh.transform(&sprout.transform);
            mesh
        };

        let meshes: Vec<MeshData> = if self.config.parallel_sprouts {
            placed.par_iter().map(&build).collect()
        } else {
            placed.iter().map(&build).collect()
        };

        let mut merged = MeshData::new();
        for mesh in &meshes {
            merged.append(mesh);
        }
        merged
    }
}

/// Deterministic sprout placement over all carrying branches
fn place_sprouts(descriptor: &BranchDescriptor, skeleton: &Skeleton, lod: usize) -> Vec<PlacedSprout> {
    let mut placed = Vec::new();
    for (g, group) in descriptor.sprouts.iter().enumerate() {
        if !group.enabled {
            continue;
        }
        let areas = group.enabled_areas();
        if areas.is_empty() {
            log::debug!("Sprout group {} has no enabled map areas, skipped", g);
            continue;
        }

        let mut rng = SimpleRng::derive(descriptor.seed, SPROUT_STREAM, g as u64);
        let mut index = 0u64;
        for (b, branch) in skeleton.branches().iter().enumerate() {
            if branch.is_root || branch.level < group.min_level {
                continue;
            }
            let count = rng.int_range(group.min_frequency, group.max_frequency);
            for _ in 0..count {
                let u = rng.next_float();
                let along = group.range.lerp(u);
                let (position, direction, radius) = skeleton.sample_branch(b, along);
                let phase = index as f32 * GOLDEN_ANGLE;
                let outward = Quat::from_axis_angle(direction, phase) * direction.any_orthonormal_vector();
                let up = outward.lerp(direction, group.alignment).normalize_or(direction);
                let rotation = rotation_arc(Vec3::Y, up);
                let area = areas[rng.int_range(0, areas.len() as u32 - 1) as usize];

                placed.push(PlacedSprout {
                    group: g,
                    area,
                    placement: SproutPlacement {
                        hierarchy: skeleton.depth_at(b, along),
                        branch: along,
                        range: u,
                        seed: SimpleRng::derive(descriptor.seed, g as u64 + 1, index).next_u64(),
                        gravity: rotation.inverse() * Vec3::NEG_Y,
                        lod,
                    },
                    transform: Mat4::from_rotation_translation(rotation, position + outward * radius),
                });
                index += 1;
            }
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, NoProgress};
    use crate::params::TreePreset;

    fn sequential() -> GenerationConfig {
        GenerationConfig { parallel_sprouts: false, ..Default::default() }
    }

    #[test]
    fn test_generate_default_tree() {
        let desc = BranchDescriptor::default();
        let tree = TreeGenerator::new(GenerationConfig::default()).generate(&desc, &mut NoProgress).unwrap();
        assert!(!tree.trunk.is_empty());
        assert!(!tree.branches.is_empty());
        assert!(tree.sprout_count > 0);
        assert!(tree.sprouts.is_consistent());
        let group_ids: Vec<u32> = desc.sprouts.iter().map(|s| s.group_id).collect();
        assert!(tree.sprouts.triangle_ids.iter().all(|id| group_ids.contains(id)));
        let composite = tree.composite();
        assert!(composite.is_consistent());
        assert_eq!(composite.triangle_count(), tree.triangle_count());
        assert!(composite.positions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let desc = BranchDescriptor::preset(TreePreset::Willow);
        let generator = TreeGenerator::new(GenerationConfig::default());
        let a = generator.generate(&desc, &mut NoProgress).unwrap();
        let b = generator.generate(&desc, &mut NoProgress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let desc = BranchDescriptor::default();
        let parallel = TreeGenerator::new(GenerationConfig::default()).generate(&desc, &mut NoProgress).unwrap();
        let serial = TreeGenerator::new(sequential()).generate(&desc, &mut NoProgress).unwrap();
        assert_eq!(parallel.sprouts, serial.sprouts);
        assert_eq!(parallel.sprouts.content_hash(), serial.sprouts.content_hash());
    }

    #[test]
    fn test_trunk_only_has_no_sprouts() {
        let desc = BranchDescriptor::trunk_only(0.5, 0.3);
        let tree = TreeGenerator::new(sequential()).generate(&desc, &mut NoProgress).unwrap();
        assert_eq!(tree.sprout_count, 0);
        assert!(tree.sprouts.is_empty());
        assert!(tree.branches.is_empty());
    }

    #[test]
    fn test_coarser_lod_has_fewer_trunk_vertices() {
        let desc = BranchDescriptor::default();
        let generator = TreeGenerator::new(sequential());
        let fine = generator.generate_lod(&desc, 0, &mut NoProgress).unwrap();
        let coarse = generator.generate_lod(&desc, 2, &mut NoProgress).unwrap();
        assert!(coarse.trunk.vertex_count() < fine.trunk.vertex_count());
        assert_eq!(coarse.lod, 2);
    }

    #[test]
    fn test_progress_reaches_done() {
        let desc = BranchDescriptor::trunk_only(0.5, 0.3);
        let mut fractions = Vec::new();
        let mut reporter = |_: &str, f: f32| fractions.push(f);
        TreeGenerator::new(sequential()).generate(&desc, &mut reporter).unwrap();
        assert_eq!(fractions.first(), Some(&0.0));
        assert_eq!(fractions.last(), Some(&1.0));
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_invalid_descriptor_fails() {
        let mut desc = BranchDescriptor::default();
        desc.active_levels = desc.levels.len() + 1;
        let result = TreeGenerator::new(sequential()).generate(&desc, &mut NoProgress);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_disabled_group_places_nothing() {
        let mut desc = BranchDescriptor::default();
        desc.sprouts.iter_mut().for_each(|s| s.enabled = false);
        let tree = TreeGenerator::new(sequential()).generate(&desc, &mut NoProgress).unwrap();
        assert_eq!(tree.sprout_count, 0);
    }
}
