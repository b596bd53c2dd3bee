//! Snapshots: per-LOD fragment capture of a tree's sprout groups

use crate::core::{Error, NoProgress, ProgressReporter, Result};
use crate::generation::{GenerationConfig, TreeGenerator};
use crate::params::BranchDescriptor;
use crate::polygon::{CutPlane, Fragment, PolygonArea, PolygonAreaCache};

/// A descriptor plus the planes to capture it from
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: u32,
    pub descriptor: BranchDescriptor,
    /// Capture planes; empty means the default side plane
    pub planes: Vec<CutPlane>,
    pub lod_count: usize,
}

impl Snapshot {
    pub fn new(id: u32, descriptor: BranchDescriptor) -> Self {
        Self { id, descriptor, planes: vec![CutPlane::default()], lod_count: 1 }
    }

    pub fn with_planes(mut self, planes: Vec<CutPlane>) -> Self {
        self.planes = planes;
        self
    }

    pub fn with_lods(mut self, lod_count: usize) -> Self {
        self.lod_count = lod_count;
        self
    }
}

/// Areas captured at one LOD, one per (sprout group, plane)
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLod {
    pub lod: usize,
    pub resolution_scale: f32,
    pub areas: Vec<PolygonArea>,
}

pub struct SnapshotProcessor {
    generator: TreeGenerator,
}

impl SnapshotProcessor {
    pub fn new(config: GenerationConfig) -> Self {
        Self { generator: TreeGenerator::new(config) }
    }

    /// Generate every LOD of the snapshot and extract its fragments through `cache`
    pub fn process(
        &self,
        snapshot: &Snapshot,
        cache: &mut PolygonAreaCache,
        progress: &mut impl ProgressReporter,
    ) -> Result<Vec<SnapshotLod>> {
        if snapshot.lod_count == 0 {
            return Err(Error::validation(format!("snapshot {} has no LODs", snapshot.id)));
        }
        let default_planes = [CutPlane::default()];
        let planes: &[CutPlane] = if snapshot.planes.is_empty() { &default_planes } else { &snapshot.planes };
        let groups: Vec<u32> = snapshot
            .descriptor
            .sprouts
            .iter()
            .filter(|s| s.enabled)
            .map(|s| s.group_id)
            .collect();

        let total = (snapshot.lod_count * groups.len().max(1) * planes.len()) as f32;
        let mut done = 0usize;
        let mut lods = Vec::with_capacity(snapshot.lod_count);
        for lod in 0..snapshot.lod_count {
            progress.report(&format!("Snapshot {} LOD {}", snapshot.id, lod), done as f32 / total);
            let tree = self.generator.generate_lod(&snapshot.descriptor, lod, &mut NoProgress)?;

            let mut areas = Vec::with_capacity(groups.len() * planes.len());
            for &group in &groups {
                for (p, plane) in planes.iter().enumerate() {
                    let mut fragment = Fragment::new(format!("snapshot{}_lod{}_group{}_plane{}", snapshot.id, lod, group, p))
                        .include(group)
                        .with_plane(*plane)
                        .with_lod(lod);
                    for &other in groups.iter().filter(|&&g| g != group) {
                        fragment = fragment.exclude(other);
                    }
                    areas.push(cache.get_or_extract(&tree.sprouts, &fragment).clone());
                    done += 1;
                    progress.report(&format!("Snapshot {} LOD {}", snapshot.id, lod), done as f32 / total);
                }
            }
            lods.push(SnapshotLod {
                lod,
                resolution_scale: self.generator.config().lod_scale(lod),
                areas,
            });
        }
        log::debug!(
            "Snapshot {}: {} LODs, cache {} hits / {} misses",
            snapshot.id,
            lods.len(),
            cache.hits(),
            cache.misses()
        );
        Ok(lods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SproutDescriptor;

    fn two_groups() -> BranchDescriptor {
        let mut desc = BranchDescriptor::default();
        let second = SproutDescriptor { group_id: 1, style_id: None, ..desc.sprouts[0].clone() };
        desc.sprouts.push(second);
        desc
    }

    fn config() -> GenerationConfig {
        GenerationConfig { parallel_sprouts: false, ..Default::default() }
    }

    #[test]
    fn test_one_area_per_group_and_plane() {
        let snapshot = Snapshot::new(7, two_groups())
            .with_planes(vec![CutPlane::side(), CutPlane::front()])
            .with_lods(2);
        let mut cache = PolygonAreaCache::new();
        let lods = SnapshotProcessor::new(config()).process(&snapshot, &mut cache, &mut NoProgress).unwrap();
        assert_eq!(lods.len(), 2);
        for (lod, captured) in lods.iter().enumerate() {
            assert_eq!(captured.lod, lod);
            assert_eq!(captured.areas.len(), 4);
            assert!(captured.areas.iter().all(|a| a.lod == lod && !a.is_empty()));
        }
        assert_eq!(lods[1].resolution_scale, 0.5);
    }

    #[test]
    fn test_second_run_hits_cache() {
        let snapshot = Snapshot::new(1, BranchDescriptor::default());
        let processor = SnapshotProcessor::new(config());
        let mut cache = PolygonAreaCache::new();
        let first = processor.process(&snapshot, &mut cache, &mut NoProgress).unwrap();
        let misses = cache.misses();
        let second = processor.process(&snapshot, &mut cache, &mut NoProgress).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.misses(), misses);
        assert!(cache.hits() >= first[0].areas.len());
    }

    #[test]
    fn test_zero_lods_rejected() {
        let snapshot = Snapshot::new(1, BranchDescriptor::default()).with_lods(0);
        let result = SnapshotProcessor::new(config()).process(&snapshot, &mut PolygonAreaCache::new(), &mut NoProgress);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_progress_is_monotonic() {
        let snapshot = Snapshot::new(1, BranchDescriptor::default()).with_lods(2);
        let mut fractions = Vec::new();
        let mut reporter = |_: &str, f: f32| fractions.push(f);
        SnapshotProcessor::new(config())
            .process(&snapshot, &mut PolygonAreaCache::new(), &mut reporter)
            .unwrap();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last(), Some(&1.0));
    }
}
