//! In-memory branch skeleton built from a descriptor
//!
//! Nodes and branches live in flat arenas indexed by `usize`. Branches are
//! stored parents-first, so iterating `branches()` in order always visits a
//! parent before any of its children.

pub mod bender;
pub mod node;

use std::f32::consts::TAU;

use crate::core::types::{Quat, Vec3};
use crate::core::Result;
use crate::math::SimpleRng;
use crate::params::{BranchDescriptor, BranchLevel};

pub use bender::{BendReport, BranchBender};
pub use node::{Attachment, Branch, BranchNode};

/// Golden angle in radians, sibling phase increment around the parent
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Shortest branch the builder will emit
const MIN_BRANCH_LENGTH: f32 = 1e-3;

/// Tree graph for one generation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    nodes: Vec<BranchNode>,
    branches: Vec<Branch>,
}

/// Initial geometry of a branch about to be added
struct BranchPlan {
    level: u32,
    parent: Option<usize>,
    attachment: Option<Attachment>,
    origin: Vec3,
    direction: Vec3,
    length: f32,
    segments: u32,
    base_radius: f32,
    tip_radius: f32,
    is_root: bool,
}

impl Skeleton {
    /// Validate `descriptor` and instantiate its trunk, active levels and roots
    pub fn build(descriptor: &BranchDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let mut rng = SimpleRng::new(descriptor.seed);
        let mut skeleton = Skeleton::default();

        let trunk = &descriptor.trunk;
        let trunk_length = trunk.length.sample(&mut rng);
        let segments = trunk.segments;
        skeleton.add_trunk(trunk_length, segments, |t| trunk.girth_at(t));

        let mut parents = vec![0usize];
        for (i, level) in descriptor.levels.iter().take(descriptor.active_levels).enumerate() {
            if !level.enabled {
                break;
            }
            let mut spawned = Vec::new();
            for &parent in &parents {
                let count = rng.int_range(level.min_frequency, level.max_frequency);
                for slot in 0..count {
                    let along = spawn_position(level, slot, count, &mut rng);
                    let child = skeleton.spawn_child(parent, level, i as u32 + 1, along, slot, &mut rng);
                    spawned.push(child);
                }
            }
            parents = spawned;
        }

        if let Some(roots) = descriptor.roots.as_ref().filter(|r| r.enabled) {
            let count = rng.int_range(roots.min_frequency, roots.max_frequency);
            for slot in 0..count {
                skeleton.spawn_root(roots, slot, count, &mut rng);
            }
        }

        skeleton.compute_depths();
        log::debug!(
            "Skeleton built: {} branches, {} nodes, {} roots",
            skeleton.branches.len(),
            skeleton.nodes.len(),
            skeleton.root_branches().count()
        );
        Ok(skeleton)
    }

    pub fn nodes(&self) -> &[BranchNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&BranchNode> {
        self.nodes.get(index)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn branch(&self, index: usize) -> Option<&Branch> {
        self.branches.get(index)
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// The trunk is always branch 0
    pub fn trunk(&self) -> &Branch {
        &self.branches[0]
    }

    pub fn root_branches(&self) -> impl Iterator<Item = (usize, &Branch)> {
        self.branches.iter().enumerate().filter(|(_, b)| b.is_root)
    }

    /// Non-root branches at hierarchy `level`
    pub fn branches_at_level(&self, level: u32) -> impl Iterator<Item = (usize, &Branch)> {
        self.branches
            .iter()
            .enumerate()
            .filter(move |(_, b)| !b.is_root && b.level == level)
    }

    /// Deepest non-root level present
    pub fn max_level(&self) -> u32 {
        self.branches.iter().filter(|b| !b.is_root).map(|b| b.level).max().unwrap_or(0)
    }

    /// World position of a branch's attach point from current node positions
    pub fn attach_point(&self, attachment: &Attachment) -> Vec3 {
        let a = self.nodes[attachment.node].position;
        match attachment.next {
            Some(next) => a.lerp(self.nodes[next].position, attachment.fraction),
            None => a,
        }
    }

    /// Position and direction at normalized `along` on `branch`, plus the radius there
    pub fn sample_branch(&self, branch: usize, along: f32) -> (Vec3, Vec3, f32) {
        let b = &self.branches[branch];
        let att = locate(b, along);
        let n0 = &self.nodes[att.node];
        match att.next {
            Some(next) => {
                let n1 = &self.nodes[next];
                (
                    n0.position.lerp(n1.position, att.fraction),
                    n0.direction,
                    n0.radius + (n1.radius - n0.radius) * att.fraction,
                )
            }
            None => (n0.position, n0.direction, n0.radius),
        }
    }

    /// Normalized tree depth at `along` on `branch`
    pub fn depth_at(&self, branch: usize, along: f32) -> f32 {
        let att = locate(&self.branches[branch], along);
        let d0 = self.nodes[att.node].depth;
        match att.next {
            Some(next) => d0 + (self.nodes[next].depth - d0) * att.fraction,
            None => d0,
        }
    }

    fn add_trunk(&mut self, length: f32, segments: u32, girth: impl Fn(f32) -> f32) {
        let base = girth(0.0);
        let tip = girth(1.0);
        let index = self.add_branch(BranchPlan {
            level: 0,
            parent: None,
            attachment: None,
            origin: Vec3::ZERO,
            direction: Vec3::Y,
            length,
            segments,
            base_radius: base,
            tip_radius: tip,
            is_root: false,
        });
        // Trunk radius follows the girth curve, not a straight taper
        let nodes = self.branches[index].nodes.clone();
        for (k, &n) in nodes.iter().enumerate() {
            self.nodes[n].radius = girth(k as f32 / segments as f32);
        }
    }

    fn spawn_child(
        &mut self,
        parent: usize,
        level: &BranchLevel,
        level_index: u32,
        along: f32,
        slot: u32,
        rng: &mut SimpleRng,
    ) -> usize {
        let attachment = locate(&self.branches[parent], along);
        let (origin, parent_dir, parent_radius) = self.sample_branch(parent, along);

        let angle = level
            .alignment_curve
            .lerp(level.alignment_at_base.sample(rng), level.alignment_at_top.sample(rng), along)
            .to_radians();
        let phase = slot as f32 * GOLDEN_ANGLE + rng.range(-0.3, 0.3);
        let direction = tilt(parent_dir, phase, angle);

        let length = level
            .length_curve
            .lerp(level.length_at_base.sample(rng), level.length_at_top.sample(rng), along)
            .max(MIN_BRANCH_LENGTH);
        let base_radius = parent_radius * level.girth_scale.sample(rng);

        let index = self.add_branch(BranchPlan {
            level: level_index,
            parent: Some(parent),
            attachment: Some(attachment),
            origin,
            direction,
            length,
            segments: level.segments,
            base_radius,
            tip_radius: base_radius * level.tip_girth,
            is_root: false,
        });
        self.branches[parent].children.push(index);
        index
    }

    fn spawn_root(&mut self, roots: &BranchLevel, slot: u32, count: u32, rng: &mut SimpleRng) {
        let jitter = rng.signed() * roots.spacing_variance * 0.5;
        let azimuth = (slot as f32 + 0.5 + jitter) / count as f32 * TAU;
        let dip = roots.alignment_at_base.sample(rng).to_radians();
        let outward = Vec3::new(azimuth.cos(), 0.0, azimuth.sin());
        let direction = (outward * dip.cos() - Vec3::Y * dip.sin()).normalize_or(outward);

        let trunk_base = self.trunk().base_node();
        let base_radius = self.nodes[trunk_base].radius * roots.girth_scale.sample(rng);
        let length = roots.length_at_base.sample(rng).max(MIN_BRANCH_LENGTH);

        let index = self.add_branch(BranchPlan {
            level: 1,
            parent: Some(0),
            attachment: Some(Attachment { node: trunk_base, next: None, fraction: 0.0, along: 0.0 }),
            origin: self.nodes[trunk_base].position,
            direction,
            length,
            segments: roots.segments,
            base_radius,
            tip_radius: base_radius * roots.tip_girth,
            is_root: true,
        });
        self.branches[0].children.push(index);
    }

    fn add_branch(&mut self, plan: BranchPlan) -> usize {
        let branch_index = self.branches.len();
        let segment_length = plan.length / plan.segments as f32;
        let mut node_indices = Vec::with_capacity(plan.segments as usize + 1);
        let mut previous = plan.attachment.map(|a| a.node);

        for k in 0..=plan.segments {
            let t = k as f32 / plan.segments as f32;
            let index = self.nodes.len();
            self.nodes.push(BranchNode {
                position: plan.origin + plan.direction * segment_length * k as f32,
                direction: plan.direction,
                radius: plan.base_radius + (plan.tip_radius - plan.base_radius) * t,
                level: plan.level,
                branch: branch_index,
                parent: previous,
                children: Vec::new(),
                branch_position: t,
                depth: 0.0,
                is_root: plan.is_root,
            });
            if let Some(p) = previous {
                self.nodes[p].children.push(index);
            }
            node_indices.push(index);
            previous = Some(index);
        }

        self.branches.push(Branch {
            level: plan.level,
            nodes: node_indices,
            parent: plan.parent,
            attachment: plan.attachment,
            children: Vec::new(),
            length: plan.length,
            segment_length,
            is_root: plan.is_root,
        });
        branch_index
    }

    /// Normalized path depth; nodes are stored after their parents
    fn compute_depths(&mut self) {
        let mut path = vec![0.0f32; self.nodes.len()];
        for i in 0..self.nodes.len() {
            if let Some(p) = self.nodes[i].parent {
                path[i] = path[p] + self.nodes[i].position.distance(self.nodes[p].position);
            }
        }
        let max_of = |roots: bool| {
            self.nodes
                .iter()
                .zip(&path)
                .filter(|(n, _)| n.is_root == roots)
                .map(|(_, d)| *d)
                .fold(0.0f32, f32::max)
        };
        let max_tree = max_of(false);
        let max_roots = max_of(true);
        for (node, d) in self.nodes.iter_mut().zip(path) {
            let max = if node.is_root { max_roots } else { max_tree };
            node.depth = if max > 0.0 { (d / max).clamp(0.0, 1.0) } else { 0.0 };
        }
    }
}

/// Evenly spaced slot remapped by the distribution curve, jittered, mapped into range
fn spawn_position(level: &BranchLevel, slot: u32, count: u32, rng: &mut SimpleRng) -> f32 {
    let spacing = 1.0 / count as f32;
    let base = (slot as f32 + 0.5) * spacing;
    let biased = level.distribution_curve.evaluate(base);
    let jitter = rng.signed() * level.spacing_variance * spacing * 0.5;
    let u = (biased + jitter).clamp(0.0, 1.0);
    level.range.lerp(u)
}

/// Attach record for normalized `along` on `branch`
fn locate(branch: &Branch, along: f32) -> Attachment {
    let segments = branch.nodes.len() - 1;
    let scaled = along.clamp(0.0, 1.0) * segments as f32;
    let k = (scaled.floor() as usize).min(segments);
    if k == segments {
        return Attachment { node: branch.nodes[k], next: None, fraction: 0.0, along };
    }
    Attachment {
        node: branch.nodes[k],
        next: Some(branch.nodes[k + 1]),
        fraction: scaled - k as f32,
        along,
    }
}

/// Rotate `parent` away from itself by `angle`, around an axis turned by `phase`
fn tilt(parent: Vec3, phase: f32, angle: f32) -> Vec3 {
    let reference = parent.any_orthonormal_vector();
    let side = Quat::from_axis_angle(parent, phase) * reference;
    let axis = parent.cross(side).normalize_or(reference);
    (Quat::from_axis_angle(axis, angle) * parent).normalize_or(parent)
}
