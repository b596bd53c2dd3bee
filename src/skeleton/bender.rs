//! Skeleton deformation: directional bending, joint smoothing, noise
//!
//! Stages only rewrite node directions; positions are re-integrated once at
//! the end, branch by branch in parent-first order, so every child stays
//! attached to its (already deformed) parent. Noise displacement happens
//! during that integration.

use crate::core::types::Vec3;
use crate::core::Warning;
use crate::math::SimpleRng;
use crate::params::BendingParams;
use crate::procgen::NoiseField;
use crate::skeleton::Skeleton;

/// Counters from one bend pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BendReport {
    pub bent_nodes: usize,
    pub smoothed_nodes: usize,
    pub displaced_nodes: usize,
    /// Nodes left unbent because a stage produced a zero-length direction
    pub degenerate_directions: usize,
}

/// Pull toward a target direction, optionally with alignment sub-terms
struct DirectionalStage {
    target: Vec3,
    force_at_base: f32,
    force_at_tips: f32,
    alignment: bool,
}

/// Applies [`BendingParams`] to a skeleton
pub struct BranchBender<'a> {
    params: &'a BendingParams,
    noise: NoiseField,
    noise_offset: Vec3,
}

impl<'a> BranchBender<'a> {
    pub fn new(params: &'a BendingParams, seed: u64) -> Self {
        let noise_offset = if params.has_random_noise_offset {
            let mut rng = SimpleRng::derive(seed, 0xbe4d, 0);
            Vec3::new(rng.range(-1000.0, 1000.0), rng.range(-1000.0, 1000.0), rng.range(-1000.0, 1000.0))
        } else {
            Vec3::ZERO
        };
        Self {
            params,
            noise: NoiseField::new((seed ^ (seed >> 32)) as u32),
            noise_offset,
        }
    }

    /// Run all enabled stages, then the root mirror pass
    pub fn bend(&self, skeleton: &mut Skeleton) -> BendReport {
        let p = self.params;
        let mut report = BendReport::default();
        if !p.apply_directional_bending && !p.apply_joint_smoothing && !p.apply_noise {
            return report;
        }

        let (roots, main): (Vec<usize>, Vec<usize>) =
            (0..skeleton.branch_count()).partition(|&b| skeleton.branches[b].is_root);

        if p.apply_directional_bending {
            let stage = DirectionalStage {
                target: p.direction,
                force_at_base: p.force_at_trunk,
                force_at_tips: p.force_at_tips,
                alignment: true,
            };
            self.bend_directions(skeleton, &main, &stage, &mut report);
        }
        if p.apply_joint_smoothing {
            self.smooth_joints(skeleton, &main, p.smooth_joint_strength, &mut report);
        }

        if !roots.is_empty() {
            if p.apply_directional_bending {
                let stage = DirectionalStage {
                    target: p.root_direction,
                    force_at_base: p.root_direction_strength,
                    force_at_tips: p.root_direction_strength,
                    alignment: false,
                };
                self.bend_directions(skeleton, &roots, &stage, &mut report);
            }
            if p.apply_joint_smoothing {
                self.smooth_joints(skeleton, &roots, p.smooth_root_joint_strength, &mut report);
            }
        }

        self.integrate(skeleton, &mut report);
        log::debug!(
            "Bend pass: {} bent, {} smoothed, {} displaced, {} degenerate",
            report.bent_nodes, report.smoothed_nodes, report.displaced_nodes, report.degenerate_directions
        );
        report
    }

    fn bend_directions(
        &self,
        skeleton: &mut Skeleton,
        branches: &[usize],
        stage: &DirectionalStage,
        report: &mut BendReport,
    ) {
        let Some(target) = stage.target.try_normalize() else {
            log::warn!("bend target direction is zero, directional stage skipped");
            return;
        };
        let p = self.params;

        for &b in branches {
            for k in 0..skeleton.branches[b].nodes.len() {
                let n = skeleton.branches[b].nodes[k];
                let node = &skeleton.nodes[n];
                let t = node.depth;
                let strength = p.hierarchy_distribution_curve.lerp(stage.force_at_base, stage.force_at_tips, t);

                let Some(mut dir) = node.direction.lerp(target, strength).try_normalize() else {
                    Warning::ZeroLengthDirection { node: n }.emit();
                    report.degenerate_directions += 1;
                    continue;
                };

                if stage.alignment {
                    let horizontal = p.horizontal_align_curve
                        .lerp(p.horizontal_align_at_base, p.horizontal_align_at_top, t)
                        * p.horizontal_align_strength;
                    // A vertical direction has no horizontal projection; leave it
                    if horizontal > 0.0 {
                        if let Some(flat) = Vec3::new(dir.x, 0.0, dir.z).try_normalize() {
                            dir = dir.lerp(flat, horizontal).try_normalize().unwrap_or(dir);
                        }
                    }
                    let vertical = p.vertical_align_curve
                        .lerp(p.vertical_align_at_base, p.vertical_align_at_top, t)
                        * p.vertical_align_strength;
                    if vertical > 0.0 {
                        dir = dir.lerp(Vec3::Y, vertical).try_normalize().unwrap_or(dir);
                    }
                }

                skeleton.nodes[n].direction = dir;
                report.bent_nodes += 1;
            }
        }
    }

    /// Jacobi relaxation of each direction toward its run neighbours.
    ///
    /// A branch's first node sees its attach node as the previous neighbour,
    /// which is what smooths the joint.
    fn smooth_joints(&self, skeleton: &mut Skeleton, branches: &[usize], strength: f32, report: &mut BendReport) {
        if strength <= 0.0 {
            return;
        }
        for _ in 0..self.params.smoothing_iterations {
            let snapshot: Vec<Vec3> = skeleton.nodes.iter().map(|n| n.direction).collect();
            for &b in branches {
                let nodes = &skeleton.branches[b].nodes;
                for (k, &n) in nodes.iter().enumerate() {
                    let prev = skeleton.nodes[n].parent.map(|p| snapshot[p]);
                    let next = nodes.get(k + 1).map(|&m| snapshot[m]);
                    let neighbour = match (prev, next) {
                        (Some(a), Some(b)) => (a + b) * 0.5,
                        (Some(a), None) => a,
                        (None, Some(b)) => b,
                        (None, None) => continue,
                    };
                    match snapshot[n].lerp(neighbour, strength).try_normalize() {
                        Some(dir) => {
                            skeleton.nodes[n].direction = dir;
                            report.smoothed_nodes += 1;
                        }
                        None => {
                            Warning::ZeroLengthDirection { node: n }.emit();
                            report.degenerate_directions += 1;
                        }
                    }
                }
            }
        }
    }

    /// Rebuild positions from directions, adding noise off the first node of each branch
    fn integrate(&self, skeleton: &mut Skeleton, report: &mut BendReport) {
        let p = self.params;
        let resolution = p.noise_type.effective_resolution(p.noise_resolution);

        for b in 0..skeleton.branches.len() {
            let segment_length = skeleton.branches[b].segment_length;
            let is_root = skeleton.branches[b].is_root;
            let nodes = skeleton.branches[b].nodes.clone();
            let mut raw = match skeleton.branches[b].attachment {
                Some(att) => skeleton.attach_point(&att),
                None => skeleton.nodes[nodes[0]].position,
            };

            for (k, &n) in nodes.iter().enumerate() {
                if k > 0 {
                    raw += skeleton.nodes[nodes[k - 1]].direction * segment_length;
                }
                let mut position = raw;
                if p.apply_noise && k > 0 {
                    let node = &skeleton.nodes[n];
                    let t = node.depth;
                    let curve = &p.hierarchy_distribution_curve;
                    let amplitude = if is_root {
                        curve.lerp(p.noise_at_root_base, p.noise_at_root_bottom, t)
                    } else {
                        curve.lerp(p.noise_at_base, p.noise_at_top, t)
                    };
                    if amplitude > 0.0 {
                        let scale = curve.lerp(p.noise_scale_at_base, p.noise_scale_at_top, t);
                        let sample_at = raw * scale + self.noise_offset;
                        let (a, b) = self.noise.sample_pair(p.noise_type, sample_at, resolution);
                        let (u, v) = node.direction.any_orthonormal_pair();
                        let offset = (u * a + v * b) * amplitude;
                        if offset.is_finite() {
                            position += offset;
                            report.displaced_nodes += 1;
                        }
                    }
                }
                skeleton.nodes[n].position = position;
            }
        }
    }
}
