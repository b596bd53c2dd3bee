//! Trunk mesh: tapered ring extrusion with root crests flaring the base

use std::f32::consts::{PI, TAU};

use crate::core::Warning;
use crate::math::{lerp, smoothstep, SimpleRng};
use crate::mesh::tube::{connect_rings, push_ring, transport_frames, Backbone};
use crate::mesh::MeshData;
use crate::params::{BranchDescriptor, IntegrationMode};
use crate::skeleton::Skeleton;

/// Element id written to trunk triangles
pub const TRUNK_ELEMENT_ID: u32 = 0;

const CREST_STREAM: u64 = 0xc4e5_7000;

/// Fraction of a crest's length over which it tapers to zero at its end
const CREST_TAIL: f32 = 0.1;

/// One buttress ridge running up from the trunk base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crest {
    /// Ring angle of the ridge at the base, radians in the base frame
    pub azimuth: f32,
    /// Vertical extent as a fraction of trunk height
    pub length: f32,
    pub exposure_at_base: f32,
    pub exposure_at_top: f32,
    pub scale_at_base: f32,
    pub scale_at_top: f32,
    /// Angular half-width of the ridge's falloff
    pub half_width: f32,
    /// Turns of twist over the ridge's length
    pub twirl: f32,
}

impl Crest {
    /// Outward displacement as a fraction of the ring radius at height `t`, angle `theta`
    pub fn displacement(&self, t: f32, theta: f32) -> f32 {
        if self.length <= 0.0 || self.half_width <= 0.0 {
            return 0.0;
        }
        let s = t / self.length;
        if !(0.0..1.0).contains(&s) {
            return 0.0;
        }
        let center = self.azimuth + self.twirl * TAU * s;
        let a = wrap_angle(theta - center).abs() / self.half_width;
        if a >= 1.0 {
            return 0.0;
        }
        let exposure = lerp(self.exposure_at_base, self.exposure_at_top, s);
        let scale = lerp(self.scale_at_base, self.scale_at_top, s);
        let tail = 1.0 - smoothstep((s - (1.0 - CREST_TAIL)) / CREST_TAIL);
        exposure * scale * tail * (1.0 - smoothstep(a))
    }
}

/// Wrap an angle into `[-PI, PI]`
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Builds the trunk surface for a (possibly bent) skeleton
pub struct TrunkMeshBuilder<'a> {
    descriptor: &'a BranchDescriptor,
    resolution_scale: f32,
}

impl<'a> TrunkMeshBuilder<'a> {
    pub fn new(descriptor: &'a BranchDescriptor) -> Self {
        Self { descriptor, resolution_scale: 1.0 }
    }

    /// Scale both segment counts, used for coarser LODs
    pub fn with_resolution_scale(mut self, scale: f32) -> Self {
        self.resolution_scale = scale.max(0.0);
        self
    }

    pub fn radial_segments(&self) -> u32 {
        let base = self.descriptor.trunk_mesh.radial_segments() as f32;
        ((base * self.resolution_scale).round() as u32).max(3)
    }

    pub fn length_segments(&self) -> u32 {
        let base = self.descriptor.trunk_mesh.length_segments() as f32;
        ((base * self.resolution_scale).round() as u32).max(1)
    }

    /// Tapered radius before crest displacement at normalized height `t`
    pub fn ring_radius(&self, t: f32) -> f32 {
        self.descriptor.trunk.girth_at(t) * self.descriptor.trunk_mesh.trunk_scale_at(t)
    }

    /// Crests for the configured integration mode
    pub fn crests(&self, skeleton: &Skeleton) -> Vec<Crest> {
        let params = &self.descriptor.trunk_mesh;
        let mut rng = SimpleRng::derive(self.descriptor.seed, CREST_STREAM, 0);

        match params.integration_mode {
            IntegrationMode::None => Vec::new(),
            IntegrationMode::SimulateRoots => {
                let count = rng.int_range(params.min_roots_count, params.max_roots_count);
                if count == 0 {
                    return Vec::new();
                }
                let slot = TAU / count as f32;
                (0..count)
                    .map(|k| {
                        let jitter = rng.signed() * params.angle_variance * 0.5 * slot;
                        let spread = rng.range(params.min_spread, params.max_spread.max(params.min_spread));
                        Crest {
                            azimuth: k as f32 * slot + jitter,
                            length: spread.min(params.root_reach),
                            exposure_at_base: params.root_exposure_at_base.sample(&mut rng),
                            exposure_at_top: params.root_exposure_at_top.sample(&mut rng),
                            scale_at_base: params.root_scale_at_base.sample(&mut rng),
                            scale_at_top: params.root_scale_at_top.sample(&mut rng),
                            half_width: slot * 0.5,
                            twirl: params.twirl,
                        }
                    })
                    .collect()
            }
            IntegrationMode::Adaptative => self.adaptive_crests(skeleton, &mut rng),
        }
    }

    fn adaptive_crests(&self, skeleton: &Skeleton, rng: &mut SimpleRng) -> Vec<Crest> {
        let params = &self.descriptor.trunk_mesh;
        let roots: Vec<_> = skeleton.root_branches().map(|(_, b)| b).collect();
        if roots.is_empty() {
            Warning::MissingRoots.emit();
            return Vec::new();
        }

        let trunk = skeleton.trunk();
        let trunk_base = &skeleton.nodes()[trunk.base_node()];
        let backbone = self.backbone(skeleton);
        let (_, base_tangent) = backbone.sample(0.0);
        let base_frame = transport_frames(&[base_tangent])[0].inverse();
        let trunk_length = backbone.length().max(f32::EPSILON);
        let half_width = PI / roots.len() as f32;

        roots
            .iter()
            .map(|root| {
                let base = &skeleton.nodes()[root.base_node()];
                let heading = match root.nodes.get(1) {
                    Some(&n) => skeleton.nodes()[n].position - base.position,
                    None => base.direction,
                };
                let local = base_frame * heading;
                let girth_ratio = if trunk_base.radius > 0.0 { base.radius / trunk_base.radius } else { 1.0 };
                Crest {
                    azimuth: local.z.atan2(local.x),
                    length: (root.length / trunk_length).min(params.root_reach),
                    exposure_at_base: params.root_exposure_at_base.sample(rng),
                    exposure_at_top: params.root_exposure_at_top.sample(rng),
                    scale_at_base: params.root_scale_at_base.sample(rng) * girth_ratio,
                    scale_at_top: params.root_scale_at_top.sample(rng) * girth_ratio,
                    half_width,
                    twirl: params.twirl,
                }
            })
            .collect()
    }

    fn backbone(&self, skeleton: &Skeleton) -> Backbone {
        Backbone::new(skeleton.trunk().nodes.iter().map(|&n| skeleton.nodes()[n].position))
    }

    pub fn build(&self, skeleton: &Skeleton) -> MeshData {
        let radial = self.radial_segments();
        let sections = self.length_segments();
        let crests = self.crests(skeleton);
        let backbone = self.backbone(skeleton);

        let samples: Vec<_> = (0..=sections).map(|i| backbone.sample(i as f32 / sections as f32)).collect();
        let tangents: Vec<_> = samples.iter().map(|&(_, t)| t).collect();
        let frames = transport_frames(&tangents);

        let mut mesh = MeshData::with_capacity(
            (radial * (sections + 1)) as usize,
            (radial * sections * 2) as usize,
        );
        let mut displaced = false;
        let mut previous = None;
        for (i, (&(center, _), &rotation)) in samples.iter().zip(&frames).enumerate() {
            let t = i as f32 / sections as f32;
            let ring_radius = self.ring_radius(t);
            let ring = push_ring(&mut mesh, center, rotation, radial, t, |_, theta| {
                let flare = crests
                    .iter()
                    .map(|c| c.displacement(t, theta))
                    .fold(0.0f32, f32::max);
                ring_radius * (1.0 + flare)
            });
            if let Some(bottom) = previous {
                connect_rings(&mut mesh, bottom, ring, radial, TRUNK_ELEMENT_ID);
            }
            previous = Some(ring);
            displaced |= crests.iter().any(|c| t < c.length);
        }

        if displaced {
            mesh.recompute_normals();
        }
        log::debug!(
            "Trunk mesh: {} vertices, {} triangles, {} crests",
            mesh.vertex_count(),
            mesh.triangle_count(),
            crests.len()
        );
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::params::MinMax;
    use crate::skeleton::BranchBender;

    fn scenario(mode: IntegrationMode) -> BranchDescriptor {
        let mut desc = BranchDescriptor::trunk_only(0.5, 0.3);
        desc.trunk_mesh.base_radial_segments = 8;
        desc.trunk_mesh.base_length_segments = 4;
        desc.trunk_mesh.integration_mode = mode;
        desc
    }

    fn radial_distance(p: Vec3, center_y: f32) -> f32 {
        (p - Vec3::new(0.0, center_y, 0.0)).length()
    }

    #[test]
    fn test_plain_cylinder_counts_and_taper() {
        let desc = scenario(IntegrationMode::None);
        let skel = Skeleton::build(&desc).unwrap();
        let mesh = TrunkMeshBuilder::new(&desc).build(&skel);
        assert_eq!(mesh.vertex_count(), 40);
        assert_eq!(mesh.triangle_count(), 64);
        assert!(mesh.is_consistent());
        for p in &mesh.positions[0..8] {
            assert!((radial_distance(*p, 0.0) - 0.5).abs() < 1e-5);
        }
        for p in &mesh.positions[32..40] {
            assert!((radial_distance(*p, 4.0) - 0.3).abs() < 1e-5);
        }
    }

    #[test]
    fn test_simulated_crests_flare_base_only() {
        let mut desc = scenario(IntegrationMode::SimulateRoots);
        let tm = &mut desc.trunk_mesh;
        tm.min_roots_count = 4;
        tm.max_roots_count = 4;
        tm.angle_variance = 0.0;
        tm.twirl = 0.0;
        tm.min_spread = 0.2;
        tm.max_spread = 0.2;
        tm.root_reach = 0.25;
        tm.root_exposure_at_base = MinMax::fixed(0.5);
        tm.root_exposure_at_top = MinMax::fixed(0.5);
        tm.root_scale_at_base = MinMax::fixed(1.0);
        tm.root_scale_at_top = MinMax::fixed(1.0);

        let skel = Skeleton::build(&desc).unwrap();
        let builder = TrunkMeshBuilder::new(&desc);
        assert_eq!(builder.crests(&skel).len(), 4);
        let mesh = builder.build(&skel);

        // Crests sit on every second base vertex
        for (j, p) in mesh.positions[0..8].iter().enumerate() {
            let expected = if j % 2 == 0 { 0.5 * (1.0 + 0.5) } else { 0.5 };
            assert!((radial_distance(*p, 0.0) - expected).abs() < 1e-4, "vertex {}", j);
        }
        // Rings at t >= 0.25 are beyond the crests' reach
        for ring in 1..5 {
            let t = ring as f32 / 4.0;
            let radius = builder.ring_radius(t);
            for p in &mesh.positions[ring * 8..ring * 8 + 8] {
                assert!((radial_distance(*p, t * 4.0) - radius).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_none_mode_never_exceeds_taper() {
        let mut desc = BranchDescriptor::default();
        desc.trunk_mesh.integration_mode = IntegrationMode::None;
        let mut skel = Skeleton::build(&desc).unwrap();
        BranchBender::new(&desc.bending, desc.seed).bend(&mut skel);
        let builder = TrunkMeshBuilder::new(&desc);
        let mesh = builder.build(&skel);
        let radial = builder.radial_segments() as usize;
        let sections = builder.length_segments() as usize;
        for i in 0..=sections {
            let ring = &mesh.positions[i * radial..(i + 1) * radial];
            let center = ring.iter().copied().sum::<Vec3>() / radial as f32;
            let radius = builder.ring_radius(i as f32 / sections as f32);
            for p in ring {
                assert!(p.distance(center) <= radius + 1e-4);
            }
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let desc = BranchDescriptor::default();
        let build = || {
            let mut skel = Skeleton::build(&desc).unwrap();
            BranchBender::new(&desc.bending, desc.seed).bend(&mut skel);
            TrunkMeshBuilder::new(&desc).build(&skel)
        };
        let (a, b) = (build(), build());
        assert_eq!(a, b);
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_adaptive_crest_per_root() {
        let mut desc = BranchDescriptor::default();
        desc.trunk_mesh.integration_mode = IntegrationMode::Adaptative;
        let skel = Skeleton::build(&desc).unwrap();
        let crests = TrunkMeshBuilder::new(&desc).crests(&skel);
        let roots: Vec<_> = skel.root_branches().collect();
        assert!(!roots.is_empty());
        assert_eq!(crests.len(), roots.len());
        for (crest, (_, root)) in crests.iter().zip(&roots) {
            let dir = skel.nodes()[root.base_node()].direction;
            let expected = dir.z.atan2(dir.x);
            assert!(wrap_angle(crest.azimuth - expected).abs() < 1e-3);
            assert!(crest.length <= desc.trunk_mesh.root_reach + 1e-6);
        }
    }

    #[test]
    fn test_adaptive_without_roots_is_plain() {
        let desc = scenario(IntegrationMode::Adaptative);
        let skel = Skeleton::build(&desc).unwrap();
        assert!(TrunkMeshBuilder::new(&desc).crests(&skel).is_empty());
    }

    #[test]
    fn test_crest_falloff() {
        let crest = Crest {
            azimuth: 0.0,
            length: 0.5,
            exposure_at_base: 1.0,
            exposure_at_top: 1.0,
            scale_at_base: 1.0,
            scale_at_top: 1.0,
            half_width: PI / 4.0,
            twirl: 0.0,
        };
        assert_eq!(crest.displacement(0.0, 0.0), 1.0);
        assert_eq!(crest.displacement(0.5, 0.0), 0.0);
        assert_eq!(crest.displacement(0.0, PI / 4.0), 0.0);
        assert_eq!(crest.displacement(0.25, 0.0), 1.0);
        let near_end = crest.displacement(0.49, 0.0);
        assert!(near_end > 0.0 && near_end < 1.0);
        // Wraps across the ring seam
        assert!((crest.displacement(0.0, TAU - 0.1) - crest.displacement(0.0, 0.1)).abs() < 1e-5);
    }

    #[test]
    fn test_mid_crest_applies_lerped_exposure() {
        let mut crest = Crest {
            azimuth: 0.0,
            length: 0.5,
            exposure_at_base: 0.5,
            exposure_at_top: 0.5,
            scale_at_base: 1.0,
            scale_at_top: 1.0,
            half_width: PI,
            twirl: 0.0,
        };
        assert!((crest.displacement(0.25, 0.0) - 0.5).abs() < 1e-6);
        assert!((crest.displacement(0.4, 0.0) - 0.5).abs() < 1e-6);

        crest.exposure_at_base = 0.0;
        crest.exposure_at_top = 1.0;
        assert!((crest.displacement(0.25, 0.0) - 0.5).abs() < 1e-6);
        assert!((crest.displacement(0.4, 0.0) - 0.8).abs() < 1e-6);
        assert!(crest.displacement(0.4, 0.0) > crest.displacement(0.1, 0.0));
    }

    #[test]
    fn test_resolution_scale() {
        let desc = scenario(IntegrationMode::None);
        let builder = TrunkMeshBuilder::new(&desc).with_resolution_scale(0.5);
        assert_eq!(builder.radial_segments(), 4);
        assert_eq!(builder.length_segments(), 2);
        let coarse = TrunkMeshBuilder::new(&desc).with_resolution_scale(0.1);
        assert_eq!(coarse.radial_segments(), 3);
        assert_eq!(coarse.length_segments(), 1);
    }
}
