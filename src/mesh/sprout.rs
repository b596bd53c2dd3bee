//! Sprout (leaf card) geometry in sprout-local space.
//!
//! The stem sits at the origin, the sprout grows along +Y and faces +Z. The
//! tree generator places the result on its branch with an affine transform.

use std::f32::consts::FRAC_PI_2;

use glam::EulerRot;

use crate::core::types::{Mat4, Quat, Vec2, Vec3, Vec4};
use crate::math::SimpleRng;
use crate::mesh::data::DEFAULT_TANGENT;
use crate::mesh::MeshData;
use crate::params::{ScaleMode, ShapeMode, SproutDescriptor, SproutMapArea, SproutStyle};
use crate::procgen::NoiseField;

const STYLE_STREAM: u64 = 0x57_11e;

/// Where on the tree one sprout lands, as seen by the mesh builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SproutPlacement {
    /// Normalized depth of the carrying point in the tree
    pub hierarchy: f32,
    /// Normalized position along the carrying branch
    pub branch: f32,
    /// Normalized position inside the group's spawn range
    pub range: f32,
    pub seed: u64,
    /// Unit gravity direction in sprout-local space
    pub gravity: Vec3,
    /// Custom mesh LOD to use, clamped to the available LODs
    pub lod: usize,
}

impl Default for SproutPlacement {
    fn default() -> Self {
        Self {
            hierarchy: 0.0,
            branch: 0.0,
            range: 0.0,
            seed: 0,
            gravity: Vec3::NEG_Y,
            lod: 0,
        }
    }
}

pub struct SproutMeshBuilder<'a> {
    descriptor: &'a SproutDescriptor,
    style: Option<&'a SproutStyle>,
}

impl<'a> SproutMeshBuilder<'a> {
    pub fn new(descriptor: &'a SproutDescriptor) -> Self {
        Self { descriptor, style: None }
    }

    pub fn with_style(mut self, style: Option<&'a SproutStyle>) -> Self {
        self.style = style;
        self
    }

    /// Placement parameter feeding the scale curve
    fn scale_position(&self, placement: &SproutPlacement) -> f32 {
        match self.descriptor.scale_mode {
            ScaleMode::Hierarchy => placement.hierarchy,
            ScaleMode::Branch => placement.branch,
            ScaleMode::Range => placement.range,
        }
    }

    /// Uniform scale after the curve and the optional atlas factor
    pub fn scale(&self, area: &SproutMapArea, placement: &SproutPlacement) -> f32 {
        let d = self.descriptor;
        let mut scale = d.scale_curve.lerp(d.scale_at_base, d.scale_at_top, self.scale_position(placement));
        if d.include_scale_from_atlas {
            scale *= (area.width * area.height).max(0.0).sqrt();
        }
        scale
    }

    /// Unscaled card size `(width, height)`
    pub fn card_size(&self, area: &SproutMapArea) -> Vec2 {
        let d = self.descriptor;
        let height = match area.aspect() {
            Some(aspect) if d.override_height_with_texture && aspect > f32::EPSILON => d.width / aspect,
            _ => d.height,
        };
        Vec2::new(d.width, height)
    }

    pub fn build(&self, area: &SproutMapArea, placement: &SproutPlacement) -> MeshData {
        let d = self.descriptor;
        let scale = self.scale(area, placement);

        let mut mesh = match d.shape_mode {
            ShapeMode::Mesh => self.custom_mesh(placement.lod),
            ShapeMode::PlaneX | ShapeMode::GridPlane | ShapeMode::Cross => {
                let size = self.card_size(area);
                let (mut mesh, heights) = self.card(area, size);
                self.deform(&mut mesh, &heights, size.y, placement);
                mesh
            }
        };

        mesh.transform(&Mat4::from_scale(Vec3::splat(scale)));
        mesh.set_triangle_ids(d.group_id);
        if let Some(style) = self.style {
            let mut rng = SimpleRng::derive(placement.seed, STYLE_STREAM, 0);
            let sample = style.sample(placement.hierarchy, placement.branch, &mut rng);
            let color = sample.color.extend(sample.alpha);
            let material = Vec4::new(sample.metallic, sample.glossiness, sample.subsurface, sample.style_id as f32);
            mesh.colors.iter_mut().for_each(|c| *c = color);
            mesh.uv2.iter_mut().for_each(|m| *m = material);
        }
        mesh
    }

    /// Card geometry plus each vertex's normalized height
    fn card(&self, area: &SproutMapArea, size: Vec2) -> (MeshData, Vec<f32>) {
        let d = self.descriptor;
        let mut mesh = MeshData::new();
        let mut heights = Vec::new();
        match d.shape_mode {
            ShapeMode::PlaneX => {
                grid(&mut mesh, &mut heights, area, size, 2, 1, d.depth * size.x);
            }
            ShapeMode::GridPlane => {
                grid(&mut mesh, &mut heights, area, size, d.resolution_width, d.resolution_height, 0.0);
            }
            ShapeMode::Cross => {
                grid(&mut mesh, &mut heights, area, size, d.resolution_width, d.resolution_height, 0.0);
                let mut second = MeshData::new();
                grid(&mut second, &mut heights, area, size, d.resolution_width, d.resolution_height, 0.0);
                second.transform(&Mat4::from_rotation_y(FRAC_PI_2));
                mesh.append(&second);
            }
            ShapeMode::Mesh => {}
        }
        (mesh, heights)
    }

    fn custom_mesh(&self, lod: usize) -> MeshData {
        let Some(custom) = self.descriptor.custom_mesh.as_ref() else {
            return MeshData::new();
        };
        let Some(source) = custom.lods.get(lod.min(custom.lods.len().saturating_sub(1))) else {
            return MeshData::new();
        };
        let r = custom.rotation * (std::f32::consts::PI / 180.0);
        let rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        let mut mesh = source.clone();
        mesh.transform(&Mat4::from_scale_rotation_translation(custom.scale, rotation, custom.offset));
        mesh
    }

    /// Gravity droop and noise, both growing toward the sprout tip
    fn deform(&self, mesh: &mut MeshData, heights: &[f32], height: f32, placement: &SproutPlacement) {
        let d = self.descriptor;
        let t = self.scale_position(placement);
        let gravity_amount = d.gravity_bending_curve.lerp(d.gravity_bending_at_base, d.gravity_bending_at_top, t);
        let side_amount = d.gravity_bending_curve.lerp(d.side_gravity_bending_at_base, d.side_gravity_bending_at_top, t);
        let noise_amount = d.noise_curve.lerp(d.noise_at_base, d.noise_at_top, t);
        if gravity_amount == 0.0 && side_amount == 0.0 && noise_amount == 0.0 {
            return;
        }

        let gravity = placement.gravity.normalize_or(Vec3::NEG_Y);
        let side = Vec3::Y.cross(gravity).normalize_or(Vec3::X);
        let bend = (gravity * gravity_amount + side * side_amount) * height;
        let field = (noise_amount != 0.0).then(|| NoiseField::new((placement.seed ^ (placement.seed >> 32)) as u32));
        let resolution = d.noise_type.effective_resolution(d.noise_resolution);

        for (i, &h) in heights.iter().enumerate() {
            let mut offset = bend * h * h;
            if let Some(field) = &field {
                let n = field.sample(d.noise_type, mesh.positions[i], resolution);
                offset += mesh.normals[i] * n * noise_amount * h * height;
            }
            mesh.positions[i] += offset;
        }
        mesh.recompute_normals();
    }
}

/// `cols x rows` grid in the XY plane, stem at the area pivot.
///
/// `fold` lifts the side columns along +Z proportionally to their distance
/// from the midrib.
fn grid(
    mesh: &mut MeshData,
    heights: &mut Vec<f32>,
    area: &SproutMapArea,
    size: Vec2,
    cols: u32,
    rows: u32,
    fold: f32,
) {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let start = mesh.vertex_count() as u32;
    let pivot = area.pivot();
    for j in 0..=rows {
        let fy = j as f32 / rows as f32;
        for i in 0..=cols {
            let fx = i as f32 / cols as f32;
            let z = fold * (fx - 0.5).abs() * 2.0;
            let position = Vec3::new((fx - pivot.x) * size.x, (fy - pivot.y) * size.y, z);
            mesh.push_vertex(position, Vec3::Z, DEFAULT_TANGENT, area.uv(Vec2::new(fx, fy)));
            heights.push(fy);
        }
    }
    let stride = cols + 1;
    for j in 0..rows {
        for i in 0..cols {
            let a = start + j * stride + i;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            mesh.push_triangle(a, b, c, 0);
            mesh.push_triangle(b, d, c, 0);
        }
    }
    if fold != 0.0 {
        let first = start as usize;
        let mut card = MeshData {
            positions: mesh.positions[first..].to_vec(),
            normals: mesh.normals[first..].to_vec(),
            indices: mesh.indices[mesh.indices.len() - (cols * rows * 6) as usize..]
                .iter()
                .map(|&i| i - start)
                .collect(),
            ..Default::default()
        };
        card.recompute_normals();
        mesh.normals[first..].copy_from_slice(&card.normals);
    }
}
