//! Sprout (leaf card) shape, placement and texture-area parameters

use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3};
use crate::core::{Error, Result, Warning};
use crate::mesh::MeshData;
use crate::params::curve::Curve;
use crate::params::range::{validate_unit, MinMax};
use crate::procgen::NoiseType;

/// Geometry generated for each sprout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShapeMode {
    /// Single quad folded along its midrib
    #[default]
    PlaneX,
    /// Subdivided plane
    GridPlane,
    /// Two subdivided planes crossing at 90 degrees
    Cross,
    /// Externally supplied geometry
    Mesh,
}

/// Which normalized position drives the sprout scale curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Depth of the sprout in the whole tree
    #[default]
    Hierarchy,
    /// Position along the carrying branch
    Branch,
    /// Position within the sprout's spawn range on the branch
    Range,
}

/// Normalized sub-rectangle of a texture plus the sprout pivot inside it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SproutMapArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub pivot_x: f32,
    pub pivot_y: f32,
    pub enabled: bool,
}

impl Default for SproutMapArea {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            pivot_x: 0.5,
            pivot_y: 0.0,
            enabled: true,
        }
    }
}

impl SproutMapArea {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height, ..Default::default() }
    }

    pub fn pivot(&self) -> Vec2 {
        Vec2::new(self.pivot_x, self.pivot_y)
    }

    /// Width over height of the area; `None` for a zero-height area
    pub fn aspect(&self) -> Option<f32> {
        (self.height > f32::EPSILON).then(|| self.width / self.height)
    }

    /// Area clamped into the unit square.
    ///
    /// Returns the clamped area and whether anything changed. Origins are
    /// clamped first, then sizes shrink so `x + width <= 1` and
    /// `y + height <= 1`. Pivots are clamped to `[0, 1]`.
    pub fn clamped(&self) -> (Self, bool) {
        let sanitize = |v: f32| if v.is_finite() { v } else { 0.0 };
        let x = sanitize(self.x).clamp(0.0, 1.0);
        let y = sanitize(self.y).clamp(0.0, 1.0);
        let width = sanitize(self.width).clamp(0.0, 1.0 - x);
        let height = sanitize(self.height).clamp(0.0, 1.0 - y);
        let clamped = Self {
            x,
            y,
            width,
            height,
            pivot_x: sanitize(self.pivot_x).clamp(0.0, 1.0),
            pivot_y: sanitize(self.pivot_y).clamp(0.0, 1.0),
            enabled: self.enabled,
        };
        let changed = clamped != *self;
        (clamped, changed)
    }

    /// [`clamped`](Self::clamped), logging a warning when the area changed
    pub fn sanitized(&self, index: usize) -> Self {
        let (area, changed) = self.clamped();
        if changed {
            Warning::MapAreaClamped { index }.emit();
        }
        area
    }

    /// Texture coordinate of a point given in area-local `[0, 1]` coordinates
    pub fn uv(&self, local: Vec2) -> Vec2 {
        Vec2::new(self.x + local.x * self.width, self.y + local.y * self.height)
    }
}

/// Custom geometry for [`ShapeMode::Mesh`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSproutMesh {
    /// One mesh per LOD, finest first
    pub lods: Vec<MeshData>,
    pub scale: Vec3,
    /// Euler rotation in degrees, applied X then Y then Z
    pub rotation: Vec3,
    pub offset: Vec3,
}

impl Default for CustomSproutMesh {
    fn default() -> Self {
        Self {
            lods: Vec::new(),
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            offset: Vec3::ZERO,
        }
    }
}

/// One sprout group: shape, distribution over branches and texture areas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SproutDescriptor {
    /// Element id written to every triangle of this group's sprouts
    pub group_id: u32,
    pub enabled: bool,

    pub shape_mode: ShapeMode,
    pub width: f32,
    pub height: f32,
    /// Midrib fold depth for `PlaneX`, fraction of width
    pub depth: f32,
    pub resolution_width: u32,
    pub resolution_height: u32,
    /// Derive height from the texture area's aspect ratio
    pub override_height_with_texture: bool,
    /// Scale by the area's linear size relative to the full atlas
    pub include_scale_from_atlas: bool,

    pub scale_mode: ScaleMode,
    pub scale_at_base: f32,
    pub scale_at_top: f32,
    pub scale_curve: Curve,

    pub gravity_bending_at_base: f32,
    pub gravity_bending_at_top: f32,
    pub gravity_bending_curve: Curve,
    pub side_gravity_bending_at_base: f32,
    pub side_gravity_bending_at_top: f32,

    pub noise_type: NoiseType,
    pub noise_resolution: f32,
    pub noise_at_base: f32,
    pub noise_at_top: f32,
    pub noise_curve: Curve,

    pub custom_mesh: Option<CustomSproutMesh>,
    pub map_areas: Vec<SproutMapArea>,
    pub style_id: Option<u32>,

    /// Sprouts per carrying branch, inclusive range
    pub min_frequency: u32,
    pub max_frequency: u32,
    /// Portion of the branch sprouts spawn on
    pub range: MinMax,
    /// Lowest branch level that carries this group (0 = trunk)
    pub min_level: u32,
    /// 0 = perpendicular to the branch, 1 = along the branch
    pub alignment: f32,
}

impl Default for SproutDescriptor {
    fn default() -> Self {
        Self {
            group_id: 0,
            enabled: true,
            shape_mode: ShapeMode::PlaneX,
            width: 0.3,
            height: 0.45,
            depth: 0.1,
            resolution_width: 2,
            resolution_height: 3,
            override_height_with_texture: false,
            include_scale_from_atlas: false,
            scale_mode: ScaleMode::Hierarchy,
            scale_at_base: 1.0,
            scale_at_top: 0.8,
            scale_curve: Curve::linear(0.0, 1.0),
            gravity_bending_at_base: 0.0,
            gravity_bending_at_top: 0.2,
            gravity_bending_curve: Curve::linear(0.0, 1.0),
            side_gravity_bending_at_base: 0.0,
            side_gravity_bending_at_top: 0.0,
            noise_type: NoiseType::Basic,
            noise_resolution: 4.0,
            noise_at_base: 0.0,
            noise_at_top: 0.0,
            noise_curve: Curve::linear(0.0, 1.0),
            custom_mesh: None,
            map_areas: vec![SproutMapArea::default()],
            style_id: None,
            min_frequency: 4,
            max_frequency: 8,
            range: MinMax::new(0.3, 1.0),
            min_level: 1,
            alignment: 0.4,
        }
    }
}

impl SproutDescriptor {
    pub fn validate(&self, name: &str) -> Result<()> {
        validate_unit(&format!("{}.width", name), self.width, 0.0, f32::MAX)?;
        validate_unit(&format!("{}.height", name), self.height, 0.0, f32::MAX)?;
        validate_unit(&format!("{}.depth", name), self.depth, 0.0, 1.0)?;
        validate_unit(&format!("{}.alignment", name), self.alignment, 0.0, 1.0)?;
        validate_unit(&format!("{}.noise_resolution", name), self.noise_resolution, 0.0, f32::MAX)?;
        if matches!(self.shape_mode, ShapeMode::GridPlane | ShapeMode::Cross)
            && (self.resolution_width == 0 || self.resolution_height == 0)
        {
            return Err(Error::validation(format!("{}: grid resolution must be at least 1", name)));
        }
        if self.shape_mode == ShapeMode::Mesh
            && self.custom_mesh.as_ref().is_none_or(|m| m.lods.is_empty())
        {
            return Err(Error::validation(format!("{}: Mesh shape needs at least one custom LOD", name)));
        }
        if self.min_frequency > self.max_frequency {
            return Err(Error::validation(format!(
                "{}: min_frequency {} > max_frequency {}",
                name, self.min_frequency, self.max_frequency
            )));
        }
        self.range.validate_within(&format!("{}.range", name), 0.0, 1.0)?;
        self.scale_curve.validate(&format!("{}.scale_curve", name))?;
        self.gravity_bending_curve.validate(&format!("{}.gravity_bending_curve", name))?;
        self.noise_curve.validate(&format!("{}.noise_curve", name))?;
        Ok(())
    }

    /// Enabled map areas, clamped into the unit square
    pub fn enabled_areas(&self) -> Vec<SproutMapArea> {
        self.map_areas
            .iter()
            .enumerate()
            .filter(|(_, a)| a.enabled)
            .map(|(i, a)| a.sanitized(i))
            .collect()
    }
}
