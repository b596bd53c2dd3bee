//! Bending, smoothing and noise parameters for the skeleton deformation pass

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::core::Result;
use crate::params::curve::Curve;
use crate::params::range::validate_unit;
use crate::procgen::NoiseType;

/// Deformation applied to the skeleton before meshing.
///
/// Every `*_at_base` / `*_at_top` pair is blended by
/// `hierarchy_distribution_curve` (or the pair's own curve) evaluated at the
/// node's normalized depth in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BendingParams {
    pub apply_directional_bending: bool,
    /// Global bend target direction
    pub direction: Vec3,
    pub force_at_trunk: f32,
    pub force_at_tips: f32,
    pub hierarchy_distribution_curve: Curve,

    pub horizontal_align_at_base: f32,
    pub horizontal_align_at_top: f32,
    pub horizontal_align_curve: Curve,
    /// 0 = no effect, 1 = full alignment to the horizontal plane
    pub horizontal_align_strength: f32,

    pub vertical_align_at_base: f32,
    pub vertical_align_at_top: f32,
    pub vertical_align_curve: Curve,
    /// 0 = no effect, 1 = full alignment to the vertical axis
    pub vertical_align_strength: f32,

    pub apply_joint_smoothing: bool,
    pub smooth_joint_strength: f32,
    pub smoothing_iterations: u32,

    pub apply_noise: bool,
    pub noise_type: NoiseType,
    /// Lattice resolution for [`NoiseType::Basic`]; other types ignore it
    pub noise_resolution: f32,
    pub noise_at_base: f32,
    pub noise_at_top: f32,
    pub noise_scale_at_base: f32,
    pub noise_scale_at_top: f32,
    pub has_random_noise_offset: bool,

    /// Root mirror of the directional stage
    pub root_direction: Vec3,
    pub root_direction_strength: f32,
    pub smooth_root_joint_strength: f32,
    pub noise_at_root_base: f32,
    pub noise_at_root_bottom: f32,
}

impl Default for BendingParams {
    fn default() -> Self {
        Self {
            apply_directional_bending: true,
            direction: Vec3::Y,
            force_at_trunk: 0.0,
            force_at_tips: 0.15,
            hierarchy_distribution_curve: Curve::linear(0.0, 1.0),
            horizontal_align_at_base: 0.0,
            horizontal_align_at_top: 0.3,
            horizontal_align_curve: Curve::linear(0.0, 1.0),
            horizontal_align_strength: 0.0,
            vertical_align_at_base: 0.0,
            vertical_align_at_top: 0.3,
            vertical_align_curve: Curve::linear(0.0, 1.0),
            vertical_align_strength: 0.0,
            apply_joint_smoothing: true,
            smooth_joint_strength: 0.3,
            smoothing_iterations: 2,
            apply_noise: true,
            noise_type: NoiseType::Perlin,
            noise_resolution: 4.0,
            noise_at_base: 0.0,
            noise_at_top: 0.08,
            noise_scale_at_base: 0.5,
            noise_scale_at_top: 1.5,
            has_random_noise_offset: false,
            root_direction: Vec3::NEG_Y,
            root_direction_strength: 0.1,
            smooth_root_joint_strength: 0.3,
            noise_at_root_base: 0.0,
            noise_at_root_bottom: 0.05,
        }
    }
}

impl BendingParams {
    /// Parameters that leave the skeleton untouched
    pub fn disabled() -> Self {
        Self {
            apply_directional_bending: false,
            apply_joint_smoothing: false,
            apply_noise: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.hierarchy_distribution_curve.validate("bending.hierarchy_distribution_curve")?;
        self.horizontal_align_curve.validate("bending.horizontal_align_curve")?;
        self.vertical_align_curve.validate("bending.vertical_align_curve")?;
        validate_unit("bending.horizontal_align_strength", self.horizontal_align_strength, 0.0, 1.0)?;
        validate_unit("bending.vertical_align_strength", self.vertical_align_strength, 0.0, 1.0)?;
        validate_unit("bending.smooth_joint_strength", self.smooth_joint_strength, 0.0, 1.0)?;
        validate_unit("bending.smooth_root_joint_strength", self.smooth_root_joint_strength, 0.0, 1.0)?;
        validate_unit("bending.root_direction_strength", self.root_direction_strength, 0.0, 1.0)?;
        validate_unit("bending.noise_resolution", self.noise_resolution, 0.0, f32::MAX)?;
        for (name, v) in [
            ("bending.force_at_trunk", self.force_at_trunk),
            ("bending.force_at_tips", self.force_at_tips),
        ] {
            validate_unit(name, v, 0.0, 1.0)?;
        }
        for (name, v) in [
            ("bending.noise_at_base", self.noise_at_base),
            ("bending.noise_at_top", self.noise_at_top),
            ("bending.noise_scale_at_base", self.noise_scale_at_base),
            ("bending.noise_scale_at_top", self.noise_scale_at_top),
            ("bending.noise_at_root_base", self.noise_at_root_base),
            ("bending.noise_at_root_bottom", self.noise_at_root_bottom),
        ] {
            validate_unit(name, v, 0.0, f32::MAX)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(BendingParams::default().validate().is_ok());
        assert!(BendingParams::disabled().validate().is_ok());
    }

    #[test]
    fn test_strength_out_of_range() {
        let params = BendingParams { smooth_joint_strength: 1.5, ..Default::default() };
        assert!(params.validate().is_err());
    }
}
