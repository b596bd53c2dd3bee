//! Trunk mesh resolution, taper and root crest parameters

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::params::curve::Curve;
use crate::params::range::{validate_unit, MinMax};

/// How root crests are integrated into the trunk mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationMode {
    /// Plain tapered cylinder
    #[default]
    None,
    /// Synthesize virtual crests around the base
    SimulateRoots,
    /// One crest per real root branch in the skeleton
    Adaptative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkMeshParams {
    /// Ring segment count before the resolution factor
    pub base_radial_segments: u32,
    /// Multiplier on `base_radial_segments`, `[1, 4]`
    pub radial_resolution_factor: f32,
    /// Longitudinal section count before the resolution factor
    pub base_length_segments: u32,
    pub length_resolution_factor: f32,

    pub trunk_scale_at_base: f32,
    pub trunk_scale_at_top: f32,
    pub scale_curve: Curve,

    pub integration_mode: IntegrationMode,
    pub min_roots_count: u32,
    pub max_roots_count: u32,
    /// Crest length as a fraction of trunk height
    pub min_spread: f32,
    pub max_spread: f32,
    /// Angular jitter as a fraction of the spacing between crests, `[0, 1]`
    pub angle_variance: f32,
    /// Crest twist along its length, in turns
    pub twirl: f32,
    /// Upper bound on a crest's length, fraction of trunk height
    pub root_reach: f32,
    /// Outward exposure (fraction of ring radius) at the crest's base
    pub root_exposure_at_base: MinMax,
    /// Outward exposure at the crest's far end
    pub root_exposure_at_top: MinMax,
    pub root_scale_at_base: MinMax,
    pub root_scale_at_top: MinMax,
}

impl Default for TrunkMeshParams {
    fn default() -> Self {
        Self {
            base_radial_segments: 8,
            radial_resolution_factor: 1.0,
            base_length_segments: 8,
            length_resolution_factor: 1.0,
            trunk_scale_at_base: 1.0,
            trunk_scale_at_top: 1.0,
            scale_curve: Curve::linear(0.0, 1.0),
            integration_mode: IntegrationMode::None,
            min_roots_count: 3,
            max_roots_count: 5,
            min_spread: 0.1,
            max_spread: 0.2,
            angle_variance: 0.2,
            twirl: 0.0,
            root_reach: 0.25,
            root_exposure_at_base: MinMax::new(0.3, 0.5),
            root_exposure_at_top: MinMax::new(0.0, 0.1),
            root_scale_at_base: MinMax::fixed(1.0),
            root_scale_at_top: MinMax::fixed(1.0),
        }
    }
}

impl TrunkMeshParams {
    pub fn validate(&self) -> Result<()> {
        if self.base_radial_segments < 3 {
            return Err(Error::validation("trunk_mesh.base_radial_segments must be at least 3"));
        }
        if self.base_length_segments == 0 {
            return Err(Error::validation("trunk_mesh.base_length_segments must be at least 1"));
        }
        validate_unit("trunk_mesh.radial_resolution_factor", self.radial_resolution_factor, 1.0, 4.0)?;
        validate_unit("trunk_mesh.length_resolution_factor", self.length_resolution_factor, 0.0, f32::MAX)?;
        self.scale_curve.validate("trunk_mesh.scale_curve")?;
        if self.min_roots_count > self.max_roots_count {
            return Err(Error::validation(format!(
                "trunk_mesh: min_roots_count {} > max_roots_count {}",
                self.min_roots_count, self.max_roots_count
            )));
        }
        MinMax::new(self.min_spread, self.max_spread).validate_within("trunk_mesh.spread", 0.0, 1.0)?;
        validate_unit("trunk_mesh.angle_variance", self.angle_variance, 0.0, 1.0)?;
        validate_unit("trunk_mesh.root_reach", self.root_reach, 0.0, 1.0)?;
        self.root_exposure_at_base.validate_within("trunk_mesh.root_exposure_at_base", 0.0, f32::MAX)?;
        self.root_exposure_at_top.validate_within("trunk_mesh.root_exposure_at_top", 0.0, f32::MAX)?;
        self.root_scale_at_base.validate_within("trunk_mesh.root_scale_at_base", 0.0, f32::MAX)?;
        self.root_scale_at_top.validate_within("trunk_mesh.root_scale_at_top", 0.0, f32::MAX)?;
        Ok(())
    }

    /// Ring segment count after the resolution factor
    pub fn radial_segments(&self) -> u32 {
        ((self.base_radial_segments as f32 * self.radial_resolution_factor).round() as u32).max(3)
    }

    /// Longitudinal section count after the resolution factor
    pub fn length_segments(&self) -> u32 {
        ((self.base_length_segments as f32 * self.length_resolution_factor).round() as u32).max(1)
    }

    /// Global taper multiplier at normalized trunk height `t`
    pub fn trunk_scale_at(&self, t: f32) -> f32 {
        self.scale_curve.lerp(self.trunk_scale_at_base, self.trunk_scale_at_top, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_with_factor() {
        let params = TrunkMeshParams {
            base_radial_segments: 6,
            radial_resolution_factor: 2.0,
            base_length_segments: 4,
            length_resolution_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(params.radial_segments(), 12);
        assert_eq!(params.length_segments(), 6);
    }

    #[test]
    fn test_validate_rejects_factor() {
        let params = TrunkMeshParams { radial_resolution_factor: 5.0, ..Default::default() };
        assert!(params.validate().is_err());
        let params = TrunkMeshParams { min_roots_count: 6, max_roots_count: 2, ..Default::default() };
        assert!(params.validate().is_err());
        assert!(TrunkMeshParams::default().validate().is_ok());
    }
}
