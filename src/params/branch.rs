//! Per-level branch structure parameters

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::params::curve::Curve;
use crate::params::range::{validate_unit, MinMax};

/// Trunk shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkParams {
    /// Trunk length in world units
    pub length: MinMax,
    /// Radius at the base of the trunk
    pub girth_at_base: f32,
    /// Radius at the top of the trunk
    pub girth_at_top: f32,
    /// Blend from base to top girth along the trunk
    pub girth_curve: Curve,
    /// Skeleton segments along the trunk
    pub segments: u32,
}

impl Default for TrunkParams {
    fn default() -> Self {
        Self {
            length: MinMax::new(4.0, 5.0),
            girth_at_base: 0.3,
            girth_at_top: 0.08,
            girth_curve: Curve::linear(0.0, 1.0),
            segments: 8,
        }
    }
}

impl TrunkParams {
    pub fn validate(&self) -> Result<()> {
        self.length.validate("trunk.length")?;
        if self.length.min <= 0.0 {
            return Err(Error::validation("trunk.length must be positive"));
        }
        validate_unit("trunk.girth_at_base", self.girth_at_base, 0.0, f32::MAX)?;
        validate_unit("trunk.girth_at_top", self.girth_at_top, 0.0, f32::MAX)?;
        self.girth_curve.validate("trunk.girth_curve")?;
        if self.segments == 0 {
            return Err(Error::validation("trunk.segments must be at least 1"));
        }
        Ok(())
    }

    /// Radius at normalized trunk position `t`
    pub fn girth_at(&self, t: f32) -> f32 {
        self.girth_curve.lerp(self.girth_at_base, self.girth_at_top, t)
    }
}

/// Parameters for one level of child branches (or for roots)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchLevel {
    pub enabled: bool,
    /// Children spawned per parent branch, inclusive range
    pub min_frequency: u32,
    pub max_frequency: u32,
    /// Remaps evenly spaced spawn slots to bias density toward base or top
    pub distribution_curve: Curve,
    /// Portion of the parent branch children may spawn on (0 = base, 1 = tip)
    pub range: MinMax,
    /// Spawn position jitter as a fraction of the slot spacing `[0, 1]`
    pub spacing_variance: f32,
    /// Child length near the parent's base
    pub length_at_base: MinMax,
    /// Child length near the parent's tip
    pub length_at_top: MinMax,
    pub length_curve: Curve,
    /// Angle from the parent direction in degrees, near the parent's base
    pub alignment_at_base: MinMax,
    /// Angle from the parent direction in degrees, near the parent's tip
    pub alignment_at_top: MinMax,
    pub alignment_curve: Curve,
    /// Child base radius relative to the parent radius at the attach point
    pub girth_scale: MinMax,
    /// Tip radius relative to the child's base radius
    pub tip_girth: f32,
    /// Skeleton segments per child branch
    pub segments: u32,
}

impl Default for BranchLevel {
    fn default() -> Self {
        Self {
            enabled: true,
            min_frequency: 4,
            max_frequency: 6,
            distribution_curve: Curve::linear(0.0, 1.0),
            range: MinMax::new(0.3, 1.0),
            spacing_variance: 0.3,
            length_at_base: MinMax::new(1.6, 2.0),
            length_at_top: MinMax::new(0.6, 0.9),
            length_curve: Curve::linear(0.0, 1.0),
            alignment_at_base: MinMax::new(50.0, 65.0),
            alignment_at_top: MinMax::new(30.0, 45.0),
            alignment_curve: Curve::linear(0.0, 1.0),
            girth_scale: MinMax::new(0.5, 0.7),
            tip_girth: 0.25,
            segments: 5,
        }
    }
}

impl BranchLevel {
    /// Default root level: short, thick, pointing outward and down
    pub fn roots() -> Self {
        Self {
            enabled: true,
            min_frequency: 4,
            max_frequency: 6,
            distribution_curve: Curve::linear(0.0, 1.0),
            range: MinMax::new(0.0, 0.0),
            spacing_variance: 0.3,
            length_at_base: MinMax::new(0.8, 1.2),
            length_at_top: MinMax::new(0.8, 1.2),
            length_curve: Curve::linear(0.0, 1.0),
            alignment_at_base: MinMax::new(15.0, 30.0),
            alignment_at_top: MinMax::new(15.0, 30.0),
            alignment_curve: Curve::linear(0.0, 1.0),
            girth_scale: MinMax::new(0.4, 0.6),
            tip_girth: 0.2,
            segments: 4,
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.min_frequency > self.max_frequency {
            return Err(Error::validation(format!(
                "{}: min_frequency {} > max_frequency {}",
                name, self.min_frequency, self.max_frequency
            )));
        }
        self.distribution_curve.validate(&format!("{}.distribution_curve", name))?;
        self.range.validate_within(&format!("{}.range", name), 0.0, 1.0)?;
        validate_unit(&format!("{}.spacing_variance", name), self.spacing_variance, 0.0, 1.0)?;
        self.length_at_base.validate_within(&format!("{}.length_at_base", name), 0.0, f32::MAX)?;
        self.length_at_top.validate_within(&format!("{}.length_at_top", name), 0.0, f32::MAX)?;
        self.length_curve.validate(&format!("{}.length_curve", name))?;
        self.alignment_at_base.validate(&format!("{}.alignment_at_base", name))?;
        self.alignment_at_top.validate(&format!("{}.alignment_at_top", name))?;
        self.alignment_curve.validate(&format!("{}.alignment_curve", name))?;
        self.girth_scale.validate_within(&format!("{}.girth_scale", name), 0.0, 1.0)?;
        validate_unit(&format!("{}.tip_girth", name), self.tip_girth, 0.0, 1.0)?;
        if self.segments == 0 {
            return Err(Error::validation(format!("{}: segments must be at least 1", name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(TrunkParams::default().validate().is_ok());
        assert!(BranchLevel::default().validate("level").is_ok());
        assert!(BranchLevel::roots().validate("roots").is_ok());
    }

    #[test]
    fn test_frequency_order_rejected() {
        let level = BranchLevel { min_frequency: 5, max_frequency: 2, ..Default::default() };
        let err = level.validate("level1").unwrap_err();
        assert!(err.to_string().contains("min_frequency"));
    }

    #[test]
    fn test_girth_scale_above_one_rejected() {
        let level = BranchLevel { girth_scale: MinMax::new(0.5, 1.2), ..Default::default() };
        assert!(level.validate("level").is_err());
    }

    #[test]
    fn test_girth_at() {
        let trunk = TrunkParams { girth_at_base: 0.5, girth_at_top: 0.3, ..Default::default() };
        assert!((trunk.girth_at(0.0) - 0.5).abs() < 1e-6);
        assert!((trunk.girth_at(1.0) - 0.3).abs() < 1e-6);
    }
}
