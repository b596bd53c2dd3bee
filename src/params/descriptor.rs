//! The branch descriptor: complete input of a generation pass

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::core::{Error, Result};
use crate::params::bending::BendingParams;
use crate::params::branch::{BranchLevel, TrunkParams};
use crate::params::curve::Curve;
use crate::params::range::MinMax;
use crate::params::sprout::{ShapeMode, SproutDescriptor};
use crate::params::style::{SproutStyle, StyleChannel, VariationMode};
use crate::params::trunk::{IntegrationMode, TrunkMeshParams};

/// Tree presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TreePreset {
    /// Spreading crown, two branch levels, rooted base
    #[default]
    Broadleaf,
    /// Drooping branches pulled down at the tips
    Willow,
    /// Tall trunk with short near-horizontal whorls
    Conifer,
}

/// Full parameter set of one tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchDescriptor {
    pub seed: u64,
    /// Number of child levels instantiated below the trunk
    pub active_levels: usize,
    pub trunk: TrunkParams,
    pub levels: Vec<BranchLevel>,
    pub roots: Option<BranchLevel>,
    pub bending: BendingParams,
    pub trunk_mesh: TrunkMeshParams,
    pub sprouts: Vec<SproutDescriptor>,
    pub styles: Vec<SproutStyle>,
}

impl Default for BranchDescriptor {
    fn default() -> Self {
        Self::preset(TreePreset::Broadleaf)
    }
}

impl BranchDescriptor {
    /// Bare trunk: no child levels, no roots, no sprouts, no deformation
    pub fn trunk_only(girth_at_base: f32, girth_at_top: f32) -> Self {
        Self {
            seed: 0,
            active_levels: 0,
            trunk: TrunkParams {
                length: MinMax::fixed(4.0),
                girth_at_base,
                girth_at_top,
                girth_curve: Curve::linear(0.0, 1.0),
                segments: 4,
            },
            levels: Vec::new(),
            roots: None,
            bending: BendingParams::disabled(),
            trunk_mesh: TrunkMeshParams::default(),
            sprouts: Vec::new(),
            styles: Vec::new(),
        }
    }

    pub fn preset(preset: TreePreset) -> Self {
        match preset {
            TreePreset::Broadleaf => Self::broadleaf(),
            TreePreset::Willow => Self::willow(),
            TreePreset::Conifer => Self::conifer(),
        }
    }

    fn broadleaf() -> Self {
        let level2 = BranchLevel {
            min_frequency: 3,
            max_frequency: 5,
            length_at_base: MinMax::new(0.6, 0.8),
            length_at_top: MinMax::new(0.3, 0.4),
            segments: 3,
            ..Default::default()
        };
        Self {
            seed: 12345,
            active_levels: 2,
            trunk: TrunkParams::default(),
            levels: vec![BranchLevel::default(), level2],
            roots: Some(BranchLevel::roots()),
            bending: BendingParams::default(),
            trunk_mesh: TrunkMeshParams {
                integration_mode: IntegrationMode::Adaptative,
                ..Default::default()
            },
            sprouts: vec![SproutDescriptor { style_id: Some(0), ..Default::default() }],
            styles: vec![SproutStyle::default()],
        }
    }

    fn willow() -> Self {
        let mut desc = Self::broadleaf();
        desc.trunk.length = MinMax::new(3.0, 3.5);
        desc.levels[0].alignment_at_base = MinMax::new(40.0, 55.0);
        desc.levels[1].length_at_base = MinMax::new(1.2, 1.6);
        desc.levels[1].length_at_top = MinMax::new(0.9, 1.2);
        desc.bending.direction = Vec3::NEG_Y;
        desc.bending.force_at_tips = 0.45;
        desc.trunk_mesh.integration_mode = IntegrationMode::SimulateRoots;
        desc.sprouts[0].shape_mode = ShapeMode::GridPlane;
        desc.sprouts[0].width = 0.12;
        desc.sprouts[0].height = 0.5;
        desc.sprouts[0].gravity_bending_at_top = 0.5;
        desc.styles[0].color = Vec3::new(0.45, 0.75, 0.35);
        desc
    }

    fn conifer() -> Self {
        let mut desc = Self::broadleaf();
        desc.active_levels = 1;
        desc.trunk.length = MinMax::new(7.0, 8.0);
        desc.trunk.girth_at_top = 0.03;
        desc.levels.truncate(1);
        desc.levels[0].min_frequency = 12;
        desc.levels[0].max_frequency = 16;
        desc.levels[0].range = MinMax::new(0.15, 0.95);
        desc.levels[0].length_at_base = MinMax::new(1.8, 2.2);
        desc.levels[0].length_at_top = MinMax::new(0.3, 0.5);
        desc.levels[0].alignment_at_base = MinMax::new(80.0, 95.0);
        desc.levels[0].alignment_at_top = MinMax::new(60.0, 75.0);
        desc.roots = None;
        desc.trunk_mesh.integration_mode = IntegrationMode::SimulateRoots;
        desc.sprouts[0].shape_mode = ShapeMode::Cross;
        desc.sprouts[0].width = 0.2;
        desc.sprouts[0].height = 0.3;
        desc.sprouts[0].min_level = 1;
        desc.styles[0].color = Vec3::new(0.1, 0.28, 0.12);
        desc.styles[0].shade = StyleChannel::varying(0.3, 0.0, VariationMode::Hierarchy);
        desc
    }

    /// Validate the whole descriptor. Fails fast on the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.active_levels > self.levels.len() {
            return Err(Error::validation(format!(
                "active_levels {} exceeds the {} defined levels",
                self.active_levels,
                self.levels.len()
            )));
        }
        self.trunk.validate()?;
        for (i, level) in self.levels.iter().take(self.active_levels).enumerate() {
            level.validate(&format!("levels[{}]", i))?;
        }
        if let Some(roots) = &self.roots {
            roots.validate("roots")?;
        }
        self.bending.validate()?;
        self.trunk_mesh.validate()?;

        let mut style_ids = HashSet::new();
        for style in &self.styles {
            style.validate()?;
            if !style_ids.insert(style.id) {
                return Err(Error::validation(format!("duplicate style id {}", style.id)));
            }
        }
        for (i, sprout) in self.sprouts.iter().enumerate() {
            sprout.validate(&format!("sprouts[{}]", i))?;
            if let Some(id) = sprout.style_id {
                if !style_ids.contains(&id) {
                    return Err(Error::validation(format!("sprouts[{}] references unknown style {}", i, id)));
                }
            }
        }
        Ok(())
    }

    pub fn style(&self, id: u32) -> Option<&SproutStyle> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// Parse a descriptor from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let desc: Self = serde_json::from_str(json)?;
        desc.validate()?;
        Ok(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_valid() {
        for preset in [TreePreset::Broadleaf, TreePreset::Willow, TreePreset::Conifer] {
            let desc = BranchDescriptor::preset(preset);
            assert!(desc.validate().is_ok(), "{:?} invalid", preset);
        }
    }

    #[test]
    fn test_willow_bends_down() {
        let willow = BranchDescriptor::preset(TreePreset::Willow);
        assert!(willow.bending.direction.y < 0.0);
    }

    #[test]
    fn test_active_levels_beyond_defined() {
        let mut desc = BranchDescriptor::default();
        desc.active_levels = 5;
        assert!(matches!(desc.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_unknown_style_rejected() {
        let mut desc = BranchDescriptor::default();
        desc.sprouts[0].style_id = Some(42);
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_json_partial_document() {
        let desc = BranchDescriptor::from_json(r#"{ "seed": 7, "active_levels": 1 }"#).unwrap();
        assert_eq!(desc.seed, 7);
        assert_eq!(desc.active_levels, 1);
        assert_eq!(desc.levels.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let desc = BranchDescriptor::preset(TreePreset::Conifer);
        let json = serde_json::to_string(&desc).unwrap();
        assert_eq!(BranchDescriptor::from_json(&json).unwrap(), desc);
    }
}
