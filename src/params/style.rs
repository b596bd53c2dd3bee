//! Sprout style bindings: color and material channels per style id

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;
use crate::core::{Error, Result};
use crate::math::{lerp, SimpleRng};

/// Source of the blend position for a style channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VariationMode {
    /// Random uniform value in `[min, max]` per sprout
    #[default]
    Uniform,
    /// Blend by the sprout's depth in the tree
    Hierarchy,
    /// Blend by the sprout's position along its branch
    Branch,
}

/// One scalar style channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleChannel {
    pub min: f32,
    pub max: f32,
    pub mode: VariationMode,
    /// Mix toward a random value in `[min, max]`, `[0, 1]`
    pub variance: f32,
    /// Read the blend position as `1 - t`
    pub invert: bool,
}

impl Default for StyleChannel {
    fn default() -> Self {
        Self::fixed(0.0)
    }
}

impl StyleChannel {
    pub fn fixed(value: f32) -> Self {
        Self { min: value, max: value, mode: VariationMode::Uniform, variance: 0.0, invert: false }
    }

    pub fn varying(min: f32, max: f32, mode: VariationMode) -> Self {
        Self { min, max, mode, variance: 0.0, invert: false }
    }

    /// Evaluate for a sprout at `hierarchy` depth and `branch` position.
    ///
    /// Always draws exactly one random number so channels stay aligned in
    /// the stream whatever their mode.
    pub fn evaluate(&self, hierarchy: f32, branch: f32, rng: &mut SimpleRng) -> f32 {
        let random = rng.next_float();
        let t = match self.mode {
            VariationMode::Uniform => random,
            VariationMode::Hierarchy => hierarchy.clamp(0.0, 1.0),
            VariationMode::Branch => branch.clamp(0.0, 1.0),
        };
        let t = if self.invert { 1.0 - t } else { t };
        let positional = lerp(self.min, self.max, t);
        let jittered = lerp(self.min, self.max, random);
        lerp(positional, jittered, self.variance).clamp(self.min.min(self.max), self.min.max(self.max))
    }

    fn validate(&self, name: &str) -> Result<()> {
        let ok = [self.min, self.max, self.variance].iter().all(|v| v.is_finite())
            && (0.0..=1.0).contains(&self.variance);
        if !ok {
            return Err(Error::validation(format!("style channel '{}' is malformed", name)));
        }
        Ok(())
    }
}

/// Resolved style values for one sprout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSample {
    pub color: Vec3,
    pub alpha: f32,
    pub metallic: f32,
    pub glossiness: f32,
    pub subsurface: f32,
    pub style_id: u32,
}

/// Color and material parameters bound to a style id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SproutStyle {
    pub id: u32,
    /// Linear RGB base color
    pub color: Vec3,
    pub saturation: StyleChannel,
    /// Darkening factor, 0 = none
    pub shade: StyleChannel,
    pub tint_color: Vec3,
    /// Blend toward `tint_color`, 0 = none
    pub tint: StyleChannel,
    /// 0 = opaque, 1 = fully dissolved
    pub dissolve: StyleChannel,
    pub metallic: StyleChannel,
    pub glossiness: StyleChannel,
    pub subsurface: StyleChannel,
}

impl Default for SproutStyle {
    fn default() -> Self {
        Self {
            id: 0,
            color: Vec3::new(0.18, 0.42, 0.12),
            saturation: StyleChannel::fixed(1.0),
            shade: StyleChannel::varying(0.0, 0.3, VariationMode::Hierarchy),
            tint_color: Vec3::new(0.55, 0.5, 0.12),
            tint: StyleChannel { variance: 0.5, ..StyleChannel::varying(0.0, 0.2, VariationMode::Uniform) },
            dissolve: StyleChannel::fixed(0.0),
            metallic: StyleChannel::fixed(0.0),
            glossiness: StyleChannel::fixed(0.2),
            subsurface: StyleChannel::fixed(0.5),
        }
    }
}

impl SproutStyle {
    pub fn validate(&self) -> Result<()> {
        for (name, channel) in [
            ("saturation", &self.saturation),
            ("shade", &self.shade),
            ("tint", &self.tint),
            ("dissolve", &self.dissolve),
            ("metallic", &self.metallic),
            ("glossiness", &self.glossiness),
            ("subsurface", &self.subsurface),
        ] {
            channel.validate(name)?;
        }
        Ok(())
    }

    /// Resolve all channels for one sprout
    pub fn sample(&self, hierarchy: f32, branch: f32, rng: &mut SimpleRng) -> StyleSample {
        let saturation = self.saturation.evaluate(hierarchy, branch, rng);
        let shade = self.shade.evaluate(hierarchy, branch, rng);
        let tint = self.tint.evaluate(hierarchy, branch, rng);
        let dissolve = self.dissolve.evaluate(hierarchy, branch, rng);
        let metallic = self.metallic.evaluate(hierarchy, branch, rng);
        let glossiness = self.glossiness.evaluate(hierarchy, branch, rng);
        let subsurface = self.subsurface.evaluate(hierarchy, branch, rng);

        let luma = self.color.dot(Vec3::new(0.2126, 0.7152, 0.0722));
        let mut color = Vec3::splat(luma).lerp(self.color, saturation);
        color *= 1.0 - shade.clamp(0.0, 1.0);
        color = color.lerp(self.tint_color, tint.clamp(0.0, 1.0));

        StyleSample {
            color: color.clamp(Vec3::ZERO, Vec3::ONE),
            alpha: 1.0 - dissolve.clamp(0.0, 1.0),
            metallic,
            glossiness,
            subsurface,
            style_id: self.id,
        }
    }
}
