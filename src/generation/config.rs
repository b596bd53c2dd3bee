//! Pipeline configuration: LODs, atlas layout and parallelism

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Knobs that are not part of a tree's descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of LODs a snapshot produces (LOD 0 is the finest)
    pub lod_count: usize,
    /// Mesh resolution multiplier applied once per LOD step, `(0, 1]`
    pub lod_resolution_falloff: f32,
    /// Atlas edge length in pixels
    pub atlas_size: u32,
    /// Padding around every fragment in the atlas, in pixels
    pub atlas_padding: u32,
    /// Fragment texture pixels per world unit
    pub texel_density: f32,
    /// Build sprout meshes on the rayon pool
    pub parallel_sprouts: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lod_count: 3,
            lod_resolution_falloff: 0.5,
            atlas_size: 1024,
            atlas_padding: 4,
            texel_density: 48.0,
            parallel_sprouts: true,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lod_count == 0 {
            return Err(Error::validation("lod_count must be at least 1"));
        }
        if !(self.lod_resolution_falloff > 0.0 && self.lod_resolution_falloff <= 1.0) {
            return Err(Error::validation(format!(
                "lod_resolution_falloff {} outside (0, 1]",
                self.lod_resolution_falloff
            )));
        }
        if self.atlas_size == 0 {
            return Err(Error::validation("atlas_size must be positive"));
        }
        if !(self.texel_density.is_finite() && self.texel_density > 0.0) {
            return Err(Error::validation("texel_density must be positive"));
        }
        Ok(())
    }

    /// Mesh resolution multiplier for `lod`
    pub fn lod_scale(&self, lod: usize) -> f32 {
        self.lod_resolution_falloff.powi(lod as i32)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
