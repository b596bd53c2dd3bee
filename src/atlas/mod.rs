//! Sprout texture atlas: packing, composition, UV remapping

pub mod packer;
pub mod texture;

pub use packer::{AtlasLayout, AtlasPacker, PackedRect, UvTransform};
pub use texture::{TextureBuilder, blit, dilate, dilation_iterations};

use crate::core::Result;
use crate::core::types::{Rgba, RgbaImage, Vec2};
use crate::generation::GenerationConfig;
use crate::polygon::PolygonArea;

/// Pack, rasterize and compose `areas` into one atlas, then remap their UVs into it.
///
/// `shade(i, uv)` colours pixel `uv` (local `[0, 1]`) of area `i`.
/// Empty areas still get a 1x1 slot so indices line up with `layout.rects`.
pub fn compose_atlas<F>(
    areas: &mut [PolygonArea],
    config: &GenerationConfig,
    shade: F,
) -> Result<(AtlasLayout, RgbaImage)>
where
    F: Fn(usize, Vec2) -> Rgba<u8>,
{
    config.validate()?;
    let builder = TextureBuilder::new(config.atlas_size, config.atlas_padding, config.texel_density);
    let sizes: Vec<(u32, u32)> = areas.iter().map(|a| builder.fragment_size(a)).collect();
    let layout = AtlasPacker::new(config.atlas_size, config.atlas_padding).pack(&sizes)?;

    let fragments: Vec<RgbaImage> = areas
        .iter()
        .zip(&sizes)
        .enumerate()
        .map(|(i, (area, &(w, h)))| builder.rasterize(area, w, h, |uv| shade(i, uv)))
        .collect();
    let atlas = builder.compose(&layout, &fragments)?;

    for (i, area) in areas.iter_mut().enumerate() {
        layout.remap(i, area)?;
    }
    log::info!("Atlas: {} fragments in {}x{}", areas.len(), config.atlas_size, config.atlas_size);
    Ok((layout, atlas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Error, NoProgress};
    use crate::params::BranchDescriptor;
    use crate::polygon::{CutPlane, PolygonAreaCache, Snapshot, SnapshotProcessor};

    fn config() -> GenerationConfig {
        GenerationConfig { atlas_size: 512, atlas_padding: 4, texel_density: 16.0, parallel_sprouts: false, ..Default::default() }
    }

    #[test]
    fn test_snapshot_areas_compose_into_atlas() {
        let snapshot = Snapshot::new(0, BranchDescriptor::default()).with_planes(vec![CutPlane::side(), CutPlane::front()]);
        let lods = SnapshotProcessor::new(config())
            .process(&snapshot, &mut PolygonAreaCache::new(), &mut NoProgress)
            .unwrap();
        let mut areas = lods[0].areas.clone();
        let (layout, atlas) = compose_atlas(&mut areas, &config(), |_, _| Rgba([0, 200, 0, 255])).unwrap();

        assert_eq!(layout.len(), areas.len());
        assert_eq!(atlas.dimensions(), (512, 512));
        for (i, area) in areas.iter().enumerate() {
            let r = layout.rects[i];
            let (lo, hi) = (
                Vec2::new(r.x as f32, r.y as f32) / 512.0,
                Vec2::new((r.x + r.width) as f32, (r.y + r.height) as f32) / 512.0,
            );
            assert!(area.uvs.iter().all(|uv| uv.cmpge(lo - 1e-5).all() && uv.cmple(hi + 1e-5).all()));
        }
        assert!(atlas.pixels().any(|p| p[3] == 255));
    }

    #[test]
    fn test_overflow_leaves_uvs_untouched() {
        let mut areas = vec![PolygonArea::empty("a", 0, crate::core::types::Vec3::X, crate::core::types::Vec3::Y, 0); 2];
        areas[0].uvs = vec![Vec2::ONE];
        let tiny = GenerationConfig { atlas_size: 4, atlas_padding: 2, ..config() };
        let result = compose_atlas(&mut areas, &tiny, |_, _| Rgba([0, 0, 0, 255]));
        assert!(matches!(result, Err(Error::PackingOverflow(_))));
        assert_eq!(areas[0].uvs, vec![Vec2::ONE]);
    }
}
