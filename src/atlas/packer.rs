//! Deterministic shelf packer for fragment textures

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;
use crate::core::{Error, Result};
use crate::math::Rect;
use crate::polygon::PolygonArea;

/// Maps a fragment's local `[0, 1]` UVs onto its atlas rect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvTransform {
    pub scale: Vec2,
    pub offset: Vec2,
}

impl UvTransform {
    pub const IDENTITY: Self = Self { scale: Vec2::ONE, offset: Vec2::ZERO };

    #[inline]
    pub fn apply(&self, uv: Vec2) -> Vec2 {
        uv * self.scale + self.offset
    }
}

/// Content rect of one fragment in atlas pixels (padding excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedRect {
    /// Position in the input slice
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of a successful pack; `rects[i]` belongs to input `i`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub atlas_size: u32,
    pub padding: u32,
    pub rects: Vec<PackedRect>,
}

impl AtlasLayout {
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn uv_transform(&self, index: usize) -> Option<UvTransform> {
        let r = self.rects.get(index)?;
        let size = self.atlas_size as f32;
        Some(UvTransform {
            scale: Vec2::new(r.width as f32, r.height as f32) / size,
            offset: Vec2::new(r.x as f32, r.y as f32) / size,
        })
    }

    /// Slot occupied by `index` including its padding, in pixels
    pub fn padded_rect(&self, index: usize) -> Option<Rect> {
        let r = self.rects.get(index)?;
        let p = self.padding as f32;
        Some(Rect::from_origin_size(
            r.x as f32 - p,
            r.y as f32 - p,
            r.width as f32 + 2.0 * p,
            r.height as f32 + 2.0 * p,
        ))
    }

    /// Rewrite `area`'s UVs into atlas space
    pub fn remap(&self, index: usize, area: &mut PolygonArea) -> Result<()> {
        let transform = self
            .uv_transform(index)
            .ok_or_else(|| Error::validation(format!("no atlas rect for fragment {index}")))?;
        for uv in &mut area.uvs {
            *uv = transform.apply(*uv);
        }
        Ok(())
    }
}

pub struct AtlasPacker {
    atlas_size: u32,
    padding: u32,
}

impl AtlasPacker {
    pub fn new(atlas_size: u32, padding: u32) -> Self {
        Self { atlas_size, padding }
    }

    /// Pack `sizes` (content width, height) into shelves, tallest first.
    ///
    /// Fails with `PackingOverflow` rather than dropping entries.
    pub fn pack(&self, sizes: &[(u32, u32)]) -> Result<AtlasLayout> {
        if self.atlas_size == 0 {
            return Err(Error::validation("atlas size must be positive"));
        }
        if let Some(i) = sizes.iter().position(|&(w, h)| w == 0 || h == 0) {
            return Err(Error::validation(format!("fragment {i} has zero size")));
        }

        let pad = 2 * u64::from(self.padding);
        let size = u64::from(self.atlas_size);
        let padded = |(w, h): (u32, u32)| (u64::from(w) + pad, u64::from(h) + pad);

        let total: u64 = sizes.iter().map(|&s| padded(s)).map(|(w, h)| w * h).sum();
        if total > size * size {
            return Err(Error::PackingOverflow(format!(
                "{} padded pixels exceed {}x{} atlas",
                total, self.atlas_size, self.atlas_size
            )));
        }

        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1).then(a.cmp(&b)));

        let mut rects = vec![PackedRect { index: 0, x: 0, y: 0, width: 0, height: 0 }; sizes.len()];
        let (mut cursor_x, mut shelf_y, mut shelf_height) = (0u64, 0u64, 0u64);
        let mut shelves = 0usize;
        for index in order {
            let (w, h) = padded(sizes[index]);
            if w > size {
                return Err(Error::PackingOverflow(format!(
                    "fragment {index} is {w}px wide padded, atlas is {}",
                    self.atlas_size
                )));
            }
            if cursor_x + w > size {
                shelf_y += shelf_height;
                cursor_x = 0;
                shelf_height = 0;
            }
            if shelf_y + h > size {
                return Err(Error::PackingOverflow(format!(
                    "shelves exceed atlas height {} at fragment {index}",
                    self.atlas_size
                )));
            }
            if cursor_x == 0 {
                shelves += 1;
            }
            // Every coordinate is bounded by atlas_size, so it fits in u32.
            rects[index] = PackedRect {
                index,
                x: (cursor_x as u32) + self.padding,
                y: (shelf_y as u32) + self.padding,
                width: sizes[index].0,
                height: sizes[index].1,
            };
            cursor_x += w;
            shelf_height = shelf_height.max(h);
        }

        log::debug!(
            "Packed {} fragments into {}x{} atlas ({} shelves)",
            sizes.len(),
            self.atlas_size,
            self.atlas_size,
            shelves
        );
        Ok(AtlasLayout { atlas_size: self.atlas_size, padding: self.padding, rects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;

    fn overlaps(a: &Rect, b: &Rect) -> bool {
        a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
    }

    #[test]
    fn test_three_fragments_fit_without_overlap() {
        let layout = AtlasPacker::new(256, 5).pack(&[(64, 64); 3]).unwrap();
        assert_eq!(layout.len(), 3);
        for i in 0..3 {
            let a = layout.padded_rect(i).unwrap();
            assert!(a.min.x >= 0.0 && a.min.y >= 0.0);
            assert!(a.max.x <= 256.0 && a.max.y <= 256.0);
            for j in (i + 1)..3 {
                assert!(!overlaps(&a, &layout.padded_rect(j).unwrap()));
            }
        }
        assert_eq!(layout.rects[0], PackedRect { index: 0, x: 5, y: 5, width: 64, height: 64 });
        assert_eq!(layout.rects[1].x, 79);
    }

    #[test]
    fn test_tallest_first_then_next_shelf() {
        let layout = AtlasPacker::new(100, 0).pack(&[(60, 10), (60, 40), (30, 20)]).unwrap();
        assert_eq!((layout.rects[1].x, layout.rects[1].y), (0, 0));
        assert_eq!((layout.rects[2].x, layout.rects[2].y), (60, 0));
        assert_eq!((layout.rects[0].x, layout.rects[0].y), (0, 40));
    }

    #[test]
    fn test_uv_corners_round_trip() {
        let layout = AtlasPacker::new(256, 5).pack(&[(64, 32), (16, 48)]).unwrap();
        for (i, r) in layout.rects.iter().enumerate() {
            let t = layout.uv_transform(i).unwrap();
            let min = t.apply(Vec2::ZERO) * 256.0;
            let max = t.apply(Vec2::ONE) * 256.0;
            assert!((min - Vec2::new(r.x as f32, r.y as f32)).length() < 1e-3);
            assert!((max - Vec2::new((r.x + r.width) as f32, (r.y + r.height) as f32)).length() < 1e-3);
            let right = t.apply(Vec2::X) * 256.0;
            let top = t.apply(Vec2::Y) * 256.0;
            assert!((right - Vec2::new((r.x + r.width) as f32, r.y as f32)).length() < 1e-3);
            assert!((top - Vec2::new(r.x as f32, (r.y + r.height) as f32)).length() < 1e-3);
            let back = (min / 256.0 - t.offset) / t.scale;
            assert!(back.length() < 1e-5);
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let packer = AtlasPacker::new(128, 4);
        assert!(matches!(packer.pack(&[(64, 64); 4]), Err(Error::PackingOverflow(_))));
        assert!(matches!(packer.pack(&[(200, 10)]), Err(Error::PackingOverflow(_))));
        // Area fits, shelves do not.
        assert!(matches!(
            AtlasPacker::new(100, 0).pack(&[(60, 60), (60, 50)]),
            Err(Error::PackingOverflow(_))
        ));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(AtlasPacker::new(64, 0).pack(&[(0, 4)]), Err(Error::Validation(_))));
        assert!(matches!(AtlasPacker::new(0, 0).pack(&[]), Err(Error::Validation(_))));
        assert!(AtlasPacker::new(64, 0).pack(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_remap_moves_uvs_into_rect() {
        let layout = AtlasPacker::new(128, 2).pack(&[(32, 32)]).unwrap();
        let mut area = PolygonArea::empty("a", 0, Vec3::Z, Vec3::Y, 0);
        area.uvs = vec![Vec2::ZERO, Vec2::ONE];
        layout.remap(0, &mut area).unwrap();
        assert_eq!(area.uvs[0], Vec2::splat(2.0 / 128.0));
        assert_eq!(area.uvs[1], Vec2::splat(34.0 / 128.0));
        assert!(layout.remap(1, &mut area).is_err());
    }
}
