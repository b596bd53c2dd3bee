//! Fragment rasterization, atlas composition and edge dilation

use crate::atlas::AtlasLayout;
use crate::core::types::{Rgba, RgbaImage, Vec2};
use crate::core::{Error, Result};
use crate::polygon::PolygonArea;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Coverage tolerance for pixel centers on shared triangle edges
const EDGE_EPSILON: f32 = 1e-5;

/// Dilation passes for an atlas of edge length `atlas_size`
pub fn dilation_iterations(atlas_size: u32) -> u32 {
    match atlas_size {
        0..=128 => 5,
        129..=256 => 10,
        257..=512 => 20,
        513..=1024 => 40,
        1025..=2048 => 60,
        _ => 80,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBuilder {
    pub atlas_size: u32,
    pub padding: u32,
    /// Pixels per world unit
    pub texel_density: f32,
}

impl TextureBuilder {
    pub fn new(atlas_size: u32, padding: u32, texel_density: f32) -> Self {
        Self { atlas_size, padding, texel_density }
    }

    /// Pixel size of `area`'s fragment texture
    pub fn fragment_size(&self, area: &PolygonArea) -> (u32, u32) {
        area.texture_size(self.texel_density)
    }

    /// Rasterize `area` with its local UVs; covered pixels get `shade(uv)`, the rest stay transparent.
    ///
    /// Must run before the area is remapped into atlas space.
    pub fn rasterize<F>(&self, area: &PolygonArea, width: u32, height: u32, shade: F) -> RgbaImage
    where
        F: Fn(Vec2) -> Rgba<u8>,
    {
        let mut image = RgbaImage::from_pixel(width, height, TRANSPARENT);
        if width == 0 || height == 0 {
            return image;
        }
        let size = Vec2::new(width as f32, height as f32);
        for tri in area.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| area.uvs[i as usize] * size);
            let twice_area = (b - a).perp_dot(c - a);
            if twice_area.abs() <= f32::EPSILON {
                continue;
            }
            let min = a.min(b).min(c).floor().max(Vec2::ZERO);
            let max = a.max(b).max(c).ceil().min(size);
            for y in min.y as u32..max.y as u32 {
                for x in min.x as u32..max.x as u32 {
                    let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let w0 = (c - b).perp_dot(p - b) / twice_area;
                    let w1 = (a - c).perp_dot(p - c) / twice_area;
                    let w2 = 1.0 - w0 - w1;
                    if w0 >= -EDGE_EPSILON && w1 >= -EDGE_EPSILON && w2 >= -EDGE_EPSILON {
                        image.put_pixel(x, y, shade(p / size));
                    }
                }
            }
        }
        image
    }

    /// Blit `fragments[i]` into `layout.rects[i]` and dilate the result
    pub fn compose(&self, layout: &AtlasLayout, fragments: &[RgbaImage]) -> Result<RgbaImage> {
        if fragments.len() != layout.len() {
            return Err(Error::validation(format!(
                "{} fragment images for {} packed rects",
                fragments.len(),
                layout.len()
            )));
        }
        let mut atlas = RgbaImage::from_pixel(layout.atlas_size, layout.atlas_size, TRANSPARENT);
        for (rect, fragment) in layout.rects.iter().zip(fragments) {
            if fragment.dimensions() != (rect.width, rect.height) {
                return Err(Error::validation(format!(
                    "fragment {} is {:?}, packed as {}x{}",
                    rect.index,
                    fragment.dimensions(),
                    rect.width,
                    rect.height
                )));
            }
            blit(&mut atlas, fragment, rect.x, rect.y);
        }
        let iterations = dilation_iterations(layout.atlas_size);
        dilate(&mut atlas, iterations);
        log::debug!(
            "Composed {} fragments into {}x{} atlas, {} dilation passes",
            fragments.len(),
            layout.atlas_size,
            layout.atlas_size,
            iterations
        );
        Ok(atlas)
    }
}

/// Copy `source` into `target` at `(x, y)`, clipped to `target`
pub fn blit(target: &mut RgbaImage, source: &RgbaImage, x: u32, y: u32) {
    let (tw, th) = target.dimensions();
    for (sx, sy, pixel) in source.enumerate_pixels() {
        let (dx, dy) = (x + sx, y + sy);
        if dx < tw && dy < th {
            target.put_pixel(dx, dy, *pixel);
        }
    }
}

/// Grow colour outward from covered pixels (alpha > 0) for `iterations` passes.
///
/// Each pass fills uncovered pixels touching a filled pixel with the mean of
/// their filled 8-neighbours. Filled pixels keep alpha 0 so coverage is unchanged.
pub fn dilate(image: &mut RgbaImage, iterations: u32) {
    let (width, height) = image.dimensions();
    let mut filled: Vec<bool> = image.pixels().map(|p| p[3] > 0).collect();
    for _ in 0..iterations {
        let mut updates = Vec::new();
        for y in 0..height {
            for x in 0..width {
                if filled[(y * width + x) as usize] {
                    continue;
                }
                let mut sum = [0u32; 3];
                let mut count = 0u32;
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                        if (dx, dy) == (0, 0) || nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                            continue;
                        }
                        if !filled[(ny as u32 * width + nx as u32) as usize] {
                            continue;
                        }
                        let p = image.get_pixel(nx as u32, ny as u32);
                        for (s, v) in sum.iter_mut().zip(&p.0[..3]) {
                            *s += u32::from(*v);
                        }
                        count += 1;
                    }
                }
                if count > 0 {
                    let mean = sum.map(|s| (s / count) as u8);
                    updates.push((x, y, Rgba([mean[0], mean[1], mean[2], 0])));
                }
            }
        }
        if updates.is_empty() {
            break;
        }
        for (x, y, pixel) in updates {
            image.put_pixel(x, y, pixel);
            filled[(y * width + x) as usize] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasPacker;
    use crate::core::types::Vec3;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Unit square split into two triangles, local UVs covering [0, 1]
    fn square() -> PolygonArea {
        let mut area = PolygonArea::empty("sq", 0, Vec3::X, Vec3::Y, 1);
        area.points = vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        area.last_convex_point_index = 3;
        area.uvs = area.points.clone();
        area.indices = vec![0, 1, 2, 0, 2, 3];
        area
    }

    #[test]
    fn test_iteration_table() {
        assert_eq!(dilation_iterations(64), 5);
        assert_eq!(dilation_iterations(128), 5);
        assert_eq!(dilation_iterations(256), 10);
        assert_eq!(dilation_iterations(512), 20);
        assert_eq!(dilation_iterations(1024), 40);
        assert_eq!(dilation_iterations(2048), 60);
        assert_eq!(dilation_iterations(4096), 80);
        assert_eq!(dilation_iterations(8192), 80);
    }

    #[test]
    fn test_rasterize_full_square() {
        let builder = TextureBuilder::new(64, 2, 8.0);
        let image = builder.rasterize(&square(), 8, 8, |_| RED);
        assert!(image.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_rasterize_triangle_leaves_rest_transparent() {
        let mut area = square();
        area.indices.truncate(3);
        let image = TextureBuilder::new(64, 2, 8.0).rasterize(&area, 8, 8, |_| RED);
        // Triangle (0,0) (1,0) (1,1) covers the lower-right half in image space.
        assert_eq!(*image.get_pixel(7, 0), RED);
        assert_eq!(image.get_pixel(0, 7)[3], 0);
    }

    #[test]
    fn test_shade_receives_local_uv() {
        let image = TextureBuilder::new(64, 0, 4.0).rasterize(&square(), 4, 4, |uv| {
            Rgba([(uv.x * 255.0) as u8, (uv.y * 255.0) as u8, 0, 255])
        });
        assert!(image.get_pixel(3, 0)[0] > image.get_pixel(0, 0)[0]);
        assert!(image.get_pixel(0, 3)[1] > image.get_pixel(0, 0)[1]);
    }

    #[test]
    fn test_dilate_spreads_colour_without_alpha() {
        let mut image = RgbaImage::from_pixel(5, 5, TRANSPARENT);
        image.put_pixel(2, 2, RED);
        dilate(&mut image, 1);
        assert_eq!(*image.get_pixel(1, 1), Rgba([255, 0, 0, 0]));
        assert_eq!(*image.get_pixel(0, 0), TRANSPARENT);
        assert_eq!(*image.get_pixel(2, 2), RED);
        dilate(&mut image, 1);
        // Second call starts from alpha coverage only.
        assert_eq!(*image.get_pixel(0, 0), TRANSPARENT);

        let mut image = RgbaImage::from_pixel(5, 5, TRANSPARENT);
        image.put_pixel(2, 2, RED);
        dilate(&mut image, 2);
        assert_eq!(*image.get_pixel(0, 0), Rgba([255, 0, 0, 0]));
    }

    #[test]
    fn test_dilate_averages_neighbours() {
        let mut image = RgbaImage::from_pixel(3, 1, TRANSPARENT);
        image.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        image.put_pixel(2, 0, Rgba([0, 100, 0, 255]));
        dilate(&mut image, 1);
        assert_eq!(*image.get_pixel(1, 0), Rgba([100, 50, 0, 0]));
    }

    #[test]
    fn test_compose_places_fragments() {
        let builder = TextureBuilder::new(64, 2, 4.0);
        let layout = AtlasPacker::new(64, 2).pack(&[(4, 4), (2, 2)]).unwrap();
        let fragments = vec![
            builder.rasterize(&square(), 4, 4, |_| RED),
            RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255])),
        ];
        let atlas = builder.compose(&layout, &fragments).unwrap();
        let r0 = layout.rects[0];
        let r1 = layout.rects[1];
        assert_eq!(*atlas.get_pixel(r0.x, r0.y), RED);
        assert_eq!(*atlas.get_pixel(r1.x + 1, r1.y + 1), Rgba([0, 0, 255, 255]));
        assert_eq!(atlas.get_pixel(r0.x - 1, r0.y)[3], 0);
        assert_eq!(atlas.get_pixel(r0.x - 1, r0.y)[0], 255);
    }

    #[test]
    fn test_compose_rejects_mismatched_fragments() {
        let builder = TextureBuilder::new(64, 0, 4.0);
        let layout = AtlasPacker::new(64, 0).pack(&[(4, 4)]).unwrap();
        assert!(builder.compose(&layout, &[]).is_err());
        assert!(builder.compose(&layout, &[RgbaImage::new(3, 4)]).is_err());
    }
}
