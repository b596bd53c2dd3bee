//! Fragment extraction: select, project, hull, triangulate, bound

use crate::core::types::{Vec2, Vec3};
use crate::core::Warning;
use crate::math::hull::{convex_hull, min_area_rect, AREA_EPSILON};
use crate::math::{ContentHasher, OrientedRect, Rect};
use crate::mesh::MeshData;
use crate::polygon::{Fragment, PolygonArea};

/// Projected points closer than this are merged
const MERGE_EPSILON: f32 = 1e-6;

/// Triangles and vertices of a composite mesh picked by a fragment
#[derive(Debug, Clone, Default)]
struct Selection {
    triangles: Vec<usize>,
    /// Sorted unique vertex indices used by `triangles`
    vertices: Vec<u32>,
}

/// Stateless extractor of [`PolygonArea`]s
pub struct PolygonAreaBuilder;

impl PolygonAreaBuilder {
    fn select(composite: &MeshData, fragment: &Fragment) -> Selection {
        let mut selection = Selection::default();
        for (t, tri) in composite.indices.chunks_exact(3).enumerate() {
            let id = composite.triangle_ids.get(t).copied().unwrap_or(0);
            if !fragment.selects(id) {
                continue;
            }
            if tri.iter().all(|&i| fragment.plane.is_behind(composite.positions[i as usize])) {
                continue;
            }
            selection.triangles.push(t);
            selection.vertices.extend_from_slice(tri);
        }
        selection.vertices.sort_unstable();
        selection.vertices.dedup();
        selection
    }

    fn hash(composite: &MeshData, fragment: &Fragment, selection: &Selection) -> u64 {
        let mut hasher = ContentHasher::new();
        fragment.hash_into(&mut hasher);
        hasher.write_u64(selection.triangles.len() as u64);
        for &t in &selection.triangles {
            for &i in &composite.indices[t * 3..t * 3 + 3] {
                for v in composite.positions[i as usize].to_array() {
                    hasher.write_f32(v);
                }
            }
        }
        hasher.finish()
    }

    /// Content hash of the fragment definition and the geometry it selects
    pub fn fragment_hash(composite: &MeshData, fragment: &Fragment) -> u64 {
        let selection = Self::select(composite, fragment);
        Self::hash(composite, fragment, &selection)
    }

    /// Extract the fragment's polygon area from `composite`.
    ///
    /// Empty selections and zero-area hulls give an empty area and a
    /// [`Warning::ZeroAreaFragment`].
    pub fn extract_fragment(composite: &MeshData, fragment: &Fragment) -> PolygonArea {
        let selection = Self::select(composite, fragment);
        let hash = Self::hash(composite, fragment, &selection);
        let plane = &fragment.plane;
        let empty = || {
            Warning::ZeroAreaFragment { name: fragment.name.clone() }.emit();
            PolygonArea::empty(fragment.name.clone(), fragment.lod, plane.normal, plane.up, hash)
        };

        let Some(basis) = plane.basis() else {
            log::warn!("fragment '{}' has a degenerate plane basis", fragment.name);
            return empty();
        };

        let projected = merge_points(
            selection.vertices.iter().map(|&i| basis.project(composite.positions[i as usize])).collect(),
        );
        let hull = convex_hull(&projected);
        if hull.len() < 3 {
            return empty();
        }

        // Hull first, then interior topology points
        let mut points: Vec<Vec2> = hull.iter().map(|&i| projected[i]).collect();
        let last_convex_point_index = points.len() - 1;
        let mut on_hull = vec![false; projected.len()];
        hull.iter().for_each(|&i| on_hull[i] = true);

        let mut triangles: Vec<[u32; 3]> = (1..points.len() as u32 - 1).map(|i| [0, i, i + 1]).collect();
        for (i, &p) in projected.iter().enumerate() {
            if !on_hull[i] && !insert_point(&mut triangles, &mut points, p) {
                log::debug!("fragment '{}': topology point {:?} outside the hull fan", fragment.name, p);
            }
        }

        let aabb = Rect::from_points(&points[..=last_convex_point_index])
            .unwrap_or_else(|| Rect::new(Vec2::ZERO, Vec2::ZERO));
        let hull_points = &points[..=last_convex_point_index];
        let obb = match min_area_rect(hull_points) {
            Some(obb) => obb,
            None => {
                Warning::CollinearHull { name: fragment.name.clone() }.emit();
                OrientedRect::from_rect(&aabb)
            }
        };

        let depth = plane.offset.unwrap_or(0.0);
        let size = aabb.size();
        let uv = |p: Vec2| {
            let local = p - aabb.min;
            Vec2::new(
                if size.x > 0.0 { local.x / size.x } else { 0.0 },
                if size.y > 0.0 { local.y / size.y } else { 0.0 },
            )
        };

        // Counter-clockwise in (right, up) faces -normal, so flip to face the normal
        let indices = triangles.iter().flat_map(|&[a, b, c]| [a, c, b]).collect();

        PolygonArea {
            name: fragment.name.clone(),
            lod: fragment.lod,
            positions: points.iter().map(|&p| basis.unproject(p, depth)).collect(),
            normals: vec![basis.normal; points.len()],
            tangents: vec![basis.right.extend(1.0); points.len()],
            uvs: points.iter().map(|&p| uv(p)).collect(),
            indices,
            points,
            last_convex_point_index,
            aabb,
            obb,
            plane_normal: basis.normal,
            plane_up: basis.up,
            hash,
        }
    }
}

/// Sort and merge coincident points
fn merge_points(mut points: Vec<Vec2>) -> Vec<Vec2> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup_by(|a, b| a.distance_squared(*b) <= MERGE_EPSILON * MERGE_EPSILON);
    points
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`
fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Option<Vec3> {
    let denom = (b - a).perp_dot(c - a);
    if denom.abs() <= AREA_EPSILON {
        return None;
    }
    let u = (b - p).perp_dot(c - p) / denom;
    let v = (c - p).perp_dot(a - p) / denom;
    Some(Vec3::new(u, v, 1.0 - u - v))
}

/// Split every triangle containing `p` around it; degenerate pieces are dropped.
///
/// A point on a shared edge splits both neighbours. Returns false (and adds
/// nothing) when no triangle contains `p`.
fn insert_point(triangles: &mut Vec<[u32; 3]>, points: &mut Vec<Vec2>, p: Vec2) -> bool {
    const INSIDE_EPSILON: f32 = -1e-5;
    let containing: Vec<usize> = triangles
        .iter()
        .enumerate()
        .filter(|(_, tri)| {
            let [a, b, c] = **tri;
            barycentric(p, points[a as usize], points[b as usize], points[c as usize])
                .is_some_and(|w| w.min_element() >= INSIDE_EPSILON)
        })
        .map(|(t, _)| t)
        .collect();
    if containing.is_empty() {
        return false;
    }

    let index = points.len() as u32;
    points.push(p);
    for &t in containing.iter().rev() {
        let [a, b, c] = triangles.swap_remove(t);
        for tri in [[a, b, index], [b, c, index], [c, a, index]] {
            let [x, y, z] = tri.map(|i| points[i as usize]);
            if (y - x).perp_dot(z - x).abs() > AREA_EPSILON {
                triangles.push(tri);
            }
        }
    }
    true
}
