//! Ray picking against the displayed model.

use dentiscope_core::PickPoint;
use dentiscope_mesh::MeshBuffers;

use crate::camera::{ray_intersect_triangle, Ray};

/// How close (in world units) a ray must pass to a vertex of a point set.
pub const POINT_PICK_RADIUS: f32 = 0.03;

/// Finds the nearest surface point hit by `ray`.
///
/// Triangle meshes are intersected face by face. Point sets pick the vertex
/// closest to the ray within [`POINT_PICK_RADIUS`]. The returned depth is the
/// distance along the ray.
#[must_use]
pub fn pick_mesh(mesh: &MeshBuffers, ray: &Ray) -> Option<PickPoint> {
    if mesh.triangles.is_empty() {
        return pick_points(mesh, ray);
    }
    (0..mesh.triangle_count())
        .filter_map(|i| {
            let [v0, v1, v2] = mesh.triangle(i);
            ray_intersect_triangle(ray, v0, v1, v2)
        })
        .min_by(f32::total_cmp)
        .map(|t| PickPoint::with_depth(ray.at(t), t))
}

fn pick_points(mesh: &MeshBuffers, ray: &Ray) -> Option<PickPoint> {
    mesh.positions
        .iter()
        .filter_map(|p| {
            let t = (*p - ray.origin).dot(ray.direction);
            let miss = ray.at(t).distance(*p);
            (t > 0.0 && miss <= POINT_PICK_RADIUS).then_some((t, *p))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(t, p)| PickPoint::with_depth(p, t))
}
