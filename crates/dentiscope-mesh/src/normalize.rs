//! Centering and scaling of loaded geometry.
//!
//! Every model is brought into a common frame before display: the bounding
//! box is centered at the origin, vertex normals are recomputed, and the
//! geometry is uniformly scaled so the largest bounding-box dimension is
//! [`TARGET_EXTENT`]. The applied transform is kept so measurements can be
//! converted back to source units.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::buffers::MeshBuffers;
use crate::error::{LoadError, LoadResult};
use crate::format::MeshFormat;

/// Largest bounding-box dimension of a normalized mesh.
pub const TARGET_EXTENT: f32 = 2.0;

/// The transform applied during normalization: `normalized = (source - center) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub center: Vec3,
    pub scale: f32,
    /// Bounding box of the geometry before normalization.
    pub source_bounds: Aabb,
}

impl Normalization {
    /// Maps a normalized position back to source coordinates.
    #[must_use]
    pub fn to_source(&self, point: Vec3) -> Vec3 {
        point / self.scale + self.center
    }

    /// Maps a source position into the normalized frame.
    #[must_use]
    pub fn to_normalized(&self, point: Vec3) -> Vec3 {
        (point - self.center) * self.scale
    }

    /// Source units per normalized unit. Multiplying a normalized distance by
    /// this gives the distance in the units the file was authored in.
    #[must_use]
    pub fn source_units_per_unit(&self) -> f32 {
        1.0 / self.scale
    }
}

/// A mesh in the normalized display frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMesh {
    geometry: MeshBuffers,
    normalization: Normalization,
    format: Option<MeshFormat>,
}

impl NormalizedMesh {
    /// Geometry in the normalized frame.
    #[must_use]
    pub fn geometry(&self) -> &MeshBuffers {
        &self.geometry
    }

    #[must_use]
    pub fn normalization(&self) -> &Normalization {
        &self.normalization
    }

    /// The format the mesh was loaded from (`None` for generated meshes).
    #[must_use]
    pub fn format(&self) -> Option<MeshFormat> {
        self.format
    }

    /// Returns true for the generated placeholder shown before a model loads.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.format.is_none()
    }

    /// Bounding box in the normalized frame.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.geometry.bounds().unwrap_or(Aabb {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        })
    }

    /// Geometry mapped back to source coordinates, e.g. for export.
    #[must_use]
    pub fn source_geometry(&self) -> MeshBuffers {
        let n = &self.normalization;
        self.geometry.clone().scaled(1.0 / n.scale, n.center)
    }
}

/// Centers, re-normals and scales raw geometry.
///
/// Fails with [`LoadError::ParseFailure`] if the geometry has no vertices or
/// a zero-size bounding box, since no finite scale exists for it.
pub fn normalize(mut raw: MeshBuffers, format: Option<MeshFormat>) -> LoadResult<NormalizedMesh> {
    raw.validate().map_err(LoadError::parse)?;
    let bounds = raw
        .bounds()
        .ok_or_else(|| LoadError::parse("model contains no vertices"))?;
    let extent = bounds.max_extent();
    if !(extent.is_finite() && extent > 0.0) {
        return Err(LoadError::parse(format!(
            "model has degenerate extent {extent}"
        )));
    }

    let center = bounds.center();
    let scale = TARGET_EXTENT / extent;

    for p in &mut raw.positions {
        *p -= center;
    }
    raw.compute_vertex_normals();
    for p in &mut raw.positions {
        *p *= scale;
    }

    log::debug!(
        "normalized {} vertices / {} triangles (extent {extent}, scale {scale})",
        raw.vertex_count(),
        raw.triangle_count()
    );

    Ok(NormalizedMesh {
        geometry: raw,
        normalization: Normalization {
            center,
            scale,
            source_bounds: bounds,
        },
        format,
    })
}

/// A unit box shown while no model is loaded.
#[must_use]
pub fn placeholder() -> NormalizedMesh {
    // Four vertices per face so each face shades flat.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    let mut positions = Vec::with_capacity(24);
    let mut triangles = Vec::with_capacity(12);
    for (normal, u, v) in FACES {
        let base = positions.len() as u32;
        positions.extend([
            normal - u - v,
            normal + u - v,
            normal + u + v,
            normal - u + v,
        ]);
        triangles.push([base, base + 1, base + 2]);
        triangles.push([base, base + 2, base + 3]);
    }
    let mut geometry = MeshBuffers::new(positions, triangles);
    geometry.compute_vertex_normals();
    NormalizedMesh {
        geometry,
        normalization: Normalization {
            center: Vec3::ZERO,
            scale: 1.0,
            source_bounds: Aabb {
                min: Vec3::NEG_ONE,
                max: Vec3::ONE,
            },
        },
        format: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_offset_box() {
        let raw = MeshBuffers::new(
            vec![
                Vec3::new(10.0, 20.0, 30.0),
                Vec3::new(14.0, 20.0, 30.0),
                Vec3::new(10.0, 21.0, 32.0),
            ],
            vec![[0, 1, 2]],
        );
        let mesh = normalize(raw, Some(MeshFormat::Stl)).expect("valid");
        let bounds = mesh.bounds();
        assert!((bounds.max_extent() - TARGET_EXTENT).abs() < 1e-6);
        assert!(bounds.center().length() < 1e-6);
        assert_eq!(mesh.normalization().scale, 0.5);
        assert_eq!(mesh.normalization().center, Vec3::new(12.0, 20.5, 31.0));

        let back = mesh.normalization().to_source(mesh.geometry().positions[1]);
        assert!((back - Vec3::new(14.0, 20.0, 30.0)).length() < 1e-5);
    }

    #[test]
    fn test_normals_are_unit() {
        let raw = MeshBuffers::new(
            vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0)],
            vec![[0, 1, 2]],
        );
        let mesh = normalize(raw, None).expect("valid");
        for n in &mesh.geometry().normals {
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_geometry_rejected() {
        assert!(matches!(
            normalize(MeshBuffers::default(), None),
            Err(LoadError::ParseFailure(_))
        ));
        let single = MeshBuffers::new(vec![Vec3::ONE, Vec3::ONE], Vec::new());
        assert!(matches!(normalize(single, None), Err(LoadError::ParseFailure(_))));
    }

    #[test]
    fn test_placeholder_is_normalized_box() {
        let mesh = placeholder();
        assert!(mesh.is_placeholder());
        assert_eq!(mesh.geometry().triangle_count(), 12);
        assert!((mesh.bounds().max_extent() - TARGET_EXTENT).abs() < 1e-6);
        // Faces wind outward.
        for i in 0..mesh.geometry().triangle_count() {
            let [a, b, c] = mesh.geometry().triangle(i);
            let centroid = (a + b + c) / 3.0;
            assert!(mesh.geometry().face_normal(i).dot(centroid) > 0.0);
        }
    }
}
