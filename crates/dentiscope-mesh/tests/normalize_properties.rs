//! Normalization properties over arbitrary geometry.

use dentiscope_mesh::{export, load, normalize, MeshBuffers, MeshFormat, TARGET_EXTENT};
use glam::Vec3;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Vec3> {
    (-500.0f32..500.0, -500.0f32..500.0, -500.0f32..500.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

/// Axis-aligned box triangles from a corner and edge lengths.
fn cube(min: Vec3, size: f32) -> MeshBuffers {
    let corner = |i: u32| {
        min + Vec3::new(
            (i & 1) as f32 * size,
            ((i >> 1) & 1) as f32 * size,
            ((i >> 2) & 1) as f32 * size,
        )
    };
    let positions = (0..8).map(corner).collect();
    let triangles = vec![
        [0, 2, 1], [1, 2, 3], // -z
        [4, 5, 6], [5, 7, 6], // +z
        [0, 1, 4], [1, 5, 4], // -y
        [2, 6, 3], [3, 6, 7], // +y
        [0, 4, 2], [2, 4, 6], // -x
        [1, 3, 5], [3, 7, 5], // +x
    ];
    MeshBuffers::new(positions, triangles)
}

proptest! {
    #[test]
    fn normalized_extent_and_center(points in prop::collection::vec(point(), 3..64)) {
        let raw = MeshBuffers::new(points, Vec::new());
        let extent = raw.bounds().map(|b| b.max_extent()).unwrap_or(0.0);
        prop_assume!(extent > 1e-3);

        let mesh = normalize(raw, None).expect("non-degenerate");
        let bounds = mesh.bounds();
        prop_assert!((bounds.max_extent() - TARGET_EXTENT).abs() < 1e-4);
        prop_assert!(bounds.center().length() < 1e-4);
    }

    #[test]
    fn source_mapping_inverts(points in prop::collection::vec(point(), 3..32)) {
        let raw = MeshBuffers::new(points.clone(), Vec::new());
        prop_assume!(raw.bounds().is_some_and(|b| b.max_extent() > 1.0));
        let mesh = normalize(raw, None).expect("non-degenerate");
        for (original, normalized) in points.iter().zip(&mesh.geometry().positions) {
            let back = mesh.normalization().to_source(*normalized);
            prop_assert!((back - *original).length() < 1e-2);
        }
    }
}

#[test]
fn ten_millimeter_cube_measures_in_millimeters() {
    let stl = export::write_stl(&cube(Vec3::new(3.0, -7.0, 12.0), 10.0));
    let mesh = load(&stl, MeshFormat::Stl).expect("valid STL");

    assert!((mesh.bounds().max_extent() - 2.0).abs() < 1e-6);
    let mm_per_unit = mesh.normalization().source_units_per_unit();
    assert!((mm_per_unit - 5.0).abs() < 1e-5);

    let b = mesh.bounds();
    let diagonal = b.min.distance(b.max);
    assert!((diagonal - 2.0 * 3f32.sqrt()).abs() < 1e-5);
    assert!((diagonal * mm_per_unit - 10.0 * 3f32.sqrt()).abs() < 1e-4);
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    // The file does not exist; an I/O error would mean the read was attempted.
    let err = dentiscope_mesh::load_file("/nonexistent/scan.png").expect_err("png rejected");
    assert!(matches!(err, dentiscope_mesh::LoadError::UnsupportedFormat(ref e) if e == "png"));
}

#[test]
fn cube_normals_point_outward() {
    let mesh = normalize(cube(Vec3::ZERO, 4.0), None).expect("valid");
    let geometry = mesh.geometry();
    for (p, n) in geometry.positions.iter().zip(&geometry.normals) {
        assert!(p.dot(*n) > 0.0);
    }
}
