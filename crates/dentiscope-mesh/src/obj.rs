//! Wavefront OBJ reader (via `tobj`) and writer.

use std::io::Write;

use glam::Vec3;

use crate::buffers::MeshBuffers;
use crate::error::{LoadError, LoadResult};

/// Parses OBJ text. All objects in the file are merged into one mesh.
///
/// Material libraries are not resolved; `mtllib` references are ignored.
pub fn parse(bytes: &[u8]) -> LoadResult<MeshBuffers> {
    let mut reader = bytes;
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) =
        tobj::load_obj_buf(&mut reader, &options, |_| Err(tobj::LoadError::OpenFileFailed))
            .map_err(|e| LoadError::parse(format!("invalid OBJ: {e}")))?;

    let parts: Vec<MeshBuffers> = models
        .iter()
        .map(|model| {
            let mesh = &model.mesh;
            let positions: Vec<Vec3> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            let triangles = mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect();
            let mut part = MeshBuffers::new(positions, triangles);
            if mesh.vertex_color.len() == mesh.positions.len() {
                part.colors = Some(
                    mesh.vertex_color
                        .chunks_exact(3)
                        .map(|c| Vec3::new(c[0], c[1], c[2]))
                        .collect(),
                );
            }
            part
        })
        .collect();

    let merged = MeshBuffers::merge(&parts);
    if merged.positions.is_empty() {
        return Err(LoadError::parse("OBJ file contains no geometry"));
    }
    merged.validate().map_err(LoadError::parse)?;
    log::debug!(
        "read OBJ with {} object(s), {} vertices / {} triangles",
        models.len(),
        merged.vertex_count(),
        merged.triangle_count()
    );
    Ok(merged)
}

/// Writes OBJ text with `v` (plus `r g b` when colored), `vn` and `f` records.
pub fn write(mesh: &MeshBuffers) -> LoadResult<Vec<u8>> {
    let mut out = Vec::with_capacity(mesh.vertex_count() * 48 + mesh.triangle_count() * 24);
    write_records(&mut out, mesh)?;
    Ok(out)
}

fn write_records(out: &mut impl Write, mesh: &MeshBuffers) -> std::io::Result<()> {
    writeln!(out, "# exported by dentiscope")?;
    for (i, p) in mesh.positions.iter().enumerate() {
        match mesh.colors.as_ref().and_then(|c| c.get(i)) {
            Some(c) => writeln!(out, "v {} {} {} {} {} {}", p.x, p.y, p.z, c.x, c.y, c.z)?,
            None => writeln!(out, "v {} {} {}", p.x, p.y, p.z)?,
        }
    }
    let has_normals = mesh.normals.len() == mesh.vertex_count();
    if has_normals {
        for n in &mesh.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }
    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| i + 1);
        if has_normals {
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        } else {
            writeln!(out, "f {a} {b} {c}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = "# test
o first
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 5 6 7
";

    #[test]
    fn test_quads_triangulated_and_objects_merged() {
        let mesh = parse(TWO_OBJECTS.as_bytes()).expect("valid OBJ");
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex_count(), 7);
        assert!(mesh.colors.is_none());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            parse(b"# nothing here\n"),
            Err(LoadError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_write_then_parse() {
        let mut mesh = parse(TWO_OBJECTS.as_bytes()).expect("valid OBJ");
        mesh.compute_vertex_normals();
        let text = String::from_utf8(write(&mesh).expect("writable")).expect("UTF-8");
        assert!(text.contains("vn "));
        assert!(text.contains("f 1//1 2//2 3//3"));
        let back = parse(text.as_bytes()).expect("re-readable");
        assert_eq!(back.triangle_count(), mesh.triangle_count());
        assert_eq!(back.bounds(), mesh.bounds());
    }
}
