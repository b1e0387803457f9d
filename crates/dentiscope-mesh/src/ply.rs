//! PLY reader and writer built on `ply-rs`.

use std::io::Cursor;

use glam::Vec3;
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use crate::buffers::MeshBuffers;
use crate::error::{LoadError, LoadResult};

fn scalar(property: &Property) -> Option<f32> {
    Some(match *property {
        Property::Char(v) => f32::from(v),
        Property::UChar(v) => f32::from(v),
        Property::Short(v) => f32::from(v),
        Property::UShort(v) => f32::from(v),
        Property::Int(v) => v as f32,
        Property::UInt(v) => v as f32,
        Property::Float(v) => v,
        Property::Double(v) => v as f32,
        _ => return None,
    })
}

fn index_list(property: &Property) -> Option<Vec<u32>> {
    match property {
        Property::ListChar(v) => v.iter().map(|&i| u32::try_from(i).ok()).collect(),
        Property::ListUChar(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
        Property::ListShort(v) => v.iter().map(|&i| u32::try_from(i).ok()).collect(),
        Property::ListUShort(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
        Property::ListInt(v) => v.iter().map(|&i| u32::try_from(i).ok()).collect(),
        Property::ListUInt(v) => Some(v.clone()),
        _ => None,
    }
}

/// Reads a color channel. Integer channels are 0-255, float channels 0-1.
fn channel(property: &Property) -> Option<f32> {
    match property {
        Property::Float(_) | Property::Double(_) => scalar(property),
        other => scalar(other).map(|v| v / 255.0),
    }
}

fn coordinate(element: &DefaultElement, name: &str, row: usize) -> LoadResult<f32> {
    element
        .get(name)
        .and_then(scalar)
        .ok_or_else(|| LoadError::parse(format!("vertex {row} has no numeric '{name}'")))
}

/// Parses PLY bytes (ASCII or binary).
///
/// Faces are optional; a file with only vertices loads as a point set.
/// Polygons are fan-triangulated. Per-vertex `red`/`green`/`blue` become
/// vertex colors when every vertex has them.
pub fn parse(bytes: &[u8]) -> LoadResult<MeshBuffers> {
    let parser = Parser::<DefaultElement>::new();
    let mut reader = Cursor::new(bytes);
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| LoadError::parse(format!("invalid PLY: {e}")))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| LoadError::parse("PLY has no vertex element"))?;

    let mut positions = Vec::with_capacity(vertices.len());
    let mut colors = Vec::with_capacity(vertices.len());
    for (row, vertex) in vertices.iter().enumerate() {
        positions.push(Vec3::new(
            coordinate(vertex, "x", row)?,
            coordinate(vertex, "y", row)?,
            coordinate(vertex, "z", row)?,
        ));
        let rgb = ["red", "green", "blue"].map(|c| vertex.get(c).and_then(channel));
        if let [Some(r), Some(g), Some(b)] = rgb {
            colors.push(Vec3::new(r, g, b));
        }
    }

    let mut triangles = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        for (row, face) in faces.iter().enumerate() {
            let indices = face
                .get("vertex_indices")
                .or_else(|| face.get("vertex_index"))
                .and_then(index_list)
                .ok_or_else(|| LoadError::parse(format!("face {row} has no index list")))?;
            if indices.len() < 3 {
                log::warn!("skipping PLY face {row} with {} indices", indices.len());
                continue;
            }
            for i in 1..indices.len() - 1 {
                triangles.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    let mut mesh = MeshBuffers::new(positions, triangles);
    if !colors.is_empty() && colors.len() == mesh.vertex_count() {
        mesh.colors = Some(colors);
    }
    mesh.validate().map_err(LoadError::parse)?;
    log::debug!(
        "read PLY with {} vertices / {} triangles (colors: {})",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.colors.is_some()
    );
    Ok(mesh)
}

fn float_def(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::Float))
}

fn uchar_def(name: &str) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(ScalarType::UChar))
}

fn to_uchar(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes an ASCII PLY with positions, normals, optional colors and faces.
pub fn write(mesh: &MeshBuffers) -> LoadResult<Vec<u8>> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("exported by dentiscope".to_string());

    let has_normals = mesh.normals.len() == mesh.vertex_count();
    let mut vertex_def = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        vertex_def.properties.add(float_def(name));
    }
    if has_normals {
        for name in ["nx", "ny", "nz"] {
            vertex_def.properties.add(float_def(name));
        }
    }
    if mesh.colors.is_some() {
        for name in ["red", "green", "blue"] {
            vertex_def.properties.add(uchar_def(name));
        }
    }
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_def);

    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut element = DefaultElement::new();
            for (name, v) in ["x", "y", "z"].iter().zip(p.to_array()) {
                element.insert((*name).to_string(), Property::Float(v));
            }
            if has_normals {
                let n = mesh.normals[i];
                for (name, v) in ["nx", "ny", "nz"].iter().zip(n.to_array()) {
                    element.insert((*name).to_string(), Property::Float(v));
                }
            }
            if let Some(colors) = &mesh.colors {
                for (name, v) in ["red", "green", "blue"].iter().zip(colors[i].to_array()) {
                    element.insert((*name).to_string(), Property::UChar(to_uchar(v)));
                }
            }
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let faces = mesh
        .triangles
        .iter()
        .map(|tri| {
            let mut element = DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                Property::ListInt(tri.iter().map(|&i| i as i32).collect()),
            );
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), faces);

    ply.make_consistent()
        .map_err(|e| LoadError::parse(format!("inconsistent PLY: {e:?}")))?;
    let mut out = Vec::new();
    Writer::new().write_ply(&mut out, &mut ply)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORED_POINTS: &str = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
property uchar red
property uchar green
property uchar blue
end_header
0 0 0 255 0 0
1 0 0 0 255 0
0 2 0 0 0 255
";

    const QUAD: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_index
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";

    #[test]
    fn test_vertex_only_with_colors() {
        let mesh = parse(COLORED_POINTS.as_bytes()).expect("valid PLY");
        assert!(mesh.is_point_set());
        let colors = mesh.colors.expect("colors present");
        assert_eq!(colors[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(colors[2], Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.positions[2], Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_polygon_fan_triangulated() {
        let mesh = parse(QUAD.as_bytes()).expect("valid PLY");
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert!(mesh.colors.is_none());
    }

    #[test]
    fn test_out_of_range_face_rejected() {
        let bad = QUAD.replace("4 0 1 2 3", "3 0 1 7");
        assert!(matches!(parse(bad.as_bytes()), Err(LoadError::ParseFailure(_))));
    }

    #[test]
    fn test_not_ply() {
        assert!(matches!(parse(b"solid cube"), Err(LoadError::ParseFailure(_))));
    }

    #[test]
    fn test_write_then_parse_keeps_faces_and_colors() {
        let mut mesh = parse(QUAD.as_bytes()).expect("valid PLY");
        mesh.compute_vertex_normals();
        mesh.colors = Some(vec![Vec3::new(1.0, 0.5, 0.0); 4]);
        let bytes = write(&mesh).expect("writable");
        let text = String::from_utf8(bytes.clone()).expect("ASCII output");
        assert!(text.starts_with("ply"));
        assert!(text.contains("element face 2"));

        let back = parse(&bytes).expect("re-readable");
        assert_eq!(back.triangles, mesh.triangles);
        assert_eq!(back.positions, mesh.positions);
        let color = back.colors.expect("colors kept")[0];
        assert!((color - Vec3::new(1.0, 128.0 / 255.0, 0.0)).length() < 1e-6);
    }
}
