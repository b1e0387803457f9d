//! Mesh writers for the three supported formats.

use crate::buffers::MeshBuffers;
use crate::error::LoadResult;
use crate::format::MeshFormat;
use crate::{obj, ply};

const STL_HEADER: &[u8] = b"dentiscope binary STL";

/// Encodes a mesh as binary STL. Point sets produce a file with no facets.
#[must_use]
pub fn write_stl(mesh: &MeshBuffers) -> Vec<u8> {
    let mut out = Vec::with_capacity(84 + mesh.triangle_count() * 50);
    let mut header = [0u8; 80];
    header[..STL_HEADER.len()].copy_from_slice(STL_HEADER);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(mesh.triangle_count() as u32).to_le_bytes());
    for i in 0..mesh.triangle_count() {
        let normal = mesh.face_normal(i);
        for v in std::iter::once(normal).chain(mesh.triangle(i)) {
            for c in v.to_array() {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

/// Encodes a mesh in the given format.
pub fn write(mesh: &MeshBuffers, format: MeshFormat) -> LoadResult<Vec<u8>> {
    let bytes = match format {
        MeshFormat::Stl => write_stl(mesh),
        MeshFormat::Obj => obj::write(mesh)?,
        MeshFormat::Ply => ply::write(mesh)?,
    };
    log::debug!(
        "encoded {} triangles as {format} ({} bytes)",
        mesh.triangle_count(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stl;
    use glam::Vec3;

    #[test]
    fn test_stl_layout_and_reparse() {
        let mesh = MeshBuffers::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)],
            vec![[0, 1, 2], [1, 3, 2]],
        );
        let bytes = write(&mesh, MeshFormat::Stl).expect("stl");
        assert_eq!(bytes.len(), 84 + 2 * 50);
        assert!(bytes.starts_with(STL_HEADER));
        let normal_z = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(normal_z, 1.0);

        let back = stl::parse(&bytes).expect("re-readable");
        assert_eq!(back.vertex_count(), 4);
        assert_eq!(back.triangle_count(), 2);
    }

    #[test]
    fn test_every_format_encodes() {
        let mesh = crate::placeholder().source_geometry();
        for format in MeshFormat::ALL {
            let bytes = write(&mesh, format).expect("encodable");
            let back = crate::parse(&bytes, format).expect("decodable");
            assert_eq!(back.triangle_count(), 12, "{format}");
        }
    }
}
