//! STL reader (binary and ASCII).
//!
//! STL stores an unindexed triangle soup. Corners with bit-identical
//! coordinates are welded into shared vertices so the recomputed normals
//! come out smooth. Facet normals in the file are ignored.

use std::collections::HashMap;

use glam::Vec3;

use crate::buffers::MeshBuffers;
use crate::error::{LoadError, LoadResult};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Parses binary or ASCII STL bytes.
///
/// A buffer whose length matches the triangle count in its header is read as
/// binary. Otherwise a buffer starting with `solid` is read as ASCII.
pub fn parse(bytes: &[u8]) -> LoadResult<MeshBuffers> {
    match binary_triangle_count(bytes) {
        Some(count) if bytes.len() == HEADER_LEN + 4 + count * RECORD_LEN => {
            parse_binary(bytes, count)
        }
        _ if looks_ascii(bytes) => parse_ascii(bytes),
        // Some exporters pad binary files after the last record.
        Some(count) if bytes.len() > HEADER_LEN + 4 + count * RECORD_LEN => {
            log::warn!("binary STL has trailing bytes after {count} triangles");
            parse_binary(bytes, count)
        }
        _ => Err(LoadError::parse("not a valid binary or ASCII STL file")),
    }
}

fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    let count = u32::from_le_bytes(raw.try_into().ok()?) as usize;
    count.checked_mul(RECORD_LEN)?.checked_add(HEADER_LEN + 4)?;
    Some(count)
}

fn looks_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

fn read_vec3(chunk: &[u8]) -> Vec3 {
    let f = |i: usize| f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]]);
    Vec3::new(f(0), f(4), f(8))
}

fn parse_binary(bytes: &[u8], count: usize) -> LoadResult<MeshBuffers> {
    if count == 0 {
        return Err(LoadError::parse("STL file contains no triangles"));
    }
    let body = &bytes[HEADER_LEN + 4..HEADER_LEN + 4 + count * RECORD_LEN];
    let mut welder = Welder::with_capacity(count);
    for record in body.chunks_exact(RECORD_LEN) {
        // Bytes 0..12 hold the facet normal, 48..50 the attribute count.
        welder.push_triangle([
            read_vec3(&record[12..24]),
            read_vec3(&record[24..36]),
            read_vec3(&record[36..48]),
        ]);
    }
    Ok(welder.finish())
}

fn parse_ascii(bytes: &[u8]) -> LoadResult<MeshBuffers> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LoadError::parse(format!("ASCII STL is not valid UTF-8: {e}")))?;
    let mut corners = Vec::new();
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "vertex" {
            continue;
        }
        let mut coord = || -> LoadResult<f32> {
            let t = tokens
                .next()
                .ok_or_else(|| LoadError::parse("truncated vertex line"))?;
            t.parse()
                .map_err(|_| LoadError::parse(format!("invalid coordinate '{t}'")))
        };
        corners.push(Vec3::new(coord()?, coord()?, coord()?));
    }
    if corners.is_empty() {
        return Err(LoadError::parse("STL file contains no triangles"));
    }
    if corners.len() % 3 != 0 {
        return Err(LoadError::parse(format!(
            "{} vertices do not form whole triangles",
            corners.len()
        )));
    }
    let mut welder = Welder::with_capacity(corners.len() / 3);
    for tri in corners.chunks_exact(3) {
        welder.push_triangle([tri[0], tri[1], tri[2]]);
    }
    Ok(welder.finish())
}

/// Merges corners with identical coordinates into shared vertices.
struct Welder {
    lookup: HashMap<[u32; 3], u32>,
    mesh: MeshBuffers,
}

impl Welder {
    fn with_capacity(triangles: usize) -> Self {
        Self {
            lookup: HashMap::with_capacity(triangles),
            mesh: MeshBuffers {
                triangles: Vec::with_capacity(triangles),
                ..MeshBuffers::default()
            },
        }
    }

    fn vertex(&mut self, p: Vec3) -> u32 {
        // Adding zero folds -0.0 into 0.0 so both weld together.
        let key = (p + Vec3::ZERO).to_array().map(f32::to_bits);
        let positions = &mut self.mesh.positions;
        *self.lookup.entry(key).or_insert_with(|| {
            positions.push(p);
            (positions.len() - 1) as u32
        })
    }

    fn push_triangle(&mut self, corners: [Vec3; 3]) {
        let tri = corners.map(|p| self.vertex(p));
        self.mesh.triangles.push(tri);
    }

    fn finish(self) -> MeshBuffers {
        log::debug!(
            "welded STL into {} vertices / {} triangles",
            self.mesh.vertex_count(),
            self.mesh.triangle_count()
        );
        self.mesh
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Binary STL for the given triangles.
    pub(crate) fn binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for tri in triangles {
            bytes.extend_from_slice(&[0u8; 12]);
            for p in tri {
                for c in p.to_array() {
                    bytes.extend_from_slice(&c.to_le_bytes());
                }
            }
            bytes.extend_from_slice(&[0u8; 2]);
        }
        bytes
    }

    const ASCII: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 1 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    #[test]
    fn test_binary_welds_shared_corners() {
        let a = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let b = [Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        let mesh = parse(&binary_stl(&[a, b])).expect("valid binary STL");
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_ascii() {
        let mesh = parse(ASCII.as_bytes()).expect("valid ASCII STL");
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let mut bytes = binary_stl(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]);
        bytes[..5].copy_from_slice(b"solid");
        assert_eq!(parse(&bytes).expect("binary by length").triangle_count(), 1);
    }

    #[test]
    fn test_negative_zero_welds() {
        let a = [Vec3::new(-0.0, 0.0, 0.0), Vec3::X, Vec3::Y];
        let b = [Vec3::ZERO, Vec3::Y, Vec3::NEG_X];
        assert_eq!(parse(&binary_stl(&[a, b])).expect("valid").vertex_count(), 4);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(parse(b"hello"), Err(LoadError::ParseFailure(_))));
        assert!(matches!(parse(&binary_stl(&[])), Err(LoadError::ParseFailure(_))));
        assert!(matches!(
            parse(b"solid x\n facet\n vertex 0 0\nendsolid"),
            Err(LoadError::ParseFailure(_))
        ));
    }
}
