//! Accepted mesh file formats.

use std::fmt;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// A mesh file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshFormat {
    /// Triangle soup with per-facet normals (binary or ASCII).
    Stl,
    /// Vertex list with optional colors and faces.
    Ply,
    /// Wavefront text format. Vertex colors are not required.
    Obj,
}

impl MeshFormat {
    /// Every accepted format.
    pub const ALL: [MeshFormat; 3] = [MeshFormat::Stl, MeshFormat::Ply, MeshFormat::Obj];

    /// Parses a file extension (case-insensitive, with or without a dot).
    pub fn from_extension(extension: &str) -> LoadResult<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "stl" => Ok(Self::Stl),
            "ply" => Ok(Self::Ply),
            "obj" => Ok(Self::Obj),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Determines the format from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(extension)
    }

    /// Canonical lowercase extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Ply => "ply",
            Self::Obj => "obj",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(MeshFormat::from_path("scan.STL").ok(), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("a/b/jaw.ply").ok(), Some(MeshFormat::Ply));
        assert_eq!(MeshFormat::from_extension(".obj").ok(), Some(MeshFormat::Obj));
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(matches!(
            MeshFormat::from_path("scan.png"),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "png"
        ));
        assert!(matches!(
            MeshFormat::from_path("README"),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }
}
