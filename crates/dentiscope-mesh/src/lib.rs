//! Mesh loading for dentiscope-rs.
//!
//! Reads STL (binary and ASCII), PLY and OBJ into [`MeshBuffers`], then
//! [`normalize`]s the result into the shared display frame. Writers for the
//! same three formats live in [`export`].
//!
//! ```no_run
//! let mesh = dentiscope_mesh::load_file("upper_jaw.stl")?;
//! println!("{} mm per unit", mesh.normalization().source_units_per_unit());
//! # Ok::<(), dentiscope_mesh::LoadError>(())
//! ```

// Index buffers are u32 and coordinates f32 throughout.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod bounds;
pub mod buffers;
pub mod error;
pub mod export;
pub mod format;
pub mod normalize;
pub mod obj;
pub mod ply;
pub mod stl;

use std::path::Path;

pub use bounds::Aabb;
pub use buffers::{MeshBuffers, MeshVertex};
pub use error::{LoadError, LoadResult};
pub use format::MeshFormat;
pub use normalize::{normalize, placeholder, Normalization, NormalizedMesh, TARGET_EXTENT};

/// Parses raw geometry without normalizing it.
pub fn parse(bytes: &[u8], format: MeshFormat) -> LoadResult<MeshBuffers> {
    match format {
        MeshFormat::Stl => stl::parse(bytes),
        MeshFormat::Ply => ply::parse(bytes),
        MeshFormat::Obj => obj::parse(bytes),
    }
}

/// Parses and normalizes a model.
pub fn load(bytes: &[u8], format: MeshFormat) -> LoadResult<NormalizedMesh> {
    let raw = parse(bytes, format)?;
    normalize(raw, Some(format))
}

/// Loads a model from disk. The format comes from the file extension and is
/// checked before the file is read.
pub fn load_file(path: impl AsRef<Path>) -> LoadResult<NormalizedMesh> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    log::info!("loading {} ({} bytes)", path.display(), bytes.len());
    load(&bytes, format)
}
