//! Mesh loading error types.

use dentiscope_core::DentiscopeError;
use thiserror::Error;

/// Errors that can occur while loading or writing a mesh.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The extension is not one of stl, ply or obj. Raised before any parse attempt.
    #[error("unsupported model format '{0}'")]
    UnsupportedFormat(String),

    /// The bytes are not valid geometry for the declared format.
    #[error("failed to parse model: {0}")]
    ParseFailure(String),

    /// Reading the source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::ParseFailure(message.into())
    }
}

impl From<LoadError> for DentiscopeError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::UnsupportedFormat(ext) => DentiscopeError::UnsupportedFormat(ext),
            LoadError::ParseFailure(message) => DentiscopeError::ParseFailure(message),
            LoadError::Io(e) => DentiscopeError::Io(e),
        }
    }
}

/// A specialized Result type for mesh loading.
pub type LoadResult<T> = std::result::Result<T, LoadError>;
