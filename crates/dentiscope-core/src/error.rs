//! Error types for dentiscope-rs.

use thiserror::Error;

/// The main error type for dentiscope-rs operations.
#[derive(Error, Debug)]
pub enum DentiscopeError {
    /// The file extension is not one of the accepted mesh formats.
    #[error("unsupported model format '{0}' - expected .stl, .ply or .obj")]
    UnsupportedFormat(String),

    /// The geometry could not be parsed.
    #[error("failed to parse model: {0}")]
    ParseFailure(String),

    /// Persisting a model to the document store failed.
    #[error("model upload failed: {0}")]
    UploadFailure(String),

    /// A scene node with the given id does not exist.
    #[error("scene node '{0}' not found")]
    NodeNotFound(String),

    /// Two scene nodes were declared with the same id.
    #[error("scene node id '{0}' is declared more than once")]
    DuplicateNode(String),

    /// A measurement with the given id does not exist.
    #[error("measurement {0} not found")]
    MeasurementNotFound(u64),

    /// An annotation with the given id does not exist.
    #[error("annotation {0} not found")]
    AnnotationNotFound(u64),

    /// An edit was rejected by the target's current state.
    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    /// Rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DentiscopeError {
    /// Returns true for errors that leave the session untouched and only need
    /// to be reported (unknown ids).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound(_) | Self::MeasurementNotFound(_) | Self::AnnotationNotFound(_)
        )
    }
}

/// A specialized Result type for dentiscope-rs operations.
pub type Result<T> = std::result::Result<T, DentiscopeError>;
