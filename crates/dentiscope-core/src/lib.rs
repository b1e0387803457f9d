//! Core abstractions for dentiscope-rs.
//!
//! This crate provides the data model shared by the loader, renderer and
//! session layers:
//! - [`SceneGraph`]: the dental object tree with per-node visibility, color and opacity
//! - [`MeasurementEngine`]: the measurement/annotation tool state machine and records
//! - [`CommandHistory`]: snapshot-based undo/redo
//! - [`ToothChartEditor`]: the odontogram editor built on the same history
//! - [`ViewerOptions`]: serializable configuration

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
// Counts fit comfortably in f32 precision for overlay math
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod history;
pub mod measure;
pub mod odontogram;
pub mod options;
pub mod pick;
pub mod scene;

pub use error::{DentiscopeError, Result};
pub use history::CommandHistory;
pub use measure::{
    Annotation, AnnotationId, AnnotationKind, Measurement, MeasurementEngine, MeasurementId,
    MeasurementKind, MeasurementStore, OverlayCommand, OverlayStyle, PickOutcome, RecordId,
    ScreenProjection, Tool,
};
pub use odontogram::{
    Surface, SurfaceCondition, ToothChart, ToothChartEditor, ToothNumber, ToothStatus,
};
pub use options::ViewerOptions;
pub use pick::PickPoint;
pub use scene::{NodeKey, NodeKind, NodeSpec, SceneEdit, SceneGraph, SceneNode};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
