//! dentiscope: a 3D dental model viewer and measurement toolkit.
//!
//! The facade ties the workspace together:
//! - [`Session`] owns the scene graph, the measurement engine and the undo
//!   history, and folds in background model loads and uploads
//! - [`Viewer`] runs the frame loop: queued commands first, then all four
//!   viewports rendered against one session snapshot
//! - [`window::run`] drives a [`Viewer`] from a winit window
//! - [`DocumentStore`] is the narrow interface to remote model storage
//! - [`export`] writes visible geometry as STL, OBJ or PLY
//!
//! # Quick start
//!
//! ```no_run
//! use dentiscope::{SessionCommand, Tool, Viewer};
//!
//! dentiscope::init_logging();
//! let mut viewer = Viewer::default();
//! let bytes = std::fs::read("upper_jaw.stl")?;
//! viewer.enqueue(SessionCommand::LoadModel { name: "upper_jaw.stl".into(), bytes });
//! viewer.enqueue(SessionCommand::SetTool(Some(Tool::MeasureDistance)));
//! let frames = viewer.frame()?;
//! frames[0].frame.save("perspective.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Surface coordinates are small enough for f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

pub mod app;
pub mod commands;
pub mod export;
pub mod loading;
pub mod session;
pub mod store;
pub mod window;

pub use app::Viewer;
pub use commands::SessionCommand;
pub use export::{ExportConfig, ExportFormat, ExportedAsset};
pub use loading::{CompletedLoad, ModelLoader};
pub use session::{LoadedModel, Notice, NoticeLevel, Session, ViewerState};
pub use store::{DocumentStore, MemoryDocumentStore, ModelRef};

pub use dentiscope_core::{
    AnnotationId, AnnotationKind, CommandHistory, DentiscopeError, MeasurementId,
    MeasurementKind, MeasurementStore, PickOutcome, PickPoint, RecordId, Result, SceneEdit,
    SceneGraph, SceneNode, Tool, ViewerOptions,
};
pub use dentiscope_mesh::{MeshFormat, NormalizedMesh};
pub use dentiscope_render::{Frame, RenderEngine, ViewportFrame, ViewportKind, ViewportManager};

pub use glam::{Vec2, Vec3};

/// Installs `env_logger` unless a logger is already set. Safe to call more
/// than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
