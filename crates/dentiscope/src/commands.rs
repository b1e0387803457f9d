//! Queued session commands.
//!
//! Input handlers enqueue commands instead of touching the session; the
//! viewer applies the queue in order between frames.

use dentiscope_core::{PickPoint, RecordId, SceneEdit, Tool};
use dentiscope_render::ViewportKind;

/// One user action.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Scene(SceneEdit),
    SetTool(Option<Tool>),
    Pick(PickPoint),
    ConfirmAnnotation(String),
    CancelAnnotation,
    DeleteRecord(RecordId),
    ToggleRecordVisible(RecordId),
    RelabelRecord(RecordId, String),
    ClearAll,
    Undo,
    Redo,
    SetLightIntensity(f32),
    SetShowGrid(bool),
    SetShowCrosshair(bool),
    ToggleFullscreen(ViewportKind),
    Orbit {
        viewport: ViewportKind,
        delta_x: f32,
        delta_y: f32,
    },
    Pan {
        viewport: ViewportKind,
        delta_x: f32,
        delta_y: f32,
    },
    /// Moves the camera `delta` units toward its target.
    Zoom {
        viewport: ViewportKind,
        delta: f32,
    },
    ResetCameras,
    LoadModel {
        name: String,
        bytes: Vec<u8>,
    },
}
