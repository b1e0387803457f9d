//! Viewport management and rendering for dentiscope-rs.
//!
//! Four fixed viewports (one orbiting perspective view and three
//! axis-locked orthographic views) render the same scene snapshot each
//! frame. Rendering goes through wgpu: headless engines read each viewport
//! back as an RGBA [`Frame`] the host can save or encode, windowed engines
//! present all viewports to a window surface.

// Pixel math mixes u32 sizes with f32 coordinates throughout.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// Render settings carry several independent switches
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_arguments)]

pub mod batch;
pub mod camera;
pub mod engine;
pub mod error;
pub mod frame;
pub mod manager;
pub mod pick;
pub mod screenshot;
pub mod viewport;

pub use camera::{Camera, NavigationStyle, ProjectionMode, Ray};
pub use engine::{PreparedView, RenderEngine, SceneBuffers};
pub use error::{RenderError, RenderResult};
pub use frame::{render_view, Frame, FrameLabel, ModelAppearance, RenderScene, RenderSettings};
pub use manager::{ViewportFrame, ViewportManager, ViewportRect};
pub use pick::pick_mesh;
pub use screenshot::{encode_png, save_image};
pub use viewport::{zoom_for_distance, Viewport, ViewportKind};
