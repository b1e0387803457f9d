//! Per-frame scene snapshot and single-viewport rendering.

use dentiscope_core::measure::OverlayStyle;
use dentiscope_core::scene::defaults::MODEL_NODE;
use dentiscope_core::{MeasurementStore, SceneGraph};
use dentiscope_mesh::MeshBuffers;
use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::screenshot;

/// How the model is drawn, taken from the scene node that drives it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelAppearance {
    pub color: Vec3,
    pub opacity: f32,
    pub visible: bool,
}

impl Default for ModelAppearance {
    fn default() -> Self {
        Self {
            color: Vec3::new(0.95, 0.93, 0.86),
            opacity: 1.0,
            visible: true,
        }
    }
}

impl ModelAppearance {
    /// Reads the appearance from the model-driving node of the scene.
    #[must_use]
    pub fn from_scene(scene: &SceneGraph) -> Self {
        scene.find(MODEL_NODE).map_or_else(Self::default, |node| Self {
            color: node.color,
            opacity: node.opacity,
            visible: node.visible,
        })
    }
}

/// Everything one frame draws, borrowed for the duration of the frame so
/// every viewport sees the same state.
#[derive(Debug, Clone, Copy)]
pub struct RenderScene<'a> {
    pub model: Option<&'a MeshBuffers>,
    pub appearance: ModelAppearance,
    pub measurements: Option<&'a MeasurementStore>,
}

impl<'a> RenderScene<'a> {
    #[must_use]
    pub fn new(
        scene: &SceneGraph,
        model: Option<&'a MeshBuffers>,
        measurements: Option<&'a MeasurementStore>,
    ) -> Self {
        Self {
            model,
            appearance: ModelAppearance::from_scene(scene),
            measurements,
        }
    }
}

/// Per-viewport drawing switches.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub light_intensity: f32,
    pub show_grid: bool,
    pub show_crosshair: bool,
    pub background: Vec3,
    pub grid_extent: f32,
    pub grid_divisions: u32,
    pub overlay_style: OverlayStyle,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            light_intensity: 1.0,
            show_grid: true,
            show_crosshair: true,
            background: Vec3::new(0.08, 0.09, 0.11),
            grid_extent: 5.0,
            grid_divisions: 10,
            overlay_style: OverlayStyle::default(),
        }
    }
}

/// Overlay text the host should draw on top of the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLabel {
    pub anchor: Vec2,
    pub text: String,
    pub color: Vec3,
    pub boxed: bool,
}

/// One rendered viewport image read back from the GPU.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    depth: Vec<f32>,
    pub labels: Vec<FrameLabel>,
}

impl Frame {
    /// Builds a frame from tightly packed RGBA8 pixels and raw depth values.
    /// Cleared depth (1.0) becomes infinity.
    pub(crate) fn from_readback(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        depth: &[f32],
        labels: Vec<FrameLabel>,
    ) -> Self {
        let depth = depth
            .iter()
            .map(|&d| if d >= 1.0 { f32::INFINITY } else { d })
            .collect();
        Self {
            width,
            height,
            pixels,
            depth,
            labels,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA8 pixels, row by row from the top-left corner.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.index(x, y)? * 4;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }

    /// Depth in `[0, 1)` of the nearest surface drawn at a pixel, or
    /// infinity where only background shows.
    #[must_use]
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.depth.get(self.index(x, y)?).copied()
    }

    /// Encodes the frame as PNG.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        screenshot::encode_png(&self.pixels, self.width, self.height)
    }

    /// Writes the frame to a `.png` or `.jpg` file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> RenderResult<()> {
        screenshot::save_image(path, &self.pixels, self.width, self.height)
    }
}

/// Renders one view of `scene` through `camera`.
pub fn render_view(
    engine: &RenderEngine,
    camera: &Camera,
    scene: &RenderScene<'_>,
    settings: &RenderSettings,
    width: u32,
    height: u32,
) -> RenderResult<Frame> {
    engine.render(camera, scene, settings, width, height)
}
