//! The four-viewport manager.
//!
//! All viewports share one light intensity and one set of grid/crosshair
//! switches but keep independent cameras. A frame renders every laid-out
//! viewport against the same [`RenderScene`], so no viewport can observe a
//! different scene state than its neighbours within one tick.

use dentiscope_core::measure::OverlayStyle;
use dentiscope_core::{PickPoint, ViewerOptions};
use glam::{Vec2, Vec3};

use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::frame::{render_view, Frame, RenderScene, RenderSettings};
use crate::pick::pick_mesh;
use crate::viewport::{Viewport, ViewportKind};

/// Largest accepted light intensity.
pub const MAX_LIGHT_INTENSITY: f32 = 2.0;

/// Pixel rectangle of one viewport inside the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRect {
    pub kind: ViewportKind,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && y >= self.y as f32
            && x < (self.x + self.width) as f32
            && y < (self.y + self.height) as f32
    }

    /// Converts surface coordinates to coordinates local to this rectangle.
    #[must_use]
    pub fn to_local(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x - self.x as f32, y - self.y as f32)
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rendered viewport together with where it goes on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFrame {
    pub rect: ViewportRect,
    pub frame: Frame,
}

/// Owns the four viewports and the state they share.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    viewports: [Viewport; 4],
    fullscreen: Option<ViewportKind>,
    light_intensity: f32,
    show_grid: bool,
    show_crosshair: bool,
    background: Vec3,
    grid_extent: f32,
    grid_divisions: u32,
    overlay_style: OverlayStyle,
}

impl Default for ViewportManager {
    fn default() -> Self {
        Self::new(&ViewerOptions::default())
    }
}

impl ViewportManager {
    /// Creates the four viewports in their preset poses.
    #[must_use]
    pub fn new(options: &ViewerOptions) -> Self {
        let viewport = |kind| {
            Viewport::new(kind, options.min_camera_distance, options.max_camera_distance)
        };
        Self {
            viewports: ViewportKind::ALL.map(viewport),
            fullscreen: None,
            light_intensity: options
                .default_light_intensity
                .clamp(0.0, MAX_LIGHT_INTENSITY),
            show_grid: options.show_grid,
            show_crosshair: options.show_crosshair,
            background: options.background_color,
            grid_extent: options.grid_extent,
            grid_divisions: options.grid_divisions,
            overlay_style: OverlayStyle::default(),
        }
    }

    #[must_use]
    pub fn viewport(&self, kind: ViewportKind) -> &Viewport {
        &self.viewports[kind.index()]
    }

    pub fn viewport_mut(&mut self, kind: ViewportKind) -> &mut Viewport {
        &mut self.viewports[kind.index()]
    }

    pub fn viewports(&self) -> impl Iterator<Item = &Viewport> {
        self.viewports.iter()
    }

    #[must_use]
    pub fn light_intensity(&self) -> f32 {
        self.light_intensity
    }

    /// Sets the shared light intensity, clamped to `[0, 2]`.
    pub fn set_light_intensity(&mut self, intensity: f32) {
        if intensity.is_finite() {
            self.light_intensity = intensity.clamp(0.0, MAX_LIGHT_INTENSITY);
        }
    }

    #[must_use]
    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.show_grid = show;
    }

    #[must_use]
    pub fn show_crosshair(&self) -> bool {
        self.show_crosshair
    }

    pub fn set_show_crosshair(&mut self, show: bool) {
        self.show_crosshair = show;
    }

    pub fn set_background(&mut self, color: Vec3) {
        self.background = color.clamp(Vec3::ZERO, Vec3::ONE);
    }

    pub fn set_overlay_style(&mut self, style: OverlayStyle) {
        self.overlay_style = style;
    }

    /// The viewport currently promoted to fill the surface, if any.
    #[must_use]
    pub fn fullscreen(&self) -> Option<ViewportKind> {
        self.fullscreen
    }

    /// Promotes one viewport to fill the surface, or returns to the grid
    /// with `None`. Camera state of every viewport is left as is.
    pub fn set_fullscreen(&mut self, kind: Option<ViewportKind>) {
        self.fullscreen = kind;
    }

    /// Promotes `kind`, or returns to the grid if it is already promoted.
    pub fn toggle_fullscreen(&mut self, kind: ViewportKind) {
        self.fullscreen = if self.fullscreen == Some(kind) {
            None
        } else {
            Some(kind)
        };
    }

    /// Resets every camera to its preset pose.
    pub fn reset_cameras(&mut self) {
        for viewport in &mut self.viewports {
            viewport.reset();
        }
    }

    /// Splits a `width` x `height` surface into viewport rectangles: a 2x2
    /// grid, or a single full rectangle for the promoted viewport.
    #[must_use]
    pub fn layout(&self, width: u32, height: u32) -> Vec<ViewportRect> {
        if let Some(kind) = self.fullscreen {
            return vec![ViewportRect {
                kind,
                x: 0,
                y: 0,
                width,
                height,
            }];
        }
        let left = width / 2;
        let top = height / 2;
        ViewportKind::ALL
            .iter()
            .map(|&kind| {
                let (col, row) = (kind.index() % 2, kind.index() / 2);
                ViewportRect {
                    kind,
                    x: if col == 0 { 0 } else { left },
                    y: if row == 0 { 0 } else { top },
                    width: if col == 0 { left } else { width - left },
                    height: if row == 0 { top } else { height - top },
                }
            })
            .collect()
    }

    /// The viewport rectangle under a surface position.
    #[must_use]
    pub fn viewport_at(&self, x: f32, y: f32, width: u32, height: u32) -> Option<ViewportRect> {
        self.layout(width, height)
            .into_iter()
            .find(|rect| rect.contains(x, y))
    }

    /// Drawing settings for one viewport. The grid is only drawn in views
    /// that allow it.
    #[must_use]
    pub fn settings_for(&self, kind: ViewportKind) -> RenderSettings {
        RenderSettings {
            light_intensity: self.light_intensity,
            show_grid: self.show_grid && kind.draws_grid(),
            show_crosshair: self.show_crosshair,
            background: self.background,
            grid_extent: self.grid_extent,
            grid_divisions: self.grid_divisions,
            overlay_style: self.overlay_style,
        }
    }

    /// Renders one viewport at the given size.
    pub fn render(
        &self,
        engine: &RenderEngine,
        kind: ViewportKind,
        scene: &RenderScene<'_>,
        width: u32,
        height: u32,
    ) -> RenderResult<Frame> {
        render_view(
            engine,
            self.viewport(kind).camera(),
            scene,
            &self.settings_for(kind),
            width,
            height,
        )
    }

    /// Renders every laid-out viewport against the same scene snapshot.
    /// The model is uploaded once and shared by all viewports.
    pub fn render_all(
        &self,
        engine: &RenderEngine,
        scene: &RenderScene<'_>,
        width: u32,
        height: u32,
    ) -> RenderResult<Vec<ViewportFrame>> {
        engine.check_size(width, height)?;
        let buffers = engine.upload_scene(scene);
        self.layout(width, height)
            .into_iter()
            .filter(|rect| !rect.is_empty())
            .map(|rect| {
                let settings = self.settings_for(rect.kind);
                let view = engine.prepare_view(
                    &buffers,
                    self.viewport(rect.kind).camera(),
                    scene,
                    &settings,
                    rect.width,
                    rect.height,
                );
                let frame =
                    engine.render_offscreen(&buffers, view, settings.background, rect.width, rect.height)?;
                Ok(ViewportFrame { rect, frame })
            })
            .collect()
    }

    /// Draws every laid-out viewport to the engine's window surface.
    pub fn present(&self, engine: &mut RenderEngine, scene: &RenderScene<'_>) -> RenderResult<()> {
        let (width, height) = engine.surface_size();
        let buffers = engine.upload_scene(scene);
        let views: Vec<_> = self
            .layout(width, height)
            .into_iter()
            .filter(|rect| !rect.is_empty())
            .map(|rect| {
                let view = engine.prepare_view(
                    &buffers,
                    self.viewport(rect.kind).camera(),
                    scene,
                    &self.settings_for(rect.kind),
                    rect.width,
                    rect.height,
                );
                (rect, view)
            })
            .collect();
        engine.present(&buffers, &views, self.background)
    }

    /// Picks the model under a surface position, using the camera of the
    /// viewport found there.
    #[must_use]
    pub fn pick(
        &self,
        scene: &RenderScene<'_>,
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    ) -> Option<(ViewportKind, PickPoint)> {
        let rect = self.viewport_at(x, y, width, height)?;
        let model = scene.model?;
        let ray = self
            .viewport(rect.kind)
            .ray(rect.to_local(x, y), rect.width, rect.height)?;
        pick_mesh(model, &ray).map(|point| (rect.kind, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_layout() {
        let manager = ViewportManager::default();
        let rects = manager.layout(101, 60);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0].kind, ViewportKind::Perspective);
        assert_eq!((rects[0].width, rects[0].height), (50, 30));
        assert_eq!((rects[3].x, rects[3].y, rects[3].width), (50, 30, 51));
        assert_eq!(
            manager.viewport_at(75.0, 10.0, 101, 60).map(|r| r.kind),
            Some(ViewportKind::Axial)
        );
    }

    #[test]
    fn test_fullscreen_preserves_camera_state() {
        let mut manager = ViewportManager::default();
        manager.viewport_mut(ViewportKind::Sagittal).zoom_by(4.0);
        manager.viewport_mut(ViewportKind::Perspective).orbit(0.4, 0.1);
        let sagittal = manager.viewport(ViewportKind::Sagittal).clone();
        let perspective = manager.viewport(ViewportKind::Perspective).clone();

        manager.toggle_fullscreen(ViewportKind::Sagittal);
        let rects = manager.layout(200, 100);
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].kind, ViewportKind::Sagittal);
        assert_eq!((rects[0].width, rects[0].height), (200, 100));

        manager.toggle_fullscreen(ViewportKind::Sagittal);
        assert_eq!(manager.fullscreen(), None);
        assert_eq!(manager.viewport(ViewportKind::Sagittal), &sagittal);
        assert_eq!(manager.viewport(ViewportKind::Perspective), &perspective);
        assert_eq!(manager.viewport(ViewportKind::Sagittal).zoom_percent(), 167);
    }

    #[test]
    fn test_grid_only_in_perspective() {
        let manager = ViewportManager::default();
        assert!(manager.settings_for(ViewportKind::Perspective).show_grid);
        for kind in [ViewportKind::Axial, ViewportKind::Coronal, ViewportKind::Sagittal] {
            assert!(!manager.settings_for(kind).show_grid);
        }
    }

    #[test]
    fn test_light_intensity_shared_and_clamped() {
        let mut manager = ViewportManager::default();
        manager.set_light_intensity(5.0);
        for kind in ViewportKind::ALL {
            assert_eq!(manager.settings_for(kind).light_intensity, MAX_LIGHT_INTENSITY);
        }
        manager.set_light_intensity(f32::NAN);
        assert_eq!(manager.light_intensity(), MAX_LIGHT_INTENSITY);
    }

    #[test]
    fn test_render_all_sizes() {
        use pollster::FutureExt;

        let engine = match RenderEngine::new_headless().block_on() {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Skipping GPU test: no adapter available ({e})");
                return;
            }
        };
        let manager = ViewportManager::default();
        let scene = RenderScene {
            model: None,
            appearance: crate::frame::ModelAppearance::default(),
            measurements: None,
        };
        let frames = manager.render_all(&engine, &scene, 64, 48).expect("frames");
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.frame.width() == 32 && f.frame.height() == 24));
        assert!(manager.render_all(&engine, &scene, 0, 10).is_err());
    }
}
