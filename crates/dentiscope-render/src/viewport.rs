//! The four viewport descriptors and their camera presets.
//!
//! | kind        | position     | up   | projection   | rotation |
//! |-------------|--------------|------|--------------|----------|
//! | perspective | (5, 5, 5)    | +Y   | perspective  | orbit    |
//! | axial       | (0, 10, 0)   | -Z   | orthographic | locked   |
//! | coronal     | (0, 0, 10)   | +Y   | orthographic | locked   |
//! | sagittal    | (10, 0, 0)   | +Y   | orthographic | locked   |
//!
//! Every preset looks at the origin, where normalized models are centered.

use std::fmt;

use glam::{Vec2, Vec3};

use crate::camera::{Camera, NavigationStyle, ProjectionMode, Ray};

/// Lower bound of the displayed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;
/// Upper bound of the displayed zoom factor.
pub const MAX_ZOOM: f32 = 2.0;
/// Camera distance at which the zoom factor reads 100%.
pub const REFERENCE_DISTANCE: f32 = 10.0;

/// Which fixed view a viewport shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewportKind {
    Perspective,
    Axial,
    Coronal,
    Sagittal,
}

impl ViewportKind {
    /// Layout order: perspective top-left, axial top-right, coronal
    /// bottom-left, sagittal bottom-right.
    pub const ALL: [ViewportKind; 4] = [
        ViewportKind::Perspective,
        ViewportKind::Axial,
        ViewportKind::Coronal,
        ViewportKind::Sagittal,
    ];

    /// Stable identifier.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Perspective => "perspective",
            Self::Axial => "axial",
            Self::Coronal => "coronal",
            Self::Sagittal => "sagittal",
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Perspective => "3D View",
            Self::Axial => "Axial",
            Self::Coronal => "Coronal",
            Self::Sagittal => "Sagittal",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Perspective => 0,
            Self::Axial => 1,
            Self::Coronal => 2,
            Self::Sagittal => 3,
        }
    }

    #[must_use]
    pub fn preset_position(self) -> Vec3 {
        match self {
            Self::Perspective => Vec3::new(5.0, 5.0, 5.0),
            Self::Axial => Vec3::new(0.0, 10.0, 0.0),
            Self::Coronal => Vec3::new(0.0, 0.0, 10.0),
            Self::Sagittal => Vec3::new(10.0, 0.0, 0.0),
        }
    }

    #[must_use]
    pub fn preset_up(self) -> Vec3 {
        match self {
            // Looking straight down, so +Y cannot be the up vector.
            Self::Axial => Vec3::NEG_Z,
            _ => Vec3::Y,
        }
    }

    /// Only the perspective view rotates freely.
    #[must_use]
    pub fn allows_orbit(self) -> bool {
        self == Self::Perspective
    }

    /// Only the perspective view draws the reference grid.
    #[must_use]
    pub fn draws_grid(self) -> bool {
        self == Self::Perspective
    }

    /// Camera in the preset pose for this view.
    #[must_use]
    pub fn preset_camera(self) -> Camera {
        let mut camera = Camera::new(self.preset_position(), Vec3::ZERO, self.preset_up());
        if !self.allows_orbit() {
            camera.navigation_style = NavigationStyle::Planar;
            camera.projection_mode = ProjectionMode::Orthographic;
        }
        camera.set_distance(camera.distance());
        camera
    }
}

impl fmt::Display for ViewportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Zoom factor shown for a camera distance: `10 / distance` clamped to
/// [`MIN_ZOOM`, `MAX_ZOOM`].
#[must_use]
pub fn zoom_for_distance(distance: f32) -> f32 {
    if distance <= 0.0 {
        return MAX_ZOOM;
    }
    (REFERENCE_DISTANCE / distance).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// One view of the shared scene with its own camera state.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    kind: ViewportKind,
    camera: Camera,
    min_distance: f32,
    max_distance: f32,
}

impl Viewport {
    /// Creates a viewport in its preset pose. The preset distance is clamped
    /// into `[min_distance, max_distance]`.
    #[must_use]
    pub fn new(kind: ViewportKind, min_distance: f32, max_distance: f32) -> Self {
        let min_distance = min_distance.max(0.01);
        let mut viewport = Self {
            kind,
            camera: kind.preset_camera(),
            min_distance,
            max_distance: max_distance.max(min_distance),
        };
        viewport.set_distance(viewport.camera.distance());
        viewport
    }

    #[must_use]
    pub fn kind(&self) -> ViewportKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.camera.position
    }

    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.camera.target
    }

    #[must_use]
    pub fn distance(&self) -> f32 {
        self.camera.distance()
    }

    /// Allowed camera-to-target distance range.
    #[must_use]
    pub fn distance_limits(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    /// Zoom factor derived from the camera distance.
    #[must_use]
    pub fn zoom(&self) -> f32 {
        zoom_for_distance(self.distance())
    }

    /// Zoom as a whole percentage for display.
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom() * 100.0).round() as u32
    }

    /// Sets the camera distance, clamped to the allowed range.
    pub fn set_distance(&mut self, distance: f32) {
        if !distance.is_finite() {
            return;
        }
        self.camera
            .set_distance(distance.clamp(self.min_distance, self.max_distance));
    }

    /// Moves the camera `delta` units toward the target (negative moves away).
    pub fn zoom_by(&mut self, delta: f32) {
        self.set_distance(self.distance() - delta);
    }

    /// Rotates the camera around its target. Axis-locked views ignore this
    /// and return false.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) -> bool {
        self.camera.orbit(delta_x, delta_y)
    }

    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.pan(delta_x, delta_y);
    }

    /// Restores the preset pose.
    pub fn reset(&mut self) {
        let aspect = self.camera.aspect_ratio;
        self.camera = self.kind.preset_camera();
        self.camera.set_aspect_ratio(aspect);
        self.set_distance(self.camera.distance());
    }

    /// Updates the aspect ratio for a render target of the given size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    /// Ray through a pixel of this viewport rendered at `width` x `height`.
    #[must_use]
    pub fn ray(&self, pixel: Vec2, width: u32, height: u32) -> Option<Ray> {
        let mut camera = self.camera.clone();
        if width > 0 && height > 0 {
            camera.set_aspect_ratio(width as f32 / height as f32);
        }
        camera.screen_ray(pixel, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let axial = Viewport::new(ViewportKind::Axial, 2.0, 50.0);
        assert_eq!(axial.position(), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(axial.target(), Vec3::ZERO);
        assert_eq!(axial.camera().projection_mode, ProjectionMode::Orthographic);
        assert_eq!(axial.zoom_percent(), 100);

        let perspective = Viewport::new(ViewportKind::Perspective, 2.0, 50.0);
        assert!((perspective.distance() - 75f32.sqrt()).abs() < 1e-5);
        assert_eq!(perspective.zoom_percent(), 115);
    }

    #[test]
    fn test_zoom_mapping() {
        assert_eq!(zoom_for_distance(10.0), 1.0);
        assert_eq!(zoom_for_distance(2.0), MAX_ZOOM);
        assert_eq!(zoom_for_distance(200.0), MIN_ZOOM);
        assert_eq!(zoom_for_distance(20.0), 0.5);
    }

    #[test]
    fn test_distance_clamped() {
        let mut viewport = Viewport::new(ViewportKind::Coronal, 2.0, 50.0);
        viewport.zoom_by(100.0);
        assert!((viewport.distance() - 2.0).abs() < 1e-5);
        viewport.zoom_by(-1000.0);
        assert!((viewport.distance() - 50.0).abs() < 1e-4);
        assert_eq!(viewport.zoom_percent(), 20);
    }

    #[test]
    fn test_axis_views_do_not_rotate() {
        for kind in ViewportKind::ALL {
            let mut viewport = Viewport::new(kind, 2.0, 50.0);
            let before = viewport.position();
            assert_eq!(viewport.orbit(0.5, 0.5), kind.allows_orbit());
            if !kind.allows_orbit() {
                assert_eq!(viewport.position(), before);
            }
        }
    }

    #[test]
    fn test_reset_restores_preset() {
        let mut viewport = Viewport::new(ViewportKind::Perspective, 2.0, 50.0);
        viewport.orbit(1.0, 0.2);
        viewport.zoom_by(3.0);
        viewport.pan(0.5, 0.0);
        viewport.reset();
        assert!((viewport.position() - Vec3::new(5.0, 5.0, 5.0)).length() < 1e-5);
        assert_eq!(viewport.target(), Vec3::ZERO);
    }
}
