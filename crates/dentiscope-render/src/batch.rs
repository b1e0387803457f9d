//! CPU-built vertex batches for unlit geometry.
//!
//! Grid lines are emitted in world space. Point sprites are projected here
//! and emitted in normalized device coordinates so they keep a fixed pixel
//! size. The measurement overlay is tessellated in pixel space and mapped
//! to the viewport with [`pixel_transform`].

use dentiscope_core::measure::OverlayCommand;
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::frame::{FrameLabel, RenderSettings};

/// Dash pattern for dashed lines, in pixels (on, off).
pub const DASH: (f32, f32) = (6.0, 4.0);
/// Approximate glyph cell used to size label boxes.
pub const GLYPH: Vec2 = Vec2::new(7.0, 14.0);
/// Grid plane height: just under a normalized model.
pub const GRID_HEIGHT: f32 = -1.0;

const GRID_COLOR: Vec3 = Vec3::new(0.35, 0.37, 0.4);
const CROSSHAIR_COLOR: Vec3 = Vec3::new(0.9, 0.35, 0.3);
const CROSSHAIR_ARM: f32 = 10.0;
const LABEL_BOX_ALPHA: f32 = 0.85;
const DISC_SEGMENTS: usize = 16;

/// Vertex layout shared by every unlit batch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlatVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl FlatVertex {
    fn new(position: Vec3, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Maps pixel coordinates (origin top-left) of a `width` x `height`
/// viewport to clip space.
#[must_use]
pub fn pixel_transform(width: u32, height: u32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}

/// Grid lines on the `y = GRID_HEIGHT` plane, as a line list.
#[must_use]
pub fn grid_lines(settings: &RenderSettings) -> Vec<FlatVertex> {
    let divisions = settings.grid_divisions.max(1);
    let extent = settings.grid_extent;
    let step = 2.0 * extent / divisions as f32;
    let color = GRID_COLOR.extend(1.0);
    let mut vertices = Vec::with_capacity(4 * (divisions as usize + 1));
    for i in 0..=divisions {
        let offset = -extent + step * i as f32;
        vertices.extend([
            FlatVertex::new(Vec3::new(offset, GRID_HEIGHT, -extent), color),
            FlatVertex::new(Vec3::new(offset, GRID_HEIGHT, extent), color),
            FlatVertex::new(Vec3::new(-extent, GRID_HEIGHT, offset), color),
            FlatVertex::new(Vec3::new(extent, GRID_HEIGHT, offset), color),
        ]);
    }
    vertices
}

/// Screen-aligned squares for a point set, in normalized device coordinates.
///
/// Points behind the camera or outside the depth range are dropped.
#[must_use]
pub fn point_sprites(
    view_proj: &Mat4,
    points: impl IntoIterator<Item = (Vec3, Vec3)>,
    width: u32,
    height: u32,
    radius: f32,
) -> Vec<FlatVertex> {
    let half = Vec2::new(2.0 * radius / width as f32, 2.0 * radius / height as f32);
    let mut vertices = Vec::new();
    for (position, color) in points {
        let clip = *view_proj * position.extend(1.0);
        if clip.w <= f32::EPSILON {
            continue;
        }
        let ndc = clip.truncate() / clip.w;
        if !(0.0..=1.0).contains(&ndc.z) {
            continue;
        }
        let color = color.extend(1.0);
        let corner = |sx: f32, sy: f32| {
            FlatVertex::new(Vec3::new(ndc.x + sx * half.x, ndc.y + sy * half.y, ndc.z), color)
        };
        vertices.extend([
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ]);
    }
    vertices
}

/// Triangles and text labels for the 2D overlay of one viewport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayBatch {
    pub vertices: Vec<FlatVertex>,
    pub labels: Vec<FrameLabel>,
}

impl OverlayBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.labels.is_empty()
    }

    fn quad(&mut self, corners: [Vec2; 4], color: Vec4) {
        let v = corners.map(|c| FlatVertex::new(c.extend(0.0), color));
        self.vertices.extend([v[0], v[1], v[2], v[0], v[2], v[3]]);
    }

    fn segment(&mut self, from: Vec2, to: Vec2, half_width: f32, color: Vec4) {
        let Some(dir) = (to - from).try_normalize() else {
            return;
        };
        let side = dir.perp() * half_width;
        self.quad([from - side, to - side, to + side, from + side], color);
    }

    /// A line of `width` pixels, split into dashes when `dashed`.
    pub fn line(&mut self, from: Vec2, to: Vec2, color: Vec3, width: f32, dashed: bool) {
        let half_width = width.max(1.0) * 0.5;
        let color = color.extend(1.0);
        let length = from.distance(to);
        if !dashed || length <= DASH.0 {
            self.segment(from, to, half_width, color);
            return;
        }
        let dir = (to - from) / length;
        let mut start = 0.0;
        while start < length {
            let end = (start + DASH.0).min(length);
            self.segment(from + dir * start, from + dir * end, half_width, color);
            start += DASH.0 + DASH.1;
        }
    }

    /// A filled disc.
    pub fn disc(&mut self, center: Vec2, radius: f32, color: Vec3) {
        let color = color.extend(1.0);
        let rim = |i: usize| {
            let angle = std::f32::consts::TAU * i as f32 / DISC_SEGMENTS as f32;
            center + Vec2::from_angle(angle) * radius
        };
        for i in 0..DISC_SEGMENTS {
            self.vertices.extend([
                FlatVertex::new(center.extend(0.0), color),
                FlatVertex::new(rim(i).extend(0.0), color),
                FlatVertex::new(rim(i + 1).extend(0.0), color),
            ]);
        }
    }

    /// A filled axis-aligned rectangle.
    pub fn rect(&mut self, min: Vec2, size: Vec2, color: Vec3, alpha: f32) {
        let max = min + size;
        self.quad(
            [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            color.extend(alpha),
        );
    }

    /// Tessellates one overlay draw command.
    pub fn push(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::Line {
                from,
                to,
                color,
                width,
                dashed,
            } => self.line(from, to, color, width, dashed),
            OverlayCommand::Marker {
                center,
                radius,
                color,
            } => self.disc(center, radius, color),
            OverlayCommand::Label {
                anchor,
                text,
                color,
                boxed,
            } => {
                if boxed {
                    let size =
                        Vec2::new(GLYPH.x * text.chars().count() as f32 + 8.0, GLYPH.y + 6.0);
                    self.rect(anchor - Vec2::new(4.0, GLYPH.y + 3.0), size, color, LABEL_BOX_ALPHA);
                }
                self.labels.push(FrameLabel {
                    anchor,
                    text,
                    color,
                    boxed,
                });
            }
        }
    }

    /// A small cross at the viewport center.
    pub fn crosshair(&mut self, width: u32, height: u32) {
        let c = Vec2::new(width as f32, height as f32) * 0.5;
        for arm in [Vec2::X, Vec2::Y] {
            self.line(c - arm * CROSSHAIR_ARM, c + arm * CROSSHAIR_ARM, CROSSHAIR_COLOR, 1.0, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut solid = OverlayBatch::new();
        solid.line(Vec2::ZERO, Vec2::new(40.0, 0.0), Vec3::ONE, 1.0, false);
        let mut dashed = OverlayBatch::new();
        dashed.line(Vec2::ZERO, Vec2::new(40.0, 0.0), Vec3::ONE, 1.0, true);
        // 40 px at 6 on / 4 off is four dashes of one quad each.
        assert_eq!(solid.vertices.len(), 6);
        assert_eq!(dashed.vertices.len(), 4 * 6);
        let max_x = dashed
            .vertices
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert!(max_x <= 40.0 + 1e-4);
    }

    #[test]
    fn test_degenerate_line_skipped() {
        let mut batch = OverlayBatch::new();
        batch.line(Vec2::ONE, Vec2::ONE, Vec3::ONE, 2.0, false);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_boxed_label_adds_rect_and_text() {
        let mut batch = OverlayBatch::new();
        batch.push(OverlayCommand::Label {
            anchor: Vec2::new(10.0, 20.0),
            text: "apex".into(),
            color: Vec3::X,
            boxed: true,
        });
        assert_eq!(batch.vertices.len(), 6);
        assert!((batch.vertices[0].color[3] - LABEL_BOX_ALPHA).abs() < 1e-6);
        assert_eq!(batch.labels.len(), 1);
        assert_eq!(batch.labels[0].text, "apex");
    }

    #[test]
    fn test_pixel_transform_corners() {
        let m = pixel_transform(200, 100);
        let top_left = m.project_point3(Vec3::ZERO);
        let bottom_right = m.project_point3(Vec3::new(200.0, 100.0, 0.0));
        assert!((top_left.truncate() - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((bottom_right.truncate() - Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_sprites_skip_points_behind_camera() {
        let camera = crate::camera::Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let view_proj = camera.view_projection_matrix();
        let sprites = point_sprites(
            &view_proj,
            [(Vec3::ZERO, Vec3::ONE), (Vec3::new(0.0, 0.0, 10.0), Vec3::ONE)],
            64,
            64,
            1.5,
        );
        assert_eq!(sprites.len(), 6);
        assert!(sprites.iter().all(|v| v.position[0].abs() < 0.1));
    }

    #[test]
    fn test_grid_line_count() {
        let settings = RenderSettings {
            grid_divisions: 4,
            ..RenderSettings::default()
        };
        let lines = grid_lines(&settings);
        assert_eq!(lines.len(), 4 * 5);
        assert!(lines.iter().all(|v| v.position[1] == GRID_HEIGHT));
    }
}
