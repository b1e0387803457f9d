//! 2D overlay draw lists for measurements and annotations.

use glam::{Mat4, Vec2, Vec3};

use super::geometry;
use super::records::{Annotation, AnnotationKind, Measurement, MeasurementKind, MeasurementStore};

/// Maps model-space points to screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScreenProjection {
    /// Drops depth: `screen = offset + (x, -y) * scale`.
    Planar { scale: f32, offset: Vec2 },
    /// Full camera projection into a viewport of the given pixel size.
    Camera { view_proj: Mat4, viewport: Vec2 },
}

impl ScreenProjection {
    /// Projects a point. Returns `None` for points behind the camera.
    #[must_use]
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        match *self {
            Self::Planar { scale, offset } => {
                Some(Vec2::new(offset.x + point.x * scale, offset.y - point.y * scale))
            }
            Self::Camera {
                view_proj,
                viewport,
            } => {
                let clip = view_proj * point.extend(1.0);
                if clip.w <= f32::EPSILON {
                    return None;
                }
                let ndc = clip.truncate() / clip.w;
                Some(Vec2::new(
                    (ndc.x + 1.0) * 0.5 * viewport.x,
                    (1.0 - ndc.y) * 0.5 * viewport.y,
                ))
            }
        }
    }
}

/// Sizes used when building overlay commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub marker_radius: f32,
    pub line_width: f32,
    /// Offset of point-annotation labels from their marker.
    pub label_offset: Vec2,
    /// Screen-space vector from an arrow's tail to its tip.
    pub arrow_span: Vec2,
    pub arrow_head: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            marker_radius: 4.0,
            line_width: 2.0,
            label_offset: Vec2::new(8.0, -8.0),
            arrow_span: Vec2::new(30.0, 30.0),
            arrow_head: 8.0,
        }
    }
}

/// A single 2D draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    Line {
        from: Vec2,
        to: Vec2,
        color: Vec3,
        width: f32,
        dashed: bool,
    },
    Marker {
        center: Vec2,
        radius: f32,
        color: Vec3,
    },
    Label {
        anchor: Vec2,
        text: String,
        color: Vec3,
        /// Draw the text on a filled box of `color`.
        boxed: bool,
    },
}

/// Builds draw commands for every visible record in the store.
///
/// Records with a point that cannot be projected are skipped.
#[must_use]
pub fn build_overlay(
    store: &MeasurementStore,
    projection: &ScreenProjection,
    style: &OverlayStyle,
) -> Vec<OverlayCommand> {
    let mut commands = Vec::new();
    for measurement in store.measurements().iter().filter(|m| m.visible) {
        push_measurement(&mut commands, measurement, projection, style);
    }
    for annotation in store.annotations().iter().filter(|a| a.visible) {
        push_annotation(&mut commands, annotation, projection, style);
    }
    commands
}

fn push_measurement(
    commands: &mut Vec<OverlayCommand>,
    measurement: &Measurement,
    projection: &ScreenProjection,
    style: &OverlayStyle,
) {
    let Some(screen) = measurement
        .positions()
        .map(|p| projection.project(p))
        .collect::<Option<Vec<Vec2>>>()
    else {
        return;
    };
    let color = measurement.color;
    let line = |from: Vec2, to: Vec2, dashed: bool| OverlayCommand::Line {
        from,
        to,
        color,
        width: style.line_width,
        dashed,
    };

    let label_anchor = match measurement.kind() {
        MeasurementKind::Distance => {
            commands.push(line(screen[0], screen[1], true));
            (screen[0] + screen[1]) * 0.5
        }
        MeasurementKind::Angle => {
            commands.push(line(screen[1], screen[0], false));
            commands.push(line(screen[1], screen[2], false));
            screen[1] + style.label_offset
        }
        MeasurementKind::Area => {
            for (i, from) in screen.iter().enumerate() {
                commands.push(line(*from, screen[(i + 1) % screen.len()], false));
            }
            let world: Vec<Vec3> = measurement.positions().collect();
            projection
                .project(geometry::centroid(&world))
                .unwrap_or(screen[0])
        }
    };

    commands.extend(screen.iter().map(|center| OverlayCommand::Marker {
        center: *center,
        radius: style.marker_radius,
        color,
    }));
    commands.push(OverlayCommand::Label {
        anchor: label_anchor,
        text: measurement.display_text(),
        color,
        boxed: false,
    });
}

fn push_annotation(
    commands: &mut Vec<OverlayCommand>,
    annotation: &Annotation,
    projection: &ScreenProjection,
    style: &OverlayStyle,
) {
    let Some(anchor) = projection.project(annotation.position().position) else {
        return;
    };
    let color = annotation.color;
    match annotation.kind() {
        AnnotationKind::Point => {
            commands.push(OverlayCommand::Marker {
                center: anchor,
                radius: style.marker_radius,
                color,
            });
            commands.push(OverlayCommand::Label {
                anchor: anchor + style.label_offset,
                text: annotation.text.clone(),
                color,
                boxed: false,
            });
        }
        AnnotationKind::Text => commands.push(OverlayCommand::Label {
            anchor,
            text: annotation.text.clone(),
            color,
            boxed: true,
        }),
        AnnotationKind::Arrow => {
            let tail = anchor - style.arrow_span;
            let back = style.arrow_span.normalize_or_zero() * style.arrow_head;
            let side = back.perp() * 0.5;
            for from in [tail, anchor - back + side, anchor - back - side] {
                commands.push(OverlayCommand::Line {
                    from,
                    to: anchor,
                    color,
                    width: style.line_width,
                    dashed: false,
                });
            }
            commands.push(OverlayCommand::Label {
                anchor: tail,
                text: annotation.text.clone(),
                color,
                boxed: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::PickPoint;

    fn planar() -> ScreenProjection {
        ScreenProjection::Planar {
            scale: 100.0,
            offset: Vec2::new(200.0, 150.0),
        }
    }

    #[test]
    fn test_planar_projection_flips_y() {
        let p = planar().project(Vec3::new(1.0, 1.0, 5.0)).expect("planar always projects");
        assert_eq!(p, Vec2::new(300.0, 50.0));
    }

    #[test]
    fn test_camera_projection_center() {
        let view_proj = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let projection = ScreenProjection::Camera {
            view_proj,
            viewport: Vec2::new(100.0, 100.0),
        };
        let center = projection.project(Vec3::ZERO).expect("in front");
        assert!((center - Vec2::new(50.0, 50.0)).length() < 1e-3);
        assert!(projection.project(Vec3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_distance_overlay() {
        let mut store = MeasurementStore::new();
        store.add_measurement(
            MeasurementKind::Distance,
            vec![PickPoint::new(Vec3::ZERO), PickPoint::new(Vec3::X)],
            1.0,
            "mm",
        );
        let commands = build_overlay(&store, &planar(), &OverlayStyle::default());
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], OverlayCommand::Line { dashed: true, .. }));
        let markers = commands
            .iter()
            .filter(|c| matches!(c, OverlayCommand::Marker { .. }))
            .count();
        assert_eq!(markers, 2);
        match &commands[3] {
            OverlayCommand::Label { anchor, text, .. } => {
                assert_eq!(*anchor, Vec2::new(250.0, 150.0));
                assert_eq!(text, "1.00 mm");
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn test_hidden_records_skipped() {
        let mut store = MeasurementStore::new();
        let id = store.add_annotation(AnnotationKind::Text, PickPoint::new(Vec3::ZERO), "note");
        store.toggle_visible(id.into()).expect("known");
        assert!(build_overlay(&store, &planar(), &OverlayStyle::default()).is_empty());
    }

    #[test]
    fn test_annotation_overlays() {
        let mut store = MeasurementStore::new();
        store.add_annotation(AnnotationKind::Point, PickPoint::new(Vec3::ZERO), "apex");
        store.add_annotation(AnnotationKind::Text, PickPoint::new(Vec3::Y), "fracture");
        let style = OverlayStyle::default();
        let commands = build_overlay(&store, &planar(), &style);
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            &commands[1],
            OverlayCommand::Label { anchor, boxed: false, .. } if *anchor == Vec2::new(200.0, 150.0) + style.label_offset
        ));
        assert!(matches!(&commands[2], OverlayCommand::Label { boxed: true, .. }));
    }
}
