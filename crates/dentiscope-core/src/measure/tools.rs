//! Tool-mode state machine for measurement and annotation capture.
//!
//! [`transition`] is a pure function from (tool, capture state, event) to the
//! next tool, capture state and an [`ToolEffect`] describing what the owner
//! must do (create a record, open a label prompt, nothing).

use serde::{Deserialize, Serialize};

use super::records::{AnnotationKind, MeasurementKind};
use crate::pick::PickPoint;

/// The interaction tool selected in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Picks are ignored; clicks only navigate.
    Select,
    /// Two picks produce a distance in the configured unit.
    MeasureDistance,
    /// Three picks produce the angle at the middle point.
    MeasureAngle,
    /// One pick places a marker, then waits for an optional label.
    AnnotatePoint,
    /// One pick anchors a text box, then waits for non-empty text.
    AnnotateText,
}

impl Tool {
    /// Returns the measurement kind this tool captures, if any.
    #[must_use]
    pub fn measurement_kind(self) -> Option<MeasurementKind> {
        match self {
            Self::MeasureDistance => Some(MeasurementKind::Distance),
            Self::MeasureAngle => Some(MeasurementKind::Angle),
            _ => None,
        }
    }

    /// Returns the annotation kind this tool places, if any.
    #[must_use]
    pub fn annotation_kind(self) -> Option<AnnotationKind> {
        match self {
            Self::AnnotatePoint => Some(AnnotationKind::Point),
            Self::AnnotateText => Some(AnnotationKind::Text),
            _ => None,
        }
    }

    /// Display name for toolbars.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::MeasureDistance => "Distance",
            Self::MeasureAngle => "Angle",
            Self::AnnotatePoint => "Point",
            Self::AnnotateText => "Text",
        }
    }
}

/// Progress of an in-flight capture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureState {
    /// Nothing captured.
    #[default]
    Idle,
    /// Some points of a measurement have been picked.
    Collecting {
        kind: MeasurementKind,
        points: Vec<PickPoint>,
    },
    /// An annotation anchor was picked and its text is being entered.
    AwaitingLabel {
        kind: AnnotationKind,
        anchor: PickPoint,
    },
}

impl CaptureState {
    /// Points held by the capture (the anchor for a pending annotation).
    #[must_use]
    pub fn pending_points(&self) -> &[PickPoint] {
        match self {
            Self::Idle => &[],
            Self::Collecting { points, .. } => points,
            Self::AwaitingLabel { anchor, .. } => std::slice::from_ref(anchor),
        }
    }

    /// Returns true if nothing is captured.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// A point was picked on the model.
    Pick(PickPoint),
    /// The label prompt was confirmed with the given text.
    Confirm(String),
    /// The label prompt was cancelled.
    Cancel,
    /// The active tool changed.
    SwitchTool(Option<Tool>),
}

/// What the owner of the state machine must do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    /// Nothing to do.
    None,
    /// A measurement point was stored; more are needed.
    Pending { collected: usize, required: usize },
    /// Enough points were picked: create this measurement.
    CreateMeasurement {
        kind: MeasurementKind,
        points: Vec<PickPoint>,
    },
    /// An anchor was picked: prompt for the label text.
    LabelRequested { kind: AnnotationKind },
    /// The label was confirmed: create this annotation.
    CreateAnnotation {
        kind: AnnotationKind,
        anchor: PickPoint,
        text: String,
    },
    /// An incomplete capture was thrown away.
    Discarded { points: usize },
}

/// Computes the next state of the capture machine.
#[must_use]
pub fn transition(
    tool: Option<Tool>,
    state: CaptureState,
    event: ToolEvent,
) -> (Option<Tool>, CaptureState, ToolEffect) {
    match event {
        ToolEvent::SwitchTool(next) => {
            let discarded = state.pending_points().len();
            let effect = if discarded > 0 {
                ToolEffect::Discarded { points: discarded }
            } else {
                ToolEffect::None
            };
            (next, CaptureState::Idle, effect)
        }
        ToolEvent::Pick(point) => {
            let Some(active) = tool else {
                return (tool, state, ToolEffect::None);
            };
            if let Some(kind) = active.measurement_kind() {
                let mut points = match state {
                    CaptureState::Collecting { kind: k, points } if k == kind => points,
                    _ => Vec::new(),
                };
                points.push(point);
                let required = kind.required_points();
                if points.len() >= required {
                    (
                        tool,
                        CaptureState::Idle,
                        ToolEffect::CreateMeasurement { kind, points },
                    )
                } else {
                    let collected = points.len();
                    (
                        tool,
                        CaptureState::Collecting { kind, points },
                        ToolEffect::Pending {
                            collected,
                            required,
                        },
                    )
                }
            } else if let Some(kind) = active.annotation_kind() {
                // A new pick while the prompt is open moves the anchor.
                (
                    tool,
                    CaptureState::AwaitingLabel {
                        kind,
                        anchor: point,
                    },
                    ToolEffect::LabelRequested { kind },
                )
            } else {
                (tool, state, ToolEffect::None)
            }
        }
        ToolEvent::Confirm(text) => match state {
            CaptureState::AwaitingLabel { kind, anchor } => {
                let text = text.trim().to_string();
                if kind == AnnotationKind::Text && text.is_empty() {
                    // Text annotations need content; keep the prompt open.
                    (tool, CaptureState::AwaitingLabel { kind, anchor }, ToolEffect::None)
                } else {
                    (
                        tool,
                        CaptureState::Idle,
                        ToolEffect::CreateAnnotation { kind, anchor, text },
                    )
                }
            }
            other => (tool, other, ToolEffect::None),
        },
        ToolEvent::Cancel => match state {
            CaptureState::AwaitingLabel { .. } => (
                tool,
                CaptureState::Idle,
                ToolEffect::Discarded { points: 1 },
            ),
            other => (tool, other, ToolEffect::None),
        },
    }
}

/// Owns the active tool and capture state.
#[derive(Debug, Clone, Default)]
pub struct ToolMachine {
    tool: Option<Tool>,
    state: CaptureState,
}

impl ToolMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active tool, or `None` when no tool is selected.
    #[must_use]
    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    /// Points collected so far, or the pending label prompt.
    #[must_use]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Feeds an event through [`transition`].
    pub fn handle(&mut self, event: ToolEvent) -> ToolEffect {
        let state = std::mem::take(&mut self.state);
        let (tool, state, effect) = transition(self.tool, state, event);
        self.tool = tool;
        self.state = state;
        effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn pick(x: f32) -> ToolEvent {
        ToolEvent::Pick(PickPoint::new(Vec3::new(x, 0.0, 0.0)))
    }

    #[test]
    fn test_distance_needs_two_picks() {
        let mut machine = ToolMachine::new();
        machine.handle(ToolEvent::SwitchTool(Some(Tool::MeasureDistance)));
        assert_eq!(
            machine.handle(pick(0.0)),
            ToolEffect::Pending {
                collected: 1,
                required: 2
            }
        );
        assert_eq!(machine.tool(), Some(Tool::MeasureDistance));
        let effect = machine.handle(pick(1.0));
        assert!(matches!(
            effect,
            ToolEffect::CreateMeasurement { kind: MeasurementKind::Distance, ref points } if points.len() == 2
        ));
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_angle_needs_three_picks() {
        let mut machine = ToolMachine::new();
        machine.handle(ToolEvent::SwitchTool(Some(Tool::MeasureAngle)));
        machine.handle(pick(0.0));
        assert!(matches!(machine.handle(pick(1.0)), ToolEffect::Pending { collected: 2, .. }));
        assert!(matches!(
            machine.handle(pick(2.0)),
            ToolEffect::CreateMeasurement { kind: MeasurementKind::Angle, .. }
        ));
    }

    #[test]
    fn test_switch_discards_pending() {
        let mut machine = ToolMachine::new();
        machine.handle(ToolEvent::SwitchTool(Some(Tool::MeasureDistance)));
        machine.handle(pick(0.0));
        let effect = machine.handle(ToolEvent::SwitchTool(Some(Tool::AnnotatePoint)));
        assert_eq!(effect, ToolEffect::Discarded { points: 1 });
        assert!(machine.state().pending_points().is_empty());

        // Re-selecting the distance tool starts from scratch.
        machine.handle(ToolEvent::SwitchTool(Some(Tool::MeasureDistance)));
        assert!(matches!(machine.handle(pick(3.0)), ToolEffect::Pending { collected: 1, .. }));
    }

    #[test]
    fn test_annotation_confirm_and_cancel() {
        let mut machine = ToolMachine::new();
        machine.handle(ToolEvent::SwitchTool(Some(Tool::AnnotateText)));
        assert_eq!(
            machine.handle(pick(0.0)),
            ToolEffect::LabelRequested {
                kind: AnnotationKind::Text
            }
        );
        assert_eq!(machine.handle(ToolEvent::Confirm("   ".into())), ToolEffect::None);
        assert!(!machine.state().is_idle());
        assert!(matches!(
            machine.handle(ToolEvent::Confirm(" caries ".into())),
            ToolEffect::CreateAnnotation { ref text, .. } if text == "caries"
        ));

        machine.handle(pick(1.0));
        assert_eq!(machine.handle(ToolEvent::Cancel), ToolEffect::Discarded { points: 1 });
        assert!(machine.state().is_idle());
    }

    #[test]
    fn test_picks_ignored_without_capture_tool() {
        let mut machine = ToolMachine::new();
        assert_eq!(machine.handle(pick(0.0)), ToolEffect::None);
        machine.handle(ToolEvent::SwitchTool(Some(Tool::Select)));
        assert_eq!(machine.handle(pick(0.0)), ToolEffect::None);
        assert!(machine.state().is_idle());
    }
}
