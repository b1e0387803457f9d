//! Measurement engine: the tool machine plus the record lists it fills.

use glam::Vec3;

use super::overlay::{build_overlay, OverlayCommand, OverlayStyle, ScreenProjection};
use super::records::{AnnotationId, MeasurementId, MeasurementStore, RecordId};
use super::tools::{CaptureState, Tool, ToolEffect, ToolEvent, ToolMachine};
use crate::error::Result;
use crate::pick::PickPoint;

/// Result of feeding a pick into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// The active tool does not capture points.
    Ignored,
    /// The point was stored; `required - collected` more are needed.
    Pending { collected: usize, required: usize },
    /// A measurement was created.
    Measured(MeasurementId),
    /// An annotation anchor was placed; call [`MeasurementEngine::confirm_annotation`]
    /// or [`MeasurementEngine::cancel_annotation`].
    AwaitingLabel,
}

/// Converts picked points into measurements and annotations.
#[derive(Debug, Clone)]
pub struct MeasurementEngine {
    machine: ToolMachine,
    store: MeasurementStore,
    unit_scale: f32,
    unit_label: String,
    revision: u64,
}

impl Default for MeasurementEngine {
    fn default() -> Self {
        Self::new("mm")
    }
}

impl MeasurementEngine {
    /// Creates an engine with unit scale 1 and the given length unit label.
    pub fn new(unit_label: impl Into<String>) -> Self {
        Self {
            machine: ToolMachine::new(),
            store: MeasurementStore::new(),
            unit_scale: 1.0,
            unit_label: unit_label.into(),
            revision: 0,
        }
    }

    /// Real-world units per model-space unit.
    #[must_use]
    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    /// Sets the real-world units per model-space unit.
    ///
    /// Applies to measurements created afterwards; existing values are kept.
    pub fn set_unit_scale(&mut self, unit_scale: f32) {
        if unit_scale.is_finite() && unit_scale > 0.0 {
            self.unit_scale = unit_scale;
        } else {
            log::warn!("ignoring invalid unit scale {unit_scale}");
        }
    }

    #[must_use]
    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    #[must_use]
    pub fn active_tool(&self) -> Option<Tool> {
        self.machine.tool()
    }

    #[must_use]
    pub fn capture_state(&self) -> &CaptureState {
        self.machine.state()
    }

    /// Points picked for the capture in progress.
    #[must_use]
    pub fn pending_points(&self) -> &[PickPoint] {
        self.machine.state().pending_points()
    }

    /// Changes the active tool, discarding any incomplete capture.
    ///
    /// Returns the number of discarded points.
    pub fn set_tool(&mut self, tool: Option<Tool>) -> usize {
        match self.machine.handle(ToolEvent::SwitchTool(tool)) {
            ToolEffect::Discarded { points } => {
                log::debug!("tool switch to {tool:?} discarded {points} pending point(s)");
                points
            }
            _ => 0,
        }
    }

    /// Feeds a picked point to the active tool.
    pub fn pick(&mut self, point: impl Into<PickPoint>) -> PickOutcome {
        match self.machine.handle(ToolEvent::Pick(point.into())) {
            ToolEffect::Pending {
                collected,
                required,
            } => PickOutcome::Pending {
                collected,
                required,
            },
            ToolEffect::CreateMeasurement { kind, points } => {
                match self
                    .store
                    .add_measurement(kind, points, self.unit_scale, &self.unit_label)
                {
                    Some(id) => {
                        self.revision += 1;
                        log::info!("created {kind:?} measurement {id}");
                        PickOutcome::Measured(id)
                    }
                    None => PickOutcome::Ignored,
                }
            }
            ToolEffect::LabelRequested { .. } => PickOutcome::AwaitingLabel,
            _ => PickOutcome::Ignored,
        }
    }

    /// Completes a pending annotation with the entered text.
    ///
    /// Returns `None` if no annotation is pending, or if a text annotation was
    /// confirmed without content (the prompt stays open).
    pub fn confirm_annotation(&mut self, text: impl Into<String>) -> Option<AnnotationId> {
        match self.machine.handle(ToolEvent::Confirm(text.into())) {
            ToolEffect::CreateAnnotation { kind, anchor, text } => {
                let id = self.store.add_annotation(kind, anchor, text);
                self.revision += 1;
                log::info!("created {kind:?} annotation {id}");
                Some(id)
            }
            _ => None,
        }
    }

    /// Drops a pending annotation without creating anything.
    pub fn cancel_annotation(&mut self) {
        self.machine.handle(ToolEvent::Cancel);
    }

    /// Removes every measurement and annotation.
    pub fn clear_all(&mut self) {
        if !self.store.is_empty() {
            self.store.clear_all();
            self.revision += 1;
        }
    }

    /// Removes one record.
    pub fn delete(&mut self, id: impl Into<RecordId>) -> Result<()> {
        self.store.delete(id.into())?;
        self.revision += 1;
        Ok(())
    }

    /// Flips one record's visibility.
    pub fn toggle_visible(&mut self, id: impl Into<RecordId>) -> Result<()> {
        self.store.toggle_visible(id.into())?;
        self.revision += 1;
        Ok(())
    }

    /// Replaces one record's label text.
    pub fn relabel(&mut self, id: impl Into<RecordId>, text: impl Into<String>) -> Result<()> {
        self.store.relabel(id.into(), text)?;
        self.revision += 1;
        Ok(())
    }

    /// Replaces one record's color.
    pub fn set_color(&mut self, id: impl Into<RecordId>, color: Vec3) -> Result<()> {
        self.store.set_color(id.into(), color)?;
        self.revision += 1;
        Ok(())
    }

    #[must_use]
    pub fn store(&self) -> &MeasurementStore {
        &self.store
    }

    /// Replaces the record lists (undo/redo, import). The tool state is kept.
    pub fn replace_store(&mut self, store: MeasurementStore) {
        self.store = store;
        self.revision += 1;
    }

    /// Counter bumped by every record mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Builds the 2D overlay for all visible records.
    #[must_use]
    pub fn overlay(&self, projection: &ScreenProjection, style: &OverlayStyle) -> Vec<OverlayCommand> {
        build_overlay(&self.store, projection, style)
    }
}
