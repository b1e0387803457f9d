//! Persisted measurements and annotations.

use std::fmt;

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::geometry;
use crate::error::{DentiscopeError, Result};
use crate::pick::PickPoint;

/// Identifier of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementId(pub u64);

impl fmt::Display for MeasurementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "measurement-{}", self.0)
    }
}

/// Identifier of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "annotation-{}", self.0)
    }
}

/// Either kind of record, for operations that act on both lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordId {
    Measurement(MeasurementId),
    Annotation(AnnotationId),
}

impl From<MeasurementId> for RecordId {
    fn from(id: MeasurementId) -> Self {
        Self::Measurement(id)
    }
}

impl From<AnnotationId> for RecordId {
    fn from(id: AnnotationId) -> Self {
        Self::Annotation(id)
    }
}

/// The kind of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Straight-line distance between two points.
    Distance,
    /// Angle at the middle of three points.
    Angle,
    /// Area of a planar polygon.
    Area,
}

impl MeasurementKind {
    /// Minimum number of points needed to compute this kind.
    #[must_use]
    pub fn required_points(self) -> usize {
        match self {
            Self::Distance => 2,
            Self::Angle | Self::Area => 3,
        }
    }

    /// Default overlay color.
    #[must_use]
    pub fn default_color(self) -> Vec3 {
        match self {
            Self::Distance => Vec3::new(1.0, 0.84, 0.0),
            Self::Angle => Vec3::new(0.0, 0.85, 0.9),
            Self::Area => Vec3::new(0.3, 0.9, 0.4),
        }
    }

    /// Suffix shown after the value, e.g. "mm" -> "mm²" for areas.
    ///
    /// Records always store the plain length unit; this is display only.
    #[must_use]
    pub fn display_unit(self, length_unit: &str) -> String {
        match self {
            Self::Distance => length_unit.to_string(),
            Self::Angle => "°".to_string(),
            Self::Area => format!("{length_unit}²"),
        }
    }

    /// Computes the value for a point set, or `None` if there are too few points.
    ///
    /// Lengths are multiplied by `unit_scale` (areas by its square); angles
    /// are scale-free.
    #[must_use]
    pub fn compute(self, points: &[Vec3], unit_scale: f32) -> Option<f32> {
        if points.len() < self.required_points() {
            return None;
        }
        Some(match self {
            Self::Distance => geometry::distance(points[0], points[1]) * unit_scale,
            Self::Angle => geometry::angle_degrees(points[0], points[1], points[2]),
            Self::Area => geometry::polygon_area(points) * unit_scale * unit_scale,
        })
    }
}

/// A geometric quantity derived from picked points.
///
/// The point set and the value are fixed at creation; only the label,
/// color and visibility change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    id: MeasurementId,
    kind: MeasurementKind,
    points: Vec<PickPoint>,
    value: f32,
    unit: String,
    /// Optional user label.
    pub label: Option<String>,
    /// Overlay color.
    pub color: Vec3,
    /// Whether the overlay draws this measurement.
    pub visible: bool,
    created_at: DateTime<Utc>,
}

impl Measurement {
    fn new(
        id: MeasurementId,
        kind: MeasurementKind,
        points: Vec<PickPoint>,
        unit_scale: f32,
        length_unit: &str,
    ) -> Option<Self> {
        let positions: Vec<Vec3> = points.iter().map(|p| p.position).collect();
        let value = kind.compute(&positions, unit_scale)?;
        Some(Self {
            id,
            kind,
            points,
            value,
            unit: length_unit.to_string(),
            label: None,
            color: kind.default_color(),
            visible: true,
            created_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn id(&self) -> MeasurementId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    #[must_use]
    pub fn points(&self) -> &[PickPoint] {
        &self.points
    }

    /// Returns the point positions.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|p| p.position)
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The configured length unit, whatever the kind.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Formats the value with its unit, prefixed by the label if present.
    #[must_use]
    pub fn display_text(&self) -> String {
        let suffix = self.kind.display_unit(&self.unit);
        let value = match self.kind {
            MeasurementKind::Angle => format!("{:.1}{suffix}", self.value),
            MeasurementKind::Distance | MeasurementKind::Area => {
                format!("{:.2} {suffix}", self.value)
            }
        };
        match &self.label {
            Some(label) if !label.is_empty() => format!("{label}: {value}"),
            _ => value,
        }
    }
}

/// The kind of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// A marker with an offset label.
    Point,
    /// A colored text box at the anchor.
    Text,
    /// An arrow pointing at the anchor.
    Arrow,
}

impl AnnotationKind {
    /// Default overlay color.
    #[must_use]
    pub fn default_color(self) -> Vec3 {
        match self {
            Self::Point => Vec3::new(0.95, 0.25, 0.25),
            Self::Text => Vec3::new(0.25, 0.5, 0.95),
            Self::Arrow => Vec3::new(1.0, 0.55, 0.1),
        }
    }
}

/// A non-metric marker attached to a model position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    kind: AnnotationKind,
    position: PickPoint,
    /// Label or description.
    pub text: String,
    /// Overlay color.
    pub color: Vec3,
    /// Whether the overlay draws this annotation.
    pub visible: bool,
    created_at: DateTime<Utc>,
}

impl Annotation {
    #[must_use]
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    #[must_use]
    pub fn position(&self) -> PickPoint {
        self.position
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The measurement and annotation lists of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementStore {
    measurements: Vec<Measurement>,
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl MeasurementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Creates a measurement if `points` has enough entries for `kind`.
    pub fn add_measurement(
        &mut self,
        kind: MeasurementKind,
        points: Vec<PickPoint>,
        unit_scale: f32,
        length_unit: &str,
    ) -> Option<MeasurementId> {
        if points.len() < kind.required_points() {
            return None;
        }
        let id = MeasurementId(self.allocate_id());
        let measurement = Measurement::new(id, kind, points, unit_scale, length_unit)?;
        self.measurements.push(measurement);
        Some(id)
    }

    /// Creates an annotation.
    pub fn add_annotation(
        &mut self,
        kind: AnnotationKind,
        position: PickPoint,
        text: impl Into<String>,
    ) -> AnnotationId {
        let id = AnnotationId(self.allocate_id());
        self.annotations.push(Annotation {
            id,
            kind,
            position,
            text: text.into(),
            color: kind.default_color(),
            visible: true,
            created_at: Utc::now(),
        });
        id
    }

    #[must_use]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    #[must_use]
    pub fn measurement(&self, id: MeasurementId) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    fn measurement_mut(&mut self, id: MeasurementId) -> Result<&mut Measurement> {
        self.measurements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DentiscopeError::MeasurementNotFound(id.0))
    }

    fn annotation_mut(&mut self, id: AnnotationId) -> Result<&mut Annotation> {
        self.annotations
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(DentiscopeError::AnnotationNotFound(id.0))
    }

    /// Removes a single record.
    pub fn delete(&mut self, id: RecordId) -> Result<()> {
        match id {
            RecordId::Measurement(id) => {
                let index = self
                    .measurements
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or(DentiscopeError::MeasurementNotFound(id.0))?;
                self.measurements.remove(index);
            }
            RecordId::Annotation(id) => {
                let index = self
                    .annotations
                    .iter()
                    .position(|a| a.id == id)
                    .ok_or(DentiscopeError::AnnotationNotFound(id.0))?;
                self.annotations.remove(index);
            }
        }
        Ok(())
    }

    /// Flips a record's visibility.
    pub fn toggle_visible(&mut self, id: RecordId) -> Result<()> {
        match id {
            RecordId::Measurement(id) => {
                let m = self.measurement_mut(id)?;
                m.visible = !m.visible;
            }
            RecordId::Annotation(id) => {
                let a = self.annotation_mut(id)?;
                a.visible = !a.visible;
            }
        }
        Ok(())
    }

    /// Replaces a measurement's label or an annotation's text.
    pub fn relabel(&mut self, id: RecordId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        match id {
            RecordId::Measurement(id) => {
                self.measurement_mut(id)?.label = (!text.is_empty()).then_some(text);
            }
            RecordId::Annotation(id) => self.annotation_mut(id)?.text = text,
        }
        Ok(())
    }

    /// Replaces a record's overlay color.
    pub fn set_color(&mut self, id: RecordId, color: Vec3) -> Result<()> {
        let color = color.clamp(Vec3::ZERO, Vec3::ONE);
        match id {
            RecordId::Measurement(id) => self.measurement_mut(id)?.color = color,
            RecordId::Annotation(id) => self.annotation_mut(id)?.color = color,
        }
        Ok(())
    }

    /// Removes every measurement and annotation.
    pub fn clear_all(&mut self) {
        self.measurements.clear();
        self.annotations.clear();
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.measurements.len() + self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty() && self.annotations.is_empty()
    }

    /// Serializes both lists to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores both lists from JSON produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let mut store: Self = serde_json::from_str(json)?;
        // Keep ids unique even if the file was edited by hand.
        let max_id = store
            .measurements
            .iter()
            .map(|m| m.id.0)
            .chain(store.annotations.iter().map(|a| a.id.0))
            .max()
            .unwrap_or(0);
        store.next_id = store.next_id.max(max_id);
        Ok(store)
    }
}
