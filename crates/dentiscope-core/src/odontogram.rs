//! Tooth chart (odontogram) editing.
//!
//! The chart covers the permanent dentition in FDI notation: quadrants 1-4,
//! positions 1-8. Each tooth carries a status and a condition per surface.
//! [`ToothChartEditor`] routes every edit through a [`CommandHistory`] the
//! same way scene edits are.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DentiscopeError, Result};
use crate::history::CommandHistory;

/// FDI two-digit tooth number (11-18, 21-28, 31-38, 41-48).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToothNumber(u8);

impl ToothNumber {
    /// Validates an FDI tooth number.
    #[must_use]
    pub fn new(number: u8) -> Option<Self> {
        let quadrant = number / 10;
        let position = number % 10;
        ((1..=4).contains(&quadrant) && (1..=8).contains(&position)).then_some(Self(number))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Quadrant 1 (upper right) to 4 (lower right).
    #[must_use]
    pub fn quadrant(self) -> u8 {
        self.0 / 10
    }

    /// Position from the midline, 1 (central incisor) to 8 (third molar).
    #[must_use]
    pub fn position(self) -> u8 {
        self.0 % 10
    }

    #[must_use]
    pub fn is_upper(self) -> bool {
        self.quadrant() <= 2
    }

    /// Every permanent tooth in chart order.
    pub fn all() -> impl Iterator<Item = ToothNumber> {
        (1..=4u8).flat_map(|q| (1..=8u8).map(move |p| ToothNumber(q * 10 + p)))
    }
}

impl fmt::Display for ToothNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tooth surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Mesial,
    Distal,
    /// Occlusal on posterior teeth, incisal on anterior teeth.
    Occlusal,
    Buccal,
    Lingual,
}

impl Surface {
    pub const ALL: [Surface; 5] = [
        Surface::Mesial,
        Surface::Distal,
        Surface::Occlusal,
        Surface::Buccal,
        Surface::Lingual,
    ];
}

/// Clinical condition of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceCondition {
    #[default]
    Sound,
    Caries,
    Restored,
    Sealed,
    Fractured,
}

/// Status of the whole tooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToothStatus {
    #[default]
    Present,
    Missing,
    Implant,
    Crown,
}

/// Chart entry of one tooth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToothRecord {
    pub status: ToothStatus,
    pub surfaces: BTreeMap<Surface, SurfaceCondition>,
}

impl ToothRecord {
    /// Condition of a surface (sound when never charted).
    #[must_use]
    pub fn surface(&self, surface: Surface) -> SurfaceCondition {
        self.surfaces.get(&surface).copied().unwrap_or_default()
    }
}

/// The full chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothChart {
    teeth: BTreeMap<ToothNumber, ToothRecord>,
}

impl Default for ToothChart {
    fn default() -> Self {
        Self {
            teeth: ToothNumber::all().map(|n| (n, ToothRecord::default())).collect(),
        }
    }
}

impl ToothChart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tooth(&self, number: ToothNumber) -> Option<&ToothRecord> {
        self.teeth.get(&number)
    }

    pub fn teeth(&self) -> impl Iterator<Item = (ToothNumber, &ToothRecord)> {
        self.teeth.iter().map(|(n, r)| (*n, r))
    }

    /// Teeth with at least one non-sound surface or a non-present status.
    pub fn charted(&self) -> impl Iterator<Item = ToothNumber> + '_ {
        self.teeth
            .iter()
            .filter(|(_, r)| {
                r.status != ToothStatus::Present
                    || r.surfaces.values().any(|c| *c != SurfaceCondition::Sound)
            })
            .map(|(n, _)| *n)
    }

    fn record_mut(&mut self, number: ToothNumber) -> &mut ToothRecord {
        self.teeth.entry(number).or_default()
    }

    /// Returns a chart with one surface condition changed.
    ///
    /// Missing teeth have no surfaces to chart.
    pub fn with_surface(
        &self,
        number: ToothNumber,
        surface: Surface,
        condition: SurfaceCondition,
    ) -> Result<Self> {
        if self.tooth(number).map(|r| r.status) == Some(ToothStatus::Missing) {
            return Err(DentiscopeError::InvalidEdit(format!(
                "tooth {number} is charted as missing"
            )));
        }
        let mut next = self.clone();
        next.record_mut(number).surfaces.insert(surface, condition);
        Ok(next)
    }

    /// Returns a chart with one tooth's status changed. Marking a tooth
    /// missing clears its surfaces.
    #[must_use]
    pub fn with_status(&self, number: ToothNumber, status: ToothStatus) -> Self {
        let mut next = self.clone();
        let record = next.record_mut(number);
        record.status = status;
        if status == ToothStatus::Missing {
            record.surfaces.clear();
        }
        next
    }
}

/// Tooth chart plus its undo/redo history.
#[derive(Debug, Clone, Default)]
pub struct ToothChartEditor {
    chart: ToothChart,
    history: CommandHistory<ToothChart>,
}

impl ToothChartEditor {
    #[must_use]
    pub fn new(history_limit: Option<usize>) -> Self {
        Self {
            chart: ToothChart::new(),
            history: CommandHistory::with_limit(history_limit),
        }
    }

    #[must_use]
    pub fn chart(&self) -> &ToothChart {
        &self.chart
    }

    pub fn set_surface(
        &mut self,
        number: ToothNumber,
        surface: Surface,
        condition: SurfaceCondition,
    ) -> Result<()> {
        self.history
            .commit(&mut self.chart, |chart| chart.with_surface(number, surface, condition))
    }

    pub fn set_status(&mut self, number: ToothNumber, status: ToothStatus) {
        self.history.record(&self.chart);
        self.chart = self.chart.with_status(number, status);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.chart)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.chart)
    }

    #[must_use]
    pub fn history(&self) -> &CommandHistory<ToothChart> {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tooth(n: u8) -> ToothNumber {
        ToothNumber::new(n).expect("valid FDI number")
    }

    #[test]
    fn test_fdi_validation() {
        assert!(ToothNumber::new(11).is_some());
        assert!(ToothNumber::new(48).is_some());
        assert!(ToothNumber::new(19).is_none());
        assert!(ToothNumber::new(51).is_none());
        assert!(ToothNumber::new(10).is_none());
        assert_eq!(ToothNumber::all().count(), 32);
        assert!(tooth(26).is_upper());
        assert!(!tooth(36).is_upper());
    }

    #[test]
    fn test_surface_edits_undo_redo() {
        let mut editor = ToothChartEditor::default();
        let initial = editor.chart().clone();
        editor
            .set_surface(tooth(36), Surface::Occlusal, SurfaceCondition::Caries)
            .expect("present tooth");
        editor.set_status(tooth(18), ToothStatus::Missing);
        let edited = editor.chart().clone();
        assert_eq!(edited.charted().count(), 2);

        assert!(editor.undo());
        assert!(editor.undo());
        assert_eq!(editor.chart(), &initial);
        assert!(editor.redo());
        assert!(editor.redo());
        assert_eq!(editor.chart(), &edited);
    }

    #[test]
    fn test_missing_tooth_rejects_surface_edit() {
        let mut editor = ToothChartEditor::default();
        editor.set_status(tooth(21), ToothStatus::Missing);
        let before = editor.history().undo_len();
        assert!(editor
            .set_surface(tooth(21), Surface::Mesial, SurfaceCondition::Restored)
            .is_err());
        assert_eq!(editor.history().undo_len(), before);
    }

    #[test]
    fn test_missing_clears_surfaces() {
        let chart = ToothChart::new()
            .with_surface(tooth(46), Surface::Buccal, SurfaceCondition::Sealed)
            .expect("present tooth")
            .with_status(tooth(46), ToothStatus::Missing);
        assert!(chart.tooth(tooth(46)).expect("charted").surfaces.is_empty());
    }
}
