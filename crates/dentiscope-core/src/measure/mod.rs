//! Measurement and annotation toolkit.
//!
//! - [`tools`]: the tool-mode state machine (pure transitions)
//! - [`records`]: persisted measurements and annotations
//! - [`engine`]: ties the machine to the records and the unit scale
//! - [`overlay`]: screen-space draw lists
//! - [`geometry`]: distance, angle and area formulas

pub mod engine;
pub mod geometry;
pub mod overlay;
pub mod records;
pub mod tools;

pub use engine::{MeasurementEngine, PickOutcome};
pub use overlay::{build_overlay, OverlayCommand, OverlayStyle, ScreenProjection};
pub use records::{
    Annotation, AnnotationId, AnnotationKind, Measurement, MeasurementId, MeasurementKind,
    MeasurementStore, RecordId,
};
pub use tools::{transition, CaptureState, Tool, ToolEffect, ToolEvent, ToolMachine};
