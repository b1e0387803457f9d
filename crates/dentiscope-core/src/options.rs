//! Configuration options for the viewer.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Global configuration options for a viewer session.
///
/// Options are plain data; they can be read from and written to JSON so a
/// deployment can ship its own defaults. Missing fields fall back to
/// [`ViewerOptions::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Unit label attached to every measurement.
    pub unit_label: String,

    /// Initial intensity of the shared light (0.0 - 2.0).
    pub default_light_intensity: f32,

    /// Whether the reference grid is drawn (perspective viewport only).
    pub show_grid: bool,

    /// Whether the center crosshair is drawn.
    pub show_crosshair: bool,

    /// Background color.
    pub background_color: Vec3,

    /// Maximum frames per second (0 = unlimited).
    pub max_fps: u32,

    /// Closest allowed camera-to-target distance.
    pub min_camera_distance: f32,

    /// Farthest allowed camera-to-target distance.
    pub max_camera_distance: f32,

    /// Maximum number of undo snapshots kept. `None` keeps every snapshot.
    pub history_limit: Option<usize>,

    /// Half-size of the reference grid in world units.
    pub grid_extent: f32,

    /// Number of grid cells along each axis.
    pub grid_divisions: u32,

    /// Pixel size of a single viewport when none is given by the host.
    pub default_viewport_size: (u32, u32),
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            unit_label: "mm".to_string(),
            default_light_intensity: 1.0,
            show_grid: true,
            show_crosshair: true,
            background_color: Vec3::new(0.08, 0.09, 0.11),
            max_fps: 60,
            min_camera_distance: 2.0,
            max_camera_distance: 50.0,
            history_limit: None,
            grid_extent: 5.0,
            grid_divisions: 10,
            default_viewport_size: (320, 240),
        }
    }
}

impl ViewerOptions {
    /// Parses options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Writes options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Frame interval implied by `max_fps`, or `None` when uncapped.
    #[must_use]
    pub fn frame_interval(&self) -> Option<std::time::Duration> {
        (self.max_fps > 0).then(|| std::time::Duration::from_secs_f64(1.0 / f64::from(self.max_fps)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ViewerOptions::default();
        assert_eq!(options.unit_label, "mm");
        assert!(options.history_limit.is_none());
        assert!(options.min_camera_distance < options.max_camera_distance);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = ViewerOptions::from_json(r#"{ "show_grid": false, "max_fps": 30 }"#)
            .expect("valid json");
        assert!(!options.show_grid);
        assert_eq!(options.max_fps, 30);
        assert_eq!(options.unit_label, "mm");
    }

    #[test]
    fn test_json_round_trip() {
        let mut options = ViewerOptions::default();
        options.history_limit = Some(16);
        let json = options.to_json().expect("serialize");
        assert_eq!(ViewerOptions::from_json(&json).expect("parse"), options);
    }

    #[test]
    fn test_frame_interval() {
        let mut options = ViewerOptions::default();
        assert!(options.frame_interval().is_some());
        options.max_fps = 0;
        assert!(options.frame_interval().is_none());
    }
}
