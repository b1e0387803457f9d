//! Picked points on the rendered model.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A point picked on the model, in normalized model space.
///
/// `depth` is the distance along the pick ray when the point came from a
/// viewport pick; points built programmatically carry no depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickPoint {
    /// Position in model space.
    pub position: Vec3,
    /// Distance from the camera along the pick ray, if known.
    pub depth: Option<f32>,
}

impl PickPoint {
    /// Creates a pick point without depth information.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            depth: None,
        }
    }

    /// Creates a pick point with a ray depth.
    #[must_use]
    pub fn with_depth(position: Vec3, depth: f32) -> Self {
        Self {
            position,
            depth: Some(depth),
        }
    }
}

impl From<Vec3> for PickPoint {
    fn from(position: Vec3) -> Self {
        Self::new(position)
    }
}
