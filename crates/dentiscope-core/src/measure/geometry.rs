//! Geometric quantities derived from picked points.

use glam::Vec3;

/// Arms shorter than this are treated as degenerate.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    (b - a).length()
}

/// Angle at `vertex` between the arms towards `a` and `c`, in degrees.
///
/// Uses `acos((v1·v2) / (|v1||v2|))` with the cosine clamped to [-1, 1], so
/// the result is always in [0, 180]. A zero-length arm yields 0.
#[must_use]
pub fn angle_degrees(a: Vec3, vertex: Vec3, c: Vec3) -> f32 {
    let v1 = a - vertex;
    let v2 = c - vertex;
    let denom = v1.length() * v2.length();
    if denom < DEGENERATE_EPSILON {
        return 0.0;
    }
    (v1.dot(v2) / denom)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
        .clamp(0.0, 180.0)
}

/// Area of a planar polygon given by its ordered vertices.
///
/// Fewer than three points enclose no area.
#[must_use]
pub fn polygon_area(points: &[Vec3]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let origin = points[0];
    let twice_area: Vec3 = points[1..]
        .windows(2)
        .map(|w| (w[0] - origin).cross(w[1] - origin))
        .sum();
    twice_area.length() * 0.5
}

/// Average of a set of points (the origin for an empty set).
#[must_use]
pub fn centroid(points: &[Vec3]) -> Vec3 {
    if points.is_empty() {
        return Vec3::ZERO;
    }
    points.iter().copied().sum::<Vec3>() / points.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_degrees(Vec3::X, Vec3::ZERO, Vec3::Y);
        assert!((angle - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_straight_and_zero_angle() {
        let straight = angle_degrees(Vec3::X, Vec3::ZERO, Vec3::NEG_X);
        assert!((straight - 180.0).abs() < 1e-4);
        let zero = angle_degrees(Vec3::X, Vec3::ZERO, Vec3::X * 2.0);
        assert!(zero.abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_angle() {
        assert_eq!(angle_degrees(Vec3::ZERO, Vec3::ZERO, Vec3::Y), 0.0);
    }

    #[test]
    fn test_square_area() {
        let square = [
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        assert!((polygon_area(&square) - 4.0).abs() < 1e-6);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&[Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0)]);
        assert_eq!(c, Vec3::new(1.0, 2.0, 3.0));
    }
}
