//! Camera and view management.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// How the camera responds to drag input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationStyle {
    /// Orbits around the target, constrained to the up direction.
    #[default]
    Turntable,
    /// Pan and zoom only; rotation is locked to keep an anatomical plane.
    Planar,
}

/// Camera projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

/// A ray in world space with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A 3D camera for viewing the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    pub navigation_style: NavigationStyle,
    pub projection_mode: ProjectionMode,
    /// Half-height of the view volume in orthographic mode.
    pub ortho_scale: f32,
}

impl Camera {
    /// Creates a perspective camera at `position` looking at `target`.
    #[must_use]
    pub fn new(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            up,
            fov: std::f32::consts::FRAC_PI_4, // 45 degrees
            aspect_ratio: 4.0 / 3.0,
            near: 0.01,
            far: 1000.0,
            navigation_style: NavigationStyle::Turntable,
            projection_mode: ProjectionMode::Perspective,
            ortho_scale: 1.0,
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection_mode {
            ProjectionMode::Perspective => {
                Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let half_height = self.ortho_scale;
                let half_width = half_height * self.aspect_ratio;
                // Symmetric depth range so geometry between the camera and
                // the target is never clipped.
                let depth = (self.distance() + self.far).max(self.ortho_scale * 100.0);
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    -depth,
                    depth,
                )
            }
        }
    }

    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Camera-to-target distance.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Moves the camera along its view direction to the given distance.
    /// The orthographic half-height follows so both projections frame the
    /// same region at the target.
    pub fn set_distance(&mut self, distance: f32) {
        let direction = self.forward();
        self.position = self.target - direction * distance;
        self.ortho_scale = (distance * (self.fov * 0.5).tan()).max(0.01);
    }

    /// Orbits the camera around the target. Returns false when the
    /// navigation style locks rotation.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) -> bool {
        if self.navigation_style != NavigationStyle::Turntable {
            return false;
        }
        let radius = self.distance();
        if radius <= f32::EPSILON {
            return false;
        }
        let mut theta = (self.position.x - self.target.x).atan2(self.position.z - self.target.z);
        let mut phi = ((self.position.y - self.target.y) / radius).clamp(-1.0, 1.0).acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        true
    }

    /// Moves the camera and target together in the view plane.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let right = self.right();
        let up = right.cross(self.forward()).normalize_or_zero();
        let offset = right * delta_x + up * delta_y;
        self.position += offset;
        self.target += offset;
    }

    /// Frames an axis-aligned box, keeping the current view direction.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let size = (max - min).length().max(1e-3);
        let direction = self.forward();
        self.target = center;
        self.position = center - direction * size * 1.5;
        self.near = size * 0.001;
        self.far = size * 100.0;
        self.ortho_scale = (size * 0.6).max(0.1);
    }

    /// Casts a ray through a pixel of a `width` x `height` viewport.
    ///
    /// Pixel coordinates have their origin at the top-left corner.
    #[must_use]
    pub fn screen_ray(&self, pixel: Vec2, width: u32, height: u32) -> Option<Ray> {
        if width == 0 || height == 0 {
            return None;
        }

        let ndc_x = (pixel.x / (width as f32 * 0.5)) - 1.0;
        let ndc_y = 1.0 - (pixel.y / (height as f32 * 0.5));
        let inv_view_proj = self.view_projection_matrix().inverse();

        // glam's right-handed projections use a [0, 1] depth range.
        let near = inv_view_proj * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        if near.w.abs() < 1e-6 || far.w.abs() < 1e-6 {
            return None;
        }

        let origin = near.truncate() / near.w;
        let direction = (far.truncate() / far.w - origin).normalize_or_zero();
        if direction.length_squared() < 1e-12 {
            return None;
        }
        Some(Ray { origin, direction })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
    }
}

/// Möller-Trumbore ray/triangle intersection. Returns the ray parameter of
/// the hit.
#[must_use]
pub fn ray_intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let eps = 1e-7;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < eps {
        return None;
    }
    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    (t > eps).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_mode_perspective() {
        let camera = Camera::default();
        assert!(camera.projection_matrix().w_axis.z != 0.0);
    }

    #[test]
    fn test_projection_mode_orthographic() {
        let mut camera = Camera::default();
        camera.projection_mode = ProjectionMode::Orthographic;
        camera.ortho_scale = 5.0;
        assert!((camera.projection_matrix().w_axis.w - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let mut camera = Camera::new(Vec3::new(5.0, 5.0, 5.0), Vec3::ZERO, Vec3::Y);
        let radius = camera.distance();
        assert!(camera.orbit(0.3, -0.2));
        assert!((camera.distance() - radius).abs() < 1e-4);
    }

    #[test]
    fn test_planar_camera_refuses_orbit() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.navigation_style = NavigationStyle::Planar;
        let before = camera.clone();
        assert!(!camera.orbit(1.0, 1.0));
        assert_eq!(camera, before);
    }

    #[test]
    fn test_pan_moves_target() {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        camera.pan(1.0, 2.0);
        assert!((camera.target - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        assert!((camera.distance() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_center_ray_hits_target() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let ray = camera
            .screen_ray(Vec2::new(50.0, 50.0), 100, 100)
            .expect("valid viewport");
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert!(camera.screen_ray(Vec2::ZERO, 0, 10).is_none());
    }

    #[test]
    fn test_ray_triangle() {
        let ray = Ray {
            origin: Vec3::new(0.2, 0.2, 5.0),
            direction: Vec3::NEG_Z,
        };
        let t = ray_intersect_triangle(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).expect("hit");
        assert!((t - 5.0).abs() < 1e-5);
        assert!((ray.at(t) - Vec3::new(0.2, 0.2, 0.0)).length() < 1e-5);

        let miss = Ray {
            origin: Vec3::new(2.0, 2.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(ray_intersect_triangle(&miss, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }
}
