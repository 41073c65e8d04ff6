//! Camera and framing for the mesh preview

use meshview_core::{Axis, BoundingSphere, CanonicalMesh, Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Unit, UnitQuaternion};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Safety margin on the default framing distance
pub const FRAMING_FUDGE: f32 = 1.0;

/// Default distance in bounding-sphere radii
pub const FRAMING_DISTANCE_MULTIPLIER: f32 = 3.0;

/// A perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3f,
    pub target: Point3f,
    pub up: Vector3f,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3f,
        target: Point3f,
        up: Vector3f,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Preview camera at `position`: 45° fov looking at the origin
    pub fn preview(position: Point3f, aspect_ratio: f32) -> Self {
        Self::new(
            position,
            Point3f::origin(),
            Vector3f::y(),
            std::f32::consts::FRAC_PI_4,
            aspect_ratio,
            1.0,
            99999.0,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Camera-local basis `(right, up, forward)`
    pub fn basis(&self) -> (Vector3f, Vector3f, Vector3f) {
        let forward = (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3f::z());
        let right = forward
            .cross(&self.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3f::x);
        let up = right.cross(&forward);
        (right, up, forward)
    }

    /// Pan along a camera-local axis, moving position and target together
    pub fn translate_local(&mut self, axis: Axis, delta: f32) {
        let (right, up, forward) = self.basis();
        let direction = match axis {
            Axis::X => right,
            Axis::Y => up,
            Axis::Z => -forward,
        };
        let offset = direction * delta;
        self.position += offset;
        self.target += offset;
    }

    /// Rotate the camera around the target
    ///
    /// Yaw turns about the world up axis, pitch about the camera's right
    /// axis. Pitch stops short of the poles.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let offset = self.position - self.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }

        let (right, _, _) = self.basis();
        let yaw_rot = UnitQuaternion::from_axis_angle(&Vector3f::y_axis(), -yaw);
        let pitch_rot = UnitQuaternion::from_axis_angle(&Unit::new_normalize(right), -pitch);
        let rotated = yaw_rot * pitch_rot * offset;

        let elevation = (rotated.y / radius).clamp(-1.0, 1.0).asin();
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        let rotated = if elevation.abs() > limit {
            yaw_rot * offset
        } else {
            rotated
        };

        self.position = self.target + rotated;
    }

    /// Scale the distance to the target; factors above 1 move closer
    pub fn zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let offset = self.position - self.target;
        let distance = (offset.norm() / factor).clamp(self.near, self.far);
        if let Some(direction) = offset.try_normalize(f32::EPSILON) {
            self.position = self.target + direction * distance;
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::preview(Point3f::new(0.0, 0.0, 5.0), 16.0 / 9.0)
    }
}

/// Caller-supplied camera coordinates; `Some` always wins, zero included
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraOverrides {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Initial camera position for a bounding sphere
pub fn framing_position(sphere: &BoundingSphere, overrides: &CameraOverrides) -> Point3f {
    Point3f::new(
        overrides.x.unwrap_or(0.0),
        overrides.y.unwrap_or(0.0),
        overrides
            .z
            .unwrap_or(sphere.radius * FRAMING_DISTANCE_MULTIPLIER * FRAMING_FUDGE),
    )
}

/// Owns the live camera; absent until the first mesh is framed
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Option<Camera>,
    overrides: CameraOverrides,
    aspect_ratio: f32,
}

impl CameraController {
    pub fn new(overrides: CameraOverrides, width: u32, height: u32) -> Self {
        let aspect_ratio = if width > 0 && height > 0 {
            width as f32 / height as f32
        } else {
            1.0
        };
        Self {
            camera: None,
            overrides,
            aspect_ratio,
        }
    }

    /// Place the camera for `mesh`, creating it on first use
    pub fn frame(&mut self, mesh: &CanonicalMesh) {
        let position = framing_position(&mesh.bounding_sphere(), &self.overrides);
        debug!(x = position.x, y = position.y, z = position.z, "camera framed");
        self.camera = Some(Camera::preview(position, self.aspect_ratio));
    }

    /// Re-frame for the currently loaded mesh
    pub fn reset(&mut self, mesh: Option<&CanonicalMesh>) {
        if let Some(mesh) = mesh {
            self.frame(mesh);
        }
    }

    /// Relative pan along a camera-local axis; no-op without a camera
    pub fn translate(&mut self, axis: Axis, delta: f32) -> bool {
        match self.camera.as_mut() {
            Some(camera) => {
                camera.translate_local(axis, delta);
                true
            }
            None => false,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Live camera for orbit-style collaborators
    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn overrides(&self) -> CameraOverrides {
        self.overrides
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
        if let Some(camera) = self.camera.as_mut() {
            camera.set_aspect(width, height);
        }
    }

    pub fn clear(&mut self) {
        self.camera = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sphere(radius: f32) -> BoundingSphere {
        BoundingSphere {
            center: Point3f::origin(),
            radius,
        }
    }

    #[test]
    fn test_default_framing_distance() {
        for radius in [0.5, 1.0, 17.25, 1000.0] {
            let p = framing_position(&sphere(radius), &CameraOverrides::default());
            assert_relative_eq!(p.z, radius * 3.0);
            assert_relative_eq!(p.x, 0.0);
            assert_relative_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn test_overrides_win() {
        let overrides = CameraOverrides {
            x: Some(4.0),
            y: None,
            z: Some(0.0),
        };
        let p = framing_position(&sphere(10.0), &overrides);
        assert_eq!(p, Point3f::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_translate_without_camera_is_noop() {
        let mut controller = CameraController::new(CameraOverrides::default(), 800, 600);
        assert!(!controller.translate(Axis::X, 1.0));
        assert!(controller.camera().is_none());
    }

    #[test]
    fn test_translate_moves_position_and_target() {
        let mut camera = Camera::preview(Point3f::new(0.0, 0.0, 10.0), 1.0);
        camera.translate_local(Axis::Y, -2.0);
        assert_relative_eq!(camera.position, Point3f::new(0.0, -2.0, 10.0), epsilon = 1e-5);
        assert_relative_eq!(camera.target, Point3f::new(0.0, -2.0, 0.0), epsilon = 1e-5);

        camera.translate_local(Axis::X, 3.0);
        assert_relative_eq!(camera.position.x, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut camera = Camera::preview(Point3f::new(0.0, 0.0, 10.0), 1.0);
        camera.orbit(std::f32::consts::FRAC_PI_2, 0.0);
        assert_relative_eq!((camera.position - camera.target).norm(), 10.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-4);

        camera.orbit(0.0, 0.3);
        assert_relative_eq!((camera.position - camera.target).norm(), 10.0, epsilon = 1e-4);
        assert!(camera.position.y.abs() > 1.0);
    }

    #[test]
    fn test_zoom() {
        let mut camera = Camera::preview(Point3f::new(0.0, 0.0, 10.0), 1.0);
        camera.zoom(2.0);
        assert_relative_eq!(camera.position.z, 5.0, epsilon = 1e-5);
        camera.zoom(0.0);
        assert_relative_eq!(camera.position.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_aspect_follows_resize() {
        let mut controller = CameraController::new(CameraOverrides::default(), 800, 600);
        let mesh = meshview_core::TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(-1.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let mesh = CanonicalMesh::from_normalized(mesh).unwrap();
        controller.frame(&mesh);
        controller.set_aspect(1000, 500);
        assert_relative_eq!(controller.camera().unwrap().aspect_ratio, 2.0);
    }
}
