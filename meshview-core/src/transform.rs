//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::mesh::TriangleMesh;

/// A 3D transformation that can be applied to points and meshes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation transformation from a quaternion
    pub fn rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// Rotation about the X axis by `angle` radians
    pub fn rotation_x(angle: f32) -> Self {
        Self::rotation(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle))
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Apply the linear part of the transformation to a vector
    pub fn transform_vector(&self, vector: &Vector3<f32>) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0) * vector
    }

    /// Compose this transformation with another (`other` is applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Bake the transformation into a mesh's vertices and normals
    pub fn apply_to_mesh(&self, mesh: &mut TriangleMesh) {
        for v in &mut mesh.vertices {
            *v = self.transform_point(v);
        }
        if let Some(normals) = &mut mesh.normals {
            for n in normals.iter_mut() {
                *n = self
                    .transform_vector(n)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or(*n);
            }
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_x_turns_z_up_into_y_up() {
        let t = Transform3D::rotation_x(-std::f32::consts::FRAC_PI_2);
        let p = t.transform_point(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_compose_order() {
        let t = Transform3D::translation(Vector3::new(1.0, 0.0, 0.0))
            * Transform3D::rotation_x(std::f32::consts::PI);
        let p = t.transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-6);
    }
}
