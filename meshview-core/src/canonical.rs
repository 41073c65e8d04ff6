//! Canonical renderable mesh
//!
//! Decoded geometry arrives in whatever frame the source file used. The
//! viewer works on a normalized copy: centered on its bounding-box center and
//! rotated from Z-up into the Y-up viewer frame. Bounding data is measured
//! after normalization and never changes afterwards.

use std::sync::Arc;

use crate::{
    bounds::{Aabb, BoundingSphere, Bounded},
    error::{Error, Result},
    mesh::TriangleMesh,
    point::*,
    transform::Transform3D,
};

/// Axis-aligned extents of a canonical mesh
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Dimensions {
    pub fn max(&self) -> f32 {
        self.x.max(self.y).max(self.z)
    }
}

impl From<Vector3f> for Dimensions {
    fn from(v: Vector3f) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Immutable, normalized triangle geometry plus its bounding data
///
/// The geometry sits behind an `Arc` so scene layers can share it without
/// copying vertex data.
#[derive(Debug, Clone)]
pub struct CanonicalMesh {
    geometry: Arc<TriangleMesh>,
    bounds: Aabb,
    sphere: BoundingSphere,
    dimensions: Dimensions,
}

impl CanonicalMesh {
    /// Normalize a decoded mesh
    ///
    /// Fails when the mesh has no triangles or references missing vertices.
    pub fn from_mesh(mut mesh: TriangleMesh) -> Result<Self> {
        if mesh.is_empty() {
            return Err(Error::InvalidData("mesh has no triangles".to_string()));
        }
        if !mesh.has_valid_indices() {
            return Err(Error::InvalidData(
                "face references a vertex out of range".to_string(),
            ));
        }
        if mesh.vertices.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData("non-finite vertex coordinate".to_string()));
        }

        let source_bounds = mesh
            .aabb()
            .ok_or_else(|| Error::InvalidData("mesh has no vertices".to_string()))?;
        let recenter = Transform3D::translation(-source_bounds.center().coords);
        let to_y_up = Transform3D::rotation_x(-std::f32::consts::FRAC_PI_2);
        (to_y_up * recenter).apply_to_mesh(&mut mesh);

        Self::from_normalized(mesh)
    }

    /// Wrap geometry that is already centered and Y-up
    pub fn from_normalized(mesh: TriangleMesh) -> Result<Self> {
        let bounds = mesh
            .aabb()
            .ok_or_else(|| Error::InvalidData("mesh has no vertices".to_string()))?;
        let sphere = BoundingSphere::from_points(&mesh.vertices)
            .ok_or_else(|| Error::InvalidData("mesh has no vertices".to_string()))?;

        Ok(Self {
            geometry: Arc::new(mesh),
            dimensions: bounds.size().into(),
            bounds,
            sphere,
        })
    }

    /// Shared handle to the normalized geometry
    pub fn geometry(&self) -> &Arc<TriangleMesh> {
        &self.geometry
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.sphere
    }

    /// `(xDim, yDim, zDim)` after normalization
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn triangle_count(&self) -> usize {
        self.geometry.face_count()
    }
}
