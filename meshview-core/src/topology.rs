//! Derived mesh measurements shown next to the viewport

use serde::{Deserialize, Serialize};

use crate::{canonical::CanonicalMesh, mesh::TriangleMesh};

/// Scalar measurements of a loaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyAttributes {
    pub size_x: f32,
    pub size_y: f32,
    pub size_z: f32,
    /// Enclosed volume; meaningful for closed meshes only
    pub volume: f64,
    pub area: f64,
    pub triangle_count: usize,
}

/// Anything able to derive topology attributes from a canonical mesh
///
/// The default implementation is [`MeshTopology`]; hosts can substitute a
/// faster or more exact routine.
pub trait TopologyCalculator {
    fn calculate(&self, mesh: &CanonicalMesh) -> TopologyAttributes;
}

/// Divergence-theorem volume plus summed triangle area
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshTopology;

impl TopologyCalculator for MeshTopology {
    fn calculate(&self, mesh: &CanonicalMesh) -> TopologyAttributes {
        let dims = mesh.dimensions();
        let geometry = mesh.geometry();
        TopologyAttributes {
            size_x: dims.x,
            size_y: dims.y,
            size_z: dims.z,
            volume: signed_volume(geometry).abs(),
            area: surface_area(geometry),
            triangle_count: geometry.face_count(),
        }
    }
}

/// Sum of signed tetrahedron volumes against the origin
pub fn signed_volume(mesh: &TriangleMesh) -> f64 {
    mesh.triangles()
        .map(|[a, b, c]| {
            let a = a.coords.cast::<f64>();
            let b = b.coords.cast::<f64>();
            let c = c.coords.cast::<f64>();
            a.dot(&b.cross(&c)) / 6.0
        })
        .sum()
}

/// Total triangle area
pub fn surface_area(mesh: &TriangleMesh) -> f64 {
    mesh.triangles()
        .map(|[a, b, c]| {
            let ab = (b - a).cast::<f64>();
            let ac = (c - a).cast::<f64>();
            ab.cross(&ac).norm() * 0.5
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;
    use approx::assert_relative_eq;

    /// Closed unit cube with outward-facing triangles
    pub(crate) fn unit_cube() -> TriangleMesh {
        let v = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(1.0, 0.0, 1.0),
            Point3f::new(1.0, 1.0, 1.0),
            Point3f::new(0.0, 1.0, 1.0),
        ];
        let f = vec![
            [0, 2, 1], [0, 3, 2], // bottom
            [4, 5, 6], [4, 6, 7], // top
            [0, 1, 5], [0, 5, 4], // front
            [2, 3, 7], [2, 7, 6], // back
            [1, 2, 6], [1, 6, 5], // right
            [3, 0, 4], [3, 4, 7], // left
        ];
        TriangleMesh::from_vertices_and_faces(v, f)
    }

    #[test]
    fn test_cube_volume_and_area() {
        let cube = unit_cube();
        assert_relative_eq!(signed_volume(&cube), 1.0, epsilon = 1e-9);
        assert_relative_eq!(surface_area(&cube), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_attributes_from_canonical_mesh() {
        let canonical = CanonicalMesh::from_mesh(unit_cube()).unwrap();
        let attrs = MeshTopology.calculate(&canonical);
        assert_eq!(attrs.triangle_count, 12);
        assert_relative_eq!(attrs.size_x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(attrs.size_y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(attrs.size_z, 1.0, epsilon = 1e-5);
        // normalization is a rigid motion, volume survives it
        assert_relative_eq!(attrs.volume, 1.0, epsilon = 1e-4);
        assert_relative_eq!(attrs.area, 6.0, epsilon = 1e-4);
    }

    #[test]
    fn test_serializes_camel_case() {
        let attrs = TopologyAttributes {
            size_x: 1.0,
            size_y: 2.0,
            size_z: 3.0,
            volume: 6.0,
            area: 22.0,
            triangle_count: 12,
        };
        let json = serde_json::to_string(&attrs).unwrap();
        assert!(json.contains("\"triangleCount\":12"));
        assert!(json.contains("\"sizeX\""));
    }
}
