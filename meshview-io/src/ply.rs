//! PLY format support

use meshview_core::{Point3f, TriangleMesh, Vector3f};
use ply_rs::{
    parser::Parser,
    ply::{DefaultElement, Property},
};

use crate::error::{LoadError, LoadResult};
use crate::format::ModelFormat;
use crate::registry::MeshDecoder;

pub struct PlyDecoder;

impl MeshDecoder for PlyDecoder {
    fn decode(&self, bytes: &[u8]) -> LoadResult<TriangleMesh> {
        decode_ply(bytes)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Ply
    }
}

/// Decode an ASCII or binary PLY payload held in memory
pub fn decode_ply(bytes: &[u8]) -> LoadResult<TriangleMesh> {
    let mut reader = bytes;
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader)?;

    // Extract vertices
    let mut vertices = Vec::new();
    if let Some(vertex_element) = ply.payload.get("vertex") {
        for vertex in vertex_element {
            let x = extract_property_value(vertex, "x")?;
            let y = extract_property_value(vertex, "y")?;
            let z = extract_property_value(vertex, "z")?;

            vertices.push(Point3f::new(x, y, z));
        }
    }

    // Extract faces, fan-triangulating polygons
    let mut faces = Vec::new();
    if let Some(face_element) = ply.payload.get("face") {
        for face in face_element {
            let indices = extract_face_indices(face)?;
            for i in 1..indices.len().saturating_sub(1) {
                faces.push([indices[0], indices[i], indices[i + 1]]);
            }
        }
    }

    // Extract normals if every vertex has them
    let normals = ply.payload.get("vertex").and_then(|vertex_element| {
        vertex_element
            .iter()
            .map(|vertex| {
                Some(Vector3f::new(
                    extract_property_value(vertex, "nx").ok()?,
                    extract_property_value(vertex, "ny").ok()?,
                    extract_property_value(vertex, "nz").ok()?,
                ))
            })
            .collect::<Option<Vec<_>>>()
    });

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    if let Some(normals) = normals {
        mesh.set_normals(normals);
    }
    if !mesh.has_valid_indices() {
        return Err(LoadError::decode("PLY face references a missing vertex"));
    }

    Ok(mesh)
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> LoadResult<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        _ => Err(LoadError::decode(format!(
            "PLY property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> LoadResult<Vec<usize>> {
    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUInt(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        Some(Property::ListUShort(indices)) => Ok(indices.iter().map(|&idx| idx as usize).collect()),
        _ => Err(LoadError::decode("PLY face indices not found")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_QUAD: &str = "ply
format ascii 1.0
comment quad
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
element face 1
property list uchar int vertex_indices
end_header
0 0 0 0 0 1
1 0 0 0 0 1
1 1 0 0 0 1
0 1 0 0 0 1
4 0 1 2 3
";

    #[test]
    fn test_ascii_quad_with_normals() {
        let mesh = decode_ply(ASCII_QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.normals.as_ref().map(|n| n.len()), Some(4));
    }

    #[test]
    fn test_missing_header_is_decode_failure() {
        let err = decode_ply(b"not a ply file").unwrap_err();
        assert!(matches!(err, LoadError::DecodeFailure { .. }));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let bad = ASCII_QUAD.replace("4 0 1 2 3", "3 0 1 9");
        assert!(decode_ply(bad.as_bytes()).is_err());
    }
}
