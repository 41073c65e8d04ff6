//! OBJ format support

use meshview_core::{Point3f, TriangleMesh};
use obj::ObjData;

use crate::error::{LoadError, LoadResult};
use crate::format::ModelFormat;
use crate::registry::MeshDecoder;

pub struct ObjDecoder;

impl MeshDecoder for ObjDecoder {
    fn decode(&self, bytes: &[u8]) -> LoadResult<TriangleMesh> {
        decode_obj(bytes)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Obj
    }
}

/// Decode a Wavefront OBJ payload held in memory
///
/// Polygons with more than three corners are fan-triangulated; texture and
/// normal indices are dropped.
pub fn decode_obj(bytes: &[u8]) -> LoadResult<TriangleMesh> {
    let data = ObjData::load_buf(bytes)?;

    let vertices: Vec<Point3f> = data
        .position
        .iter()
        .map(|&[x, y, z]| Point3f::new(x, y, z))
        .collect();

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, Vec::new());
    let polygons = data
        .objects
        .iter()
        .flat_map(|object| &object.groups)
        .flat_map(|group| &group.polys);
    for polygon in polygons {
        let corners: Vec<usize> = polygon.0.iter().map(|tuple| tuple.0).collect();
        if corners.len() < 3 {
            continue;
        }
        for i in 1..corners.len() - 1 {
            mesh.add_face([corners[0], corners[i], corners[i + 1]]);
        }
    }

    if !mesh.has_valid_indices() {
        return Err(LoadError::decode("OBJ face references a missing vertex"));
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_fan_triangulated() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = decode_obj(src.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_faces_with_texture_and_normal_indices() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
        let mesh = decode_obj(src.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_polygons_across_groups_are_collected() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\ng first\nf 1 2 3\ng second\nf 1 2 4\n";
        let mesh = decode_obj(src.as_bytes()).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 1, 3]]);
    }

    #[test]
    fn test_malformed_face_is_decode_failure() {
        let err = decode_obj(b"v 0 0 0\nf a b c\n").unwrap_err();
        assert!(matches!(err, LoadError::DecodeFailure { .. }));
    }

    #[test]
    fn test_no_faces_is_empty() {
        let mesh = decode_obj(b"v 0 0 0\nv 1 0 0\n").unwrap();
        assert!(mesh.is_empty());
    }
}
