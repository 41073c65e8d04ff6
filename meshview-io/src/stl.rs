//! STL format support
//!
//! Binary and ASCII STL are both accepted. A payload is treated as binary
//! when its length matches the triangle count in the header exactly, which
//! catches binary files whose free-form header happens to start with
//! `solid`.

use meshview_core::{Point3f, TriangleMesh, Vector3f};

use crate::error::{LoadError, LoadResult};
use crate::format::ModelFormat;
use crate::registry::MeshDecoder;

/// STL binary header size in bytes
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute)
const TRIANGLE_SIZE: usize = 50;

pub struct StlDecoder;

impl MeshDecoder for StlDecoder {
    fn decode(&self, bytes: &[u8]) -> LoadResult<TriangleMesh> {
        decode_stl(bytes)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Stl
    }
}

/// Decode an STL payload held in memory
pub fn decode_stl(bytes: &[u8]) -> LoadResult<TriangleMesh> {
    if bytes.len() < 6 {
        return Err(LoadError::decode("payload too small to be STL"));
    }

    if is_binary(bytes) {
        return decode_binary(bytes);
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(HEADER_SIZE)]);
    if head.trim_start().starts_with("solid") {
        decode_ascii(bytes)
    } else {
        decode_binary(bytes)
    }
}

fn binary_face_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn is_binary(bytes: &[u8]) -> bool {
    binary_face_count(bytes)
        .and_then(|n| n.checked_mul(TRIANGLE_SIZE))
        .map(|body| bytes.len() == HEADER_SIZE + 4 + body)
        .unwrap_or(false)
}

fn decode_binary(bytes: &[u8]) -> LoadResult<TriangleMesh> {
    let face_count = binary_face_count(bytes).ok_or_else(|| {
        LoadError::decode(format!(
            "binary STL header truncated: expected {} bytes, got {}",
            HEADER_SIZE + 4,
            bytes.len()
        ))
    })?;

    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < face_count {
        return Err(LoadError::decode(format!(
            "binary STL declares {} triangles but holds {}",
            face_count, available
        )));
    }

    let mut mesh = TriangleMesh::new();
    mesh.vertices.reserve(face_count * 3);
    mesh.faces.reserve(face_count);

    for tri in body.chunks_exact(TRIANGLE_SIZE).take(face_count) {
        // skip the stored normal, it is recomputed from the winding anyway
        let base = mesh.vertices.len();
        mesh.vertices.push(read_vertex(&tri[12..24]));
        mesh.vertices.push(read_vertex(&tri[24..36]));
        mesh.vertices.push(read_vertex(&tri[36..48]));
        mesh.faces.push([base, base + 1, base + 2]);
    }

    Ok(mesh)
}

fn read_vertex(buf: &[u8]) -> Point3f {
    let f = |i: usize| f32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
    Point3f::new(f(0), f(4), f(8))
}

fn decode_ascii(bytes: &[u8]) -> LoadResult<TriangleMesh> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LoadError::decode(format!("ASCII STL is not valid UTF-8: {}", e)))?;

    let mut mesh = TriangleMesh::new();
    let mut normals: Vec<Vector3f> = Vec::new();
    let mut facet_normal = Vector3f::zeros();
    let mut in_loop = false;
    let mut corners: Vec<Point3f> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                facet_normal = if parts.len() >= 5 {
                    Vector3f::new(
                        parse_f32(parts[2], line_no)?,
                        parse_f32(parts[3], line_no)?,
                        parse_f32(parts[4], line_no)?,
                    )
                } else {
                    Vector3f::zeros()
                };
            }
            "outer" => {
                in_loop = true;
                corners.clear();
            }
            "vertex" if in_loop => {
                if parts.len() < 4 {
                    return Err(LoadError::decode(format!(
                        "line {}: vertex needs three coordinates",
                        line_no + 1
                    )));
                }
                corners.push(Point3f::new(
                    parse_f32(parts[1], line_no)?,
                    parse_f32(parts[2], line_no)?,
                    parse_f32(parts[3], line_no)?,
                ));
            }
            "endloop" => in_loop = false,
            "endfacet" => {
                if corners.len() == 3 {
                    let base = mesh.vertices.len();
                    mesh.vertices.append(&mut corners);
                    mesh.faces.push([base, base + 1, base + 2]);
                    normals.extend([facet_normal; 3]);
                }
                corners.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    // files that leave every normal at zero get them recomputed downstream
    if normals.iter().any(|n| n.norm_squared() > 0.0) {
        mesh.set_normals(normals);
    }
    Ok(mesh)
}

fn parse_f32(token: &str, line_no: usize) -> LoadResult<f32> {
    token.parse::<f32>().map_err(|e| {
        LoadError::decode(format!("line {}: bad number '{}': {}", line_no + 1, token, e))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ASCII_TETRA: &str = "solid tetra
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 0 1 0
      vertex 1 0 0
    endloop
  endfacet
  facet normal 0 -1 0
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 0 1
    endloop
  endfacet
  facet normal -1 0 0
    outer loop
      vertex 0 0 0
      vertex 0 0 1
      vertex 0 1 0
    endloop
  endfacet
  facet normal 0.577 0.577 0.577
    outer loop
      vertex 1 0 0
      vertex 0 1 0
      vertex 0 0 1
    endloop
  endfacet
endsolid tetra
";

    /// Encode triangles as a binary STL whose header starts with "solid"
    pub(crate) fn binary_stl(tris: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut out = vec![b' '; HEADER_SIZE];
        out[..5].copy_from_slice(b"solid");
        out.extend_from_slice(&(tris.len() as u32).to_le_bytes());
        for tri in tris {
            out.extend_from_slice(&[0u8; 12]);
            for v in tri {
                for c in v {
                    out.extend_from_slice(&c.to_le_bytes());
                }
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_ascii_tetrahedron() {
        let mesh = decode_stl(ASCII_TETRA.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.vertex_count(), 12);
        assert!(mesh.normals.is_some());
    }

    #[test]
    fn test_binary_with_solid_header() {
        let bytes = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
        ]);
        let mesh = decode_stl(&bytes).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertices[4], Point3f::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_truncated_binary_fails() {
        let mut bytes = binary_stl(&[[[0.0; 3]; 3]; 3]);
        bytes[0] = b'x';
        bytes.truncate(bytes.len() - 20);
        assert!(matches!(decode_stl(&bytes), Err(LoadError::DecodeFailure { .. })));
    }

    #[test]
    fn test_bad_ascii_number_fails() {
        let text = "solid x\nfacet normal 0 0 1\nouter loop\nvertex 0 zero 0\n";
        let err = decode_stl(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }
}
