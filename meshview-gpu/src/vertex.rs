//! CPU-side conversion of scene layers into GPU vertex streams
//!
//! Every layer is uploaded once per [`LayerId`](meshview_viewer::LayerId),
//! so the layer translation is baked into the vertex positions here.

use bytemuck::{Pod, Zeroable};
use meshview_core::{Point3f, TriangleMesh, Vector3f};
use meshview_viewer::{Layer, LayerKind, Material, Rgb, SceneNode};

/// Vertex data shared by the triangle and line pipelines
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl SceneVertex {
    pub fn new(position: Point3f, normal: Vector3f, color: Rgb, alpha: f32) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            normal: [normal.x, normal.y, normal.z],
            color: [color[0], color[1], color[2], alpha],
        }
    }

    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SceneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Pipeline a batch is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Lit triangles
    Shaded,
    /// Unlit depth-tested lines
    Lines,
    /// Unlit lines drawn over everything
    OverlayLines,
}

/// One draw call worth of vertices
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBatch {
    pub kind: BatchKind,
    pub vertices: Vec<SceneVertex>,
}

/// Convert a layer into draw batches
///
/// Labels produce nothing; `overlay_opacity` scales the alpha of the
/// measurement overlay's lines.
pub fn layer_batches(layer: &Layer, overlay_opacity: f32) -> Vec<VertexBatch> {
    let offset = layer.translation;
    let opacity_scale = if layer.kind == LayerKind::MeasurementOverlay {
        overlay_opacity
    } else {
        1.0
    };

    layer
        .nodes
        .iter()
        .filter_map(|node| match node {
            SceneNode::Mesh { geometry, material } => Some(mesh_batch(geometry, material, offset)),
            SceneNode::Lines { segments, material } => {
                let (color, opacity, depth_test) = match *material {
                    Material::Line {
                        color,
                        opacity,
                        depth_test,
                    } => (color, opacity, depth_test),
                    Material::Phong { color, .. } => (color, 1.0, true),
                };
                Some(VertexBatch {
                    kind: if depth_test {
                        BatchKind::Lines
                    } else {
                        BatchKind::OverlayLines
                    },
                    vertices: segment_vertices(segments, color, opacity * opacity_scale, offset),
                })
            }
            SceneNode::Grid {
                size,
                divisions,
                center_color,
                grid_color,
            } => Some(VertexBatch {
                kind: BatchKind::Lines,
                vertices: grid_vertices(*size, *divisions, *center_color, *grid_color, offset),
            }),
            SceneNode::Label { .. } => None,
        })
        .filter(|batch| !batch.vertices.is_empty())
        .collect()
}

fn mesh_batch(mesh: &TriangleMesh, material: &Material, offset: Vector3f) -> VertexBatch {
    match *material {
        Material::Phong {
            color,
            wireframe: true,
            ..
        } => {
            let segments: Vec<[Point3f; 2]> = mesh
                .unique_edges()
                .into_iter()
                .map(|[a, b]| [mesh.vertices[a], mesh.vertices[b]])
                .collect();
            VertexBatch {
                kind: BatchKind::Lines,
                vertices: segment_vertices(&segments, color, 1.0, offset),
            }
        }
        Material::Phong { color, .. } | Material::Line { color, .. } => VertexBatch {
            kind: BatchKind::Shaded,
            vertices: triangle_vertices(mesh, color, offset),
        },
    }
}

/// Flat-shaded triangle list, one face normal per triangle
pub fn triangle_vertices(mesh: &TriangleMesh, color: Rgb, offset: Vector3f) -> Vec<SceneVertex> {
    let normals = mesh.calculate_face_normals();
    mesh.triangles()
        .zip(normals)
        .flat_map(|(corners, normal)| corners.map(|p| SceneVertex::new(p + offset, normal, color, 1.0)))
        .collect()
}

/// Line list from point pairs
pub fn segment_vertices(segments: &[[Point3f; 2]], color: Rgb, alpha: f32, offset: Vector3f) -> Vec<SceneVertex> {
    segments
        .iter()
        .flat_map(|[a, b]| {
            [
                SceneVertex::new(*a + offset, Vector3f::zeros(), color, alpha),
                SceneVertex::new(*b + offset, Vector3f::zeros(), color, alpha),
            ]
        })
        .collect()
}

/// Grid helper lines; the two lines through the center get `center_color`
pub fn grid_vertices(size: f32, divisions: u32, center_color: Rgb, grid_color: Rgb, offset: Vector3f) -> Vec<SceneVertex> {
    let center = divisions / 2;
    SceneNode::grid_segments(size, divisions)
        .chunks(2)
        .enumerate()
        .flat_map(|(i, pair)| {
            let color = if i as u32 == center && divisions % 2 == 0 {
                center_color
            } else {
                grid_color
            };
            segment_vertices(pair, color, 1.0, offset)
        })
        .collect()
}
