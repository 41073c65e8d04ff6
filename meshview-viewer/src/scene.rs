//! Scene graph with independently toggleable layers
//!
//! The graph holds at most one instance of each [`LayerKind`]. Inserting a
//! kind that is already present drops the stale instance first, so a layer
//! can be rebuilt whenever its source geometry changes. Every layer places
//! itself: its own bounding-box centroid is moved to the origin, with no
//! transform shared between layers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use meshview_core::{Aabb, CanonicalMesh, Dimensions, Point3f, TopologyAttributes, TriangleMesh, Vector3f};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Linear RGB color, components in `0.0..=1.0`
pub type Rgb = [f32; 3];

/// Convert a `0xRRGGBB` literal into an [`Rgb`]
pub const fn rgb_hex(hex: u32) -> Rgb {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Number of cells along each side of the ground grid
pub const GROUND_GRID_DIVISIONS: u32 = 50;

/// Named visual layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerKind {
    ShadedMesh,
    WireframeMesh,
    MeasurementOverlay,
    GroundPlane,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::ShadedMesh,
        LayerKind::WireframeMesh,
        LayerKind::MeasurementOverlay,
        LayerKind::GroundPlane,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerKind::ShadedMesh => "shadedMesh",
            LayerKind::WireframeMesh => "wireframeMesh",
            LayerKind::MeasurementOverlay => "measurementOverlay",
            LayerKind::GroundPlane => "groundPlane",
        }
    }
}

/// Identity of one layer instance; a rebuilt layer gets a fresh id
///
/// Ids are unique across every graph in the process, so a backend may key
/// GPU resources on them across loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

impl LayerId {
    fn next() -> Self {
        LayerId(NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lit surface material
    Phong {
        color: Rgb,
        specular: Rgb,
        shininess: f32,
        wireframe: bool,
    },
    /// Unlit line material
    Line {
        color: Rgb,
        opacity: f32,
        depth_test: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    pub fill: Rgb,
    pub font_size: f32,
    pub italic: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            fill: [1.0, 153.0 / 255.0, 0.0],
            font_size: 2.5,
            italic: true,
        }
    }
}

/// One drawable element of a layer, in layer-local coordinates
#[derive(Debug, Clone)]
pub enum SceneNode {
    Mesh {
        geometry: Arc<TriangleMesh>,
        material: Material,
    },
    Lines {
        segments: Vec<[Point3f; 2]>,
        material: Material,
    },
    /// Square grid in the XZ plane centered on the local origin
    Grid {
        size: f32,
        divisions: u32,
        center_color: Rgb,
        grid_color: Rgb,
    },
    /// Camera-facing text sprite
    Label {
        text: String,
        position: Point3f,
        style: LabelStyle,
    },
}

impl SceneNode {
    /// Local-space bounds; labels are screen-space sprites and have none
    pub fn aabb(&self) -> Option<Aabb> {
        match self {
            SceneNode::Mesh { geometry, .. } => Aabb::from_points(&geometry.vertices),
            SceneNode::Lines { segments, .. } => Aabb::from_points(segments.iter().flatten()),
            SceneNode::Grid { size, .. } => {
                let h = size / 2.0;
                Some(Aabb::new(Point3f::new(-h, 0.0, -h), Point3f::new(h, 0.0, h)))
            }
            SceneNode::Label { .. } => None,
        }
    }

    /// Line segments of a grid node, in local coordinates
    pub fn grid_segments(size: f32, divisions: u32) -> Vec<[Point3f; 2]> {
        let h = size / 2.0;
        let step = size / divisions.max(1) as f32;
        (0..=divisions)
            .flat_map(|i| {
                let k = -h + i as f32 * step;
                [
                    [Point3f::new(-h, 0.0, k), Point3f::new(h, 0.0, k)],
                    [Point3f::new(k, 0.0, -h), Point3f::new(k, 0.0, h)],
                ]
            })
            .collect()
    }
}

/// A named layer instance in the graph
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub nodes: Vec<SceneNode>,
    /// Placement of the layer's local origin in the graph
    pub translation: Vector3f,
}

impl Layer {
    /// Bounds of all nodes before placement
    pub fn local_aabb(&self) -> Option<Aabb> {
        self.nodes
            .iter()
            .filter_map(SceneNode::aabb)
            .reduce(|a, b| a.union(&b))
    }

    /// Bounds after placement
    pub fn world_aabb(&self) -> Option<Aabb> {
        self.local_aabb()
            .map(|b| Aabb::new(b.min + self.translation, b.max + self.translation))
    }
}

/// Translation that moves a layer's own bounding-box centroid to the origin
pub fn center_layer(nodes: &[SceneNode]) -> Vector3f {
    nodes
        .iter()
        .filter_map(SceneNode::aabb)
        .reduce(|a, b| a.union(&b))
        .map(|b| -b.center().coords)
        .unwrap_or_else(Vector3f::zeros)
}

/// How a freshly built layer is placed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Centered,
    /// Centered horizontally, with the vertical position pinned
    CenteredAtHeight(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Rgb,
    },
    Spot {
        color: Rgb,
        position: Point3f,
        target: Point3f,
        angle: f32,
    },
}

/// Default lighting: soft ambient plus one spot light high above the model
pub fn default_lights() -> Vec<Light> {
    vec![
        Light::Ambient {
            color: rgb_hex(0xcccccc),
        },
        Light::Spot {
            color: rgb_hex(0xcccccc),
            position: Point3f::new(100.0, 500.0, 100.0),
            target: Point3f::origin(),
            angle: 1.7,
        },
    ]
}

/// What a `set_layer` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerChange {
    Added(LayerId),
    Replaced { old: LayerId, new: LayerId },
    Removed(LayerId),
    Unchanged,
}

/// Everything layer construction derives from
#[derive(Debug, Clone, Copy)]
pub struct LayerContext<'a> {
    pub mesh: &'a CanonicalMesh,
    pub model_color: Rgb,
    /// Label lengths; bounding dimensions are used when absent
    pub topology: Option<&'a TopologyAttributes>,
}

/// Root container of the viewer's visual layers
#[derive(Debug)]
pub struct SceneGraph {
    layers: BTreeMap<LayerKind, Layer>,
    lights: Vec<Light>,
    revision: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            layers: BTreeMap::new(),
            lights: default_lights(),
            revision: 0,
        }
    }

    /// Add or remove one layer
    ///
    /// Adding a present layer rebuilds it from `ctx`; removing an absent
    /// layer does nothing.
    pub fn set_layer(&mut self, kind: LayerKind, present: bool, ctx: &LayerContext<'_>) -> LayerChange {
        if !present {
            return match self.remove_layer(kind) {
                Some(layer) => LayerChange::Removed(layer.id),
                None => LayerChange::Unchanged,
            };
        }
        let (nodes, placement) = build_layer(kind, ctx);
        self.insert_layer(kind, nodes, placement)
    }

    /// Insert a layer built elsewhere, replacing any stale instance
    pub fn insert_layer(&mut self, kind: LayerKind, nodes: Vec<SceneNode>, placement: Placement) -> LayerChange {
        let old = self.remove_layer(kind).map(|l| l.id);

        let mut translation = center_layer(&nodes);
        if let Placement::CenteredAtHeight(y) = placement {
            translation.y = y;
        }

        let id = LayerId::next();
        self.revision += 1;
        debug!(layer = kind.name(), id = id.0, nodes = nodes.len(), "layer added");
        self.layers.insert(
            kind,
            Layer {
                id,
                kind,
                nodes,
                translation,
            },
        );

        match old {
            Some(old) => LayerChange::Replaced { old, new: id },
            None => LayerChange::Added(id),
        }
    }

    pub fn remove_layer(&mut self, kind: LayerKind) -> Option<Layer> {
        let removed = self.layers.remove(&kind);
        if let Some(layer) = &removed {
            self.revision += 1;
            debug!(layer = kind.name(), id = layer.id.0, "layer removed");
        }
        removed
    }

    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.get(&kind)
    }

    pub fn contains(&self, kind: LayerKind) -> bool {
        self.layers.contains_key(&kind)
    }

    /// Layers in draw order
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn present_kinds(&self) -> Vec<LayerKind> {
        self.layers.keys().copied().collect()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Bumped on every structural change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the nodes of one layer from the current mesh
pub fn build_layer(kind: LayerKind, ctx: &LayerContext<'_>) -> (Vec<SceneNode>, Placement) {
    match kind {
        LayerKind::ShadedMesh => (
            vec![SceneNode::Mesh {
                geometry: Arc::clone(ctx.mesh.geometry()),
                material: Material::Phong {
                    color: ctx.model_color,
                    specular: rgb_hex(0x111111),
                    shininess: 20.0,
                    wireframe: false,
                },
            }],
            Placement::Centered,
        ),
        LayerKind::WireframeMesh => (
            vec![SceneNode::Mesh {
                geometry: Arc::clone(ctx.mesh.geometry()),
                material: Material::Phong {
                    color: rgb_hex(0xffffff),
                    specular: rgb_hex(0x111111),
                    shininess: 20.0,
                    wireframe: true,
                },
            }],
            Placement::Centered,
        ),
        LayerKind::MeasurementOverlay => (measurement_nodes(ctx), Placement::Centered),
        LayerKind::GroundPlane => {
            let dims = ctx.mesh.dimensions();
            (
                vec![SceneNode::Grid {
                    size: ground_plane_extent(dims),
                    divisions: GROUND_GRID_DIVISIONS,
                    center_color: rgb_hex(0x444444),
                    grid_color: rgb_hex(0x888888),
                }],
                Placement::CenteredAtHeight(-dims.y),
            )
        }
    }
}

/// Side length of the ground grid
///
/// The largest dimension plus 10%, rounded up to a whole number of
/// 10-unit gutters, each drawn 50 units wide.
pub fn ground_plane_extent(dims: Dimensions) -> f32 {
    (dims.max() * 1.1 / 10.0).ceil() * 50.0
}

/// Bounding box plus one length label per axis
fn measurement_nodes(ctx: &LayerContext<'_>) -> Vec<SceneNode> {
    let bounds = ctx.mesh.bounds();
    let max = bounds.max;
    let dims = ctx.mesh.dimensions();
    let (sx, sy, sz) = match ctx.topology {
        Some(t) => (t.size_x, t.size_y, t.size_z),
        None => (dims.x, dims.y, dims.z),
    };

    let label = |len: f32, position: Point3f| SceneNode::Label {
        text: format_length(len),
        position,
        style: LabelStyle::default(),
    };

    vec![
        SceneNode::Lines {
            segments: bounds.edges(),
            material: Material::Line {
                color: rgb_hex(0xffff00),
                opacity: 1.0,
                depth_test: true,
            },
        },
        label(sx, Point3f::new(0.0, max.y, max.z)),
        label(sy, Point3f::new(max.x, 0.0, max.z)),
        label(sz, Point3f::new(max.x, max.y, 0.0)),
    ]
}

/// Length rounded to two decimals with trailing zeros dropped, in mm
pub fn format_length(len: f32) -> String {
    let fixed = format!("{:.2}", len);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{} mm", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn box_mesh(x: f32, y: f32, z: f32) -> CanonicalMesh {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(-x / 2.0, -y / 2.0, -z / 2.0),
                Point3f::new(x / 2.0, -y / 2.0, -z / 2.0),
                Point3f::new(x / 2.0, y / 2.0, z / 2.0),
                Point3f::new(-x / 2.0, y / 2.0, z / 2.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        CanonicalMesh::from_normalized(mesh).unwrap()
    }

    fn ctx(mesh: &CanonicalMesh) -> LayerContext<'_> {
        LayerContext {
            mesh,
            model_color: rgb_hex(0x808080),
            topology: None,
        }
    }

    #[test]
    fn test_layer_ids_unique_across_graphs() {
        let mesh = box_mesh(1.0, 2.0, 3.0);
        let mut first = SceneGraph::new();
        let mut second = SceneGraph::new();
        first.set_layer(LayerKind::ShadedMesh, true, &ctx(&mesh));
        second.set_layer(LayerKind::ShadedMesh, true, &ctx(&mesh));
        let a = first.layer(LayerKind::ShadedMesh).unwrap().id;
        let b = second.layer(LayerKind::ShadedMesh).unwrap().id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_ground_plane_extent() {
        let dims = Dimensions { x: 10.0, y: 20.0, z: 30.0 };
        assert_relative_eq!(ground_plane_extent(dims), 200.0);
        let small = Dimensions { x: 1.0, y: 2.0, z: 3.0 };
        assert_relative_eq!(ground_plane_extent(small), 50.0);
    }

    #[test]
    fn test_ground_plane_sits_below_mesh() {
        let mesh = box_mesh(10.0, 20.0, 30.0);
        let mut scene = SceneGraph::new();
        scene.set_layer(LayerKind::GroundPlane, true, &ctx(&mesh));
        let plane = scene.layer(LayerKind::GroundPlane).unwrap();
        assert_relative_eq!(plane.translation.y, -20.0);
        assert_relative_eq!(plane.translation.x, 0.0);
        match &plane.nodes[0] {
            SceneNode::Grid { size, divisions, .. } => {
                assert_relative_eq!(*size, 200.0);
                assert_eq!(*divisions, GROUND_GRID_DIVISIONS);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_re_adding_replaces_instance() {
        let mesh = box_mesh(1.0, 1.0, 1.0);
        let mut scene = SceneGraph::new();
        let first = scene.set_layer(LayerKind::WireframeMesh, true, &ctx(&mesh));
        let LayerChange::Added(first_id) = first else {
            panic!("expected Added, got {:?}", first);
        };
        let second = scene.set_layer(LayerKind::WireframeMesh, true, &ctx(&mesh));
        assert!(matches!(second, LayerChange::Replaced { old, .. } if old == first_id));
        assert_eq!(scene.present_kinds(), vec![LayerKind::WireframeMesh]);
    }

    #[test]
    fn test_removing_absent_layer_is_noop() {
        let mesh = box_mesh(1.0, 1.0, 1.0);
        let mut scene = SceneGraph::new();
        let rev = scene.revision();
        assert_eq!(scene.set_layer(LayerKind::ShadedMesh, false, &ctx(&mesh)), LayerChange::Unchanged);
        assert_eq!(scene.revision(), rev);
    }

    #[test]
    fn test_wireframe_shares_geometry() {
        let mesh = box_mesh(1.0, 2.0, 3.0);
        let mut scene = SceneGraph::new();
        scene.set_layer(LayerKind::WireframeMesh, true, &ctx(&mesh));
        match &scene.layer(LayerKind::WireframeMesh).unwrap().nodes[0] {
            SceneNode::Mesh { geometry, material } => {
                assert!(Arc::ptr_eq(geometry, mesh.geometry()));
                assert!(matches!(material, Material::Phong { wireframe: true, .. }));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_measurement_overlay_nodes() {
        let mesh = box_mesh(10.0, 20.0, 30.0);
        let mut scene = SceneGraph::new();
        scene.set_layer(LayerKind::MeasurementOverlay, true, &ctx(&mesh));
        let overlay = scene.layer(LayerKind::MeasurementOverlay).unwrap();
        assert_eq!(overlay.nodes.len(), 4);

        let labels: Vec<(&str, Point3f)> = overlay
            .nodes
            .iter()
            .filter_map(|n| match n {
                SceneNode::Label { text, position, .. } => Some((text.as_str(), *position)),
                _ => None,
            })
            .collect();
        assert_eq!(labels[0], ("10 mm", Point3f::new(0.0, 10.0, 15.0)));
        assert_eq!(labels[1], ("20 mm", Point3f::new(5.0, 0.0, 15.0)));
        assert_eq!(labels[2], ("30 mm", Point3f::new(5.0, 10.0, 0.0)));
    }

    #[test]
    fn test_layers_center_independently() {
        // off-center source geometry: each layer re-centers itself
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(2.0, 2.0, 2.0),
                Point3f::new(4.0, 2.0, 2.0),
                Point3f::new(4.0, 6.0, 2.0),
            ],
            vec![[0, 1, 2]],
        );
        let mesh = CanonicalMesh::from_normalized(mesh).unwrap();
        let mut scene = SceneGraph::new();
        scene.set_layer(LayerKind::ShadedMesh, true, &ctx(&mesh));
        scene.set_layer(LayerKind::MeasurementOverlay, true, &ctx(&mesh));

        for kind in [LayerKind::ShadedMesh, LayerKind::MeasurementOverlay] {
            let center = scene.layer(kind).unwrap().world_aabb().unwrap().center();
            assert_relative_eq!(center, Point3f::origin(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(10.0), "10 mm");
        assert_eq!(format_length(12.345), "12.35 mm");
        assert_eq!(format_length(0.5), "0.5 mm");
        assert_eq!(format_length(100.0), "100 mm");
    }

    #[test]
    fn test_grid_segments() {
        let segments = SceneNode::grid_segments(10.0, 2);
        assert_eq!(segments.len(), 6);
        assert_eq!(segments[0], [Point3f::new(-5.0, 0.0, -5.0), Point3f::new(5.0, 0.0, -5.0)]);
    }
}
