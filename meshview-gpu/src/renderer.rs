//! wgpu scene renderer
//!
//! Draws a [`SceneGraph`] with three pipelines: Phong-lit triangles,
//! depth-tested lines and lines drawn on top of everything. Vertex buffers
//! are cached per layer id and dropped as soon as the layer leaves the
//! graph, so a toggle only ever uploads the layer it rebuilt.

use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use meshview_core::{Error, Result};
use meshview_viewer::{rgb_hex, Camera, LayerId, LayerKind, Light, Material, RenderBackend, SceneGraph, SceneNode};
use nalgebra::Matrix4;
use tracing::{debug, warn};

use crate::device::{GpuContext, DEPTH_FORMAT};
use crate::vertex::{layer_batches, BatchKind, SceneVertex};

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_proj: camera.view_projection().into(),
            view_pos: [camera.position.x, camera.position.y, camera.position.z],
            _padding: 0.0,
        }
    }
}

/// Lighting parameters for the shaded pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 3],
    pub _pad0: f32,
    pub light_position: [f32; 3],
    pub _pad1: f32,
    pub light_color: [f32; 3],
    pub shininess: f32,
    pub specular: [f32; 3],
    pub _pad2: f32,
}

impl LightingUniform {
    /// Collect the scene lights and the shaded layer's specular response
    ///
    /// Ambient lights add up; the last spot light wins.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut uniform = Self {
            ambient: [0.0; 3],
            _pad0: 0.0,
            light_position: [0.0, 0.0, 0.0],
            _pad1: 0.0,
            light_color: [0.0; 3],
            shininess: 20.0,
            specular: rgb_hex(0x111111),
            _pad2: 0.0,
        };

        for light in scene.lights() {
            match *light {
                Light::Ambient { color } => {
                    for (acc, c) in uniform.ambient.iter_mut().zip(color) {
                        *acc += c;
                    }
                }
                Light::Spot { color, position, .. } => {
                    uniform.light_position = [position.x, position.y, position.z];
                    uniform.light_color = color;
                }
            }
        }

        let shaded_material = scene
            .layer(LayerKind::ShadedMesh)
            .and_then(|layer| layer.nodes.first())
            .and_then(|node| match node {
                SceneNode::Mesh { material, .. } => Some(*material),
                _ => None,
            });
        if let Some(Material::Phong { specular, shininess, .. }) = shaded_material {
            uniform.specular = specular;
            uniform.shininess = shininess;
        }
        uniform
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct SceneRenderConfig {
    pub background_color: [f64; 4],
    pub enable_depth_test: bool,
    /// Alpha multiplier for the measurement overlay
    pub overlay_opacity: f32,
}

impl Default for SceneRenderConfig {
    fn default() -> Self {
        Self {
            background_color: [0.0, 0.0, 0.0, 1.0],
            enable_depth_test: true,
            overlay_opacity: 1.0,
        }
    }
}

struct GpuBatch {
    kind: BatchKind,
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// GPU-accelerated scene renderer
pub struct SceneRenderer<'window> {
    pub gpu_context: GpuContext,
    pub surface: wgpu::Surface<'window>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: SceneRenderConfig,
    depth_view: wgpu::TextureView,
    shaded_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    overlay_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    layers: HashMap<LayerId, Vec<GpuBatch>>,
}

impl<'window> SceneRenderer<'window> {
    /// Create a renderer presenting to `target`
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'window>>,
        width: u32,
        height: u32,
        config: SceneRenderConfig,
    ) -> Result<Self> {
        let (gpu_context, surface) = GpuContext::with_surface(target).await?;

        let surface_caps = surface.get_capabilities(&gpu_context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| Error::Gpu("Surface reports no texture formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu_context.device, &surface_config);
        let depth_view = gpu_context.create_depth_texture(surface_config.width, surface_config.height);

        let camera_buffer = gpu_context.create_buffer_init(
            "Camera Buffer",
            &[CameraUniform {
                view_proj: Matrix4::identity().into(),
                view_pos: [0.0; 3],
                _padding: 0.0,
            }],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let lighting_buffer = gpu_context.create_buffer_init(
            "Lighting Buffer",
            &[LightingUniform::from_scene(&SceneGraph::new())],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = gpu_context
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(0), uniform_entry(1)],
                label: Some("scene_bind_group_layout"),
            });
        let bind_group = gpu_context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
            label: Some("scene_bind_group"),
        });

        let shader = gpu_context.create_shader_module("Scene Shader", include_str!("shaders/scene.wgsl"));
        let layout = gpu_context
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let depth_test = config.enable_depth_test;
        let shaded_pipeline = create_pipeline(
            &gpu_context.device,
            &layout,
            &shader,
            surface_format,
            PipelineDesc {
                label: "Shaded",
                topology: wgpu::PrimitiveTopology::TriangleList,
                fragment_entry: "fs_shaded",
                depth_test,
            },
        );
        let line_pipeline = create_pipeline(
            &gpu_context.device,
            &layout,
            &shader,
            surface_format,
            PipelineDesc {
                label: "Line",
                topology: wgpu::PrimitiveTopology::LineList,
                fragment_entry: "fs_line",
                depth_test,
            },
        );
        let overlay_pipeline = create_pipeline(
            &gpu_context.device,
            &layout,
            &shader,
            surface_format,
            PipelineDesc {
                label: "Overlay",
                topology: wgpu::PrimitiveTopology::LineList,
                fragment_entry: "fs_line",
                depth_test: false,
            },
        );

        Ok(Self {
            gpu_context,
            surface,
            surface_config,
            config,
            depth_view,
            shaded_pipeline,
            line_pipeline,
            overlay_pipeline,
            camera_buffer,
            lighting_buffer,
            bind_group,
            layers: HashMap::new(),
        })
    }

    /// Number of layers with uploaded buffers
    pub fn cached_layers(&self) -> usize {
        self.layers.len()
    }

    /// Drop buffers of departed layers and upload new ones
    fn sync_layers(&mut self, scene: &SceneGraph) {
        let live: HashSet<LayerId> = scene.layers().map(|l| l.id).collect();
        let before = self.layers.len();
        self.layers.retain(|id, _| live.contains(id));
        if self.layers.len() != before {
            debug!(dropped = before - self.layers.len(), "released layer buffers");
        }

        for layer in scene.layers() {
            if self.layers.contains_key(&layer.id) {
                continue;
            }
            let batches = layer_batches(layer, self.config.overlay_opacity)
                .into_iter()
                .map(|batch| GpuBatch {
                    kind: batch.kind,
                    vertex_count: batch.vertices.len() as u32,
                    buffer: self.gpu_context.create_buffer_init(
                        layer.kind.name(),
                        &batch.vertices,
                        wgpu::BufferUsages::VERTEX,
                    ),
                })
                .collect();
            debug!(layer = layer.kind.name(), id = layer.id.get(), "uploaded layer buffers");
            self.layers.insert(layer.id, batches);
        }
    }

    fn pipeline(&self, kind: BatchKind) -> &wgpu::RenderPipeline {
        match kind {
            BatchKind::Shaded => &self.shaded_pipeline,
            BatchKind::Lines => &self.line_pipeline,
            BatchKind::OverlayLines => &self.overlay_pipeline,
        }
    }
}

impl RenderBackend for SceneRenderer<'_> {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()> {
        self.sync_layers(scene);

        let queue = &self.gpu_context.queue;
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::bytes_of(&LightingUniform::from_scene(scene)),
        );

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("surface {:?}, reconfiguring", e);
                self.surface.configure(&self.gpu_context.device, &self.surface_config);
                return Err(Error::Gpu(format!("Surface unavailable: {:?}", e)));
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to get surface texture: {:?}", e))),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu_context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Render Encoder"),
            });

        {
            let [r, g, b, a] = self.config.background_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            render_pass.set_bind_group(0, &self.bind_group, &[]);

            // overlay lines last so they land on top
            for kind in [BatchKind::Shaded, BatchKind::Lines, BatchKind::OverlayLines] {
                render_pass.set_pipeline(self.pipeline(kind));
                for layer in scene.layers() {
                    let Some(batches) = self.layers.get(&layer.id) else {
                        continue;
                    };
                    for batch in batches.iter().filter(|b| b.kind == kind) {
                        render_pass.set_vertex_buffer(0, batch.buffer.slice(..));
                        render_pass.draw(0..batch.vertex_count, 0..1);
                    }
                }
            }
        }

        self.gpu_context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.gpu_context.device, &self.surface_config);
            self.depth_view = self.gpu_context.create_depth_texture(width, height);
        }
    }

    fn release(&mut self) {
        if !self.layers.is_empty() {
            debug!(layers = self.layers.len(), "releasing all layer buffers");
            self.layers.clear();
        }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    topology: wgpu::PrimitiveTopology,
    fragment_entry: &'a str,
    depth_test: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{} Render Pipeline", desc.label)),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[SceneVertex::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: desc.fragment_entry,
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_test,
            depth_compare: if desc.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
