//! The mesh preview viewer
//!
//! [`Viewer`] ties the geometry loader, scene graph, camera, render loop and
//! toggle state together. Loading is split in three steps so decoding can
//! run anywhere while every scene mutation stays on the viewer's thread:
//!
//! 1. [`Viewer::begin_load`] tears the previous scene down and hands out a
//!    [`PendingLoad`] stamped with a fresh generation
//! 2. [`PendingLoad::decode`] does the blocking work and needs no viewer
//! 3. [`Viewer::complete_load`] installs the result, unless a newer load or
//!    a destroy happened in between
//!
//! [`Viewer::load_model`] runs all three in sequence.

use std::sync::Arc;

use meshview_core::{Axis, CanonicalMesh, MeshTopology, TopologyAttributes, TopologyCalculator};
use meshview_io::{compress_zlib, CompressionKind, GeometryLoader, LoadError, LoadResult, ModelFormat, ModelSource};
use tracing::{debug, error, info, warn};

use crate::backend::RenderBackend;
use crate::camera::{Camera, CameraController};
use crate::config::ViewerOptions;
use crate::events::{NoopObserver, ViewerObserver};
use crate::render_loop::{FrameScheduler, FrameToken, LoopState, RenderLoop};
use crate::scene::{LayerContext, LayerKind, Rgb, SceneGraph};
use crate::toggles::{Toggle, ToggleState};

/// Message shown in place of the viewport for formats without a preview
pub const PREVIEW_UNAVAILABLE: &str = "preview unavailable";

/// What the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing requested yet, or destroyed
    Idle,
    /// A load is in flight or failed to decode
    Loading,
    Ready,
    /// The format cannot be previewed
    Fallback { format: ModelFormat },
}

impl ViewState {
    /// Static message replacing the viewport, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ViewState::Fallback { .. } => Some(PREVIEW_UNAVAILABLE),
            _ => None,
        }
    }
}

/// Outcome of [`Viewer::complete_load`]
#[derive(Debug)]
pub enum LoadStatus {
    Ready,
    Fallback { format: ModelFormat },
    Failed(LoadError),
    /// Superseded by a newer load or a destroy; nothing was touched
    Stale,
}

/// Camera nudge directions for press-and-hold navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Up,
    Down,
    Left,
    Right,
}

/// A load that has been started but not decoded
#[derive(Debug)]
pub struct PendingLoad {
    generation: u64,
    source: ModelSource,
    export: bool,
}

impl PendingLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read, decompress and decode the source
    ///
    /// Needs nothing from the viewer, so it can run on a worker thread.
    /// When the observer asked for an export and the source turned out to
    /// be uncompressed, the raw bytes ride along for deflating later.
    pub fn decode(self, loader: &GeometryLoader) -> DecodedLoad {
        let name = self.source.display_name().to_string();
        let resolved = match loader.resolve(self.source) {
            Ok(resolved) => resolved,
            Err(e) => {
                return DecodedLoad {
                    generation: self.generation,
                    name,
                    export: None,
                    result: Err(e),
                }
            }
        };

        let (export, result) = match loader.inflate(&resolved) {
            Ok((payload, removed)) => {
                let export = (self.export && removed == CompressionKind::None).then(|| payload.clone());
                (export, loader.decode_payload(resolved.format, &payload))
            }
            Err(e) => {
                let export = (self.export && resolved.compression == CompressionKind::None).then(|| resolved.raw);
                (export, Err(e))
            }
        };

        DecodedLoad {
            generation: self.generation,
            name,
            export,
            result,
        }
    }
}

/// A decoded load waiting to be installed
#[derive(Debug)]
pub struct DecodedLoad {
    generation: u64,
    name: String,
    /// Uncompressed source bytes owed to the observer
    export: Option<Vec<u8>>,
    result: LoadResult<CanonicalMesh>,
}

impl DecodedLoad {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn result(&self) -> &LoadResult<CanonicalMesh> {
        &self.result
    }
}

/// Interactive mesh preview
pub struct Viewer<B: RenderBackend, S: FrameScheduler> {
    options: ViewerOptions,
    loader: Arc<GeometryLoader>,
    backend: B,
    scheduler: S,
    observer: Box<dyn ViewerObserver>,
    topology_calculator: Box<dyn TopologyCalculator>,
    toggles: ToggleState,
    mesh: Option<CanonicalMesh>,
    scene: Option<SceneGraph>,
    camera: CameraController,
    render_loop: RenderLoop,
    topology: Option<TopologyAttributes>,
    generation: u64,
    view_state: ViewState,
    pending_export: Option<Vec<u8>>,
    awaiting_first_frame: bool,
    destroyed: bool,
}

impl<B: RenderBackend, S: FrameScheduler> Viewer<B, S> {
    pub fn new(options: ViewerOptions, backend: B, scheduler: S) -> Self {
        let camera = CameraController::new(options.camera_overrides(), options.width, options.height);
        Self {
            toggles: options.initial_toggles(),
            camera,
            options,
            loader: Arc::new(GeometryLoader::default()),
            backend,
            scheduler,
            observer: Box::new(NoopObserver),
            topology_calculator: Box::new(MeshTopology),
            mesh: None,
            scene: None,
            render_loop: RenderLoop::new(),
            topology: None,
            generation: 0,
            view_state: ViewState::Idle,
            pending_export: None,
            awaiting_first_frame: false,
            destroyed: false,
        }
    }

    pub fn with_observer(mut self, observer: impl ViewerObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn with_loader(mut self, loader: Arc<GeometryLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_topology_calculator(mut self, calculator: impl TopologyCalculator + 'static) -> Self {
        self.topology_calculator = Box::new(calculator);
        self
    }

    /// Tear down the current scene and start a new load cycle
    pub fn begin_load(&mut self, source: ModelSource) -> PendingLoad {
        self.teardown();
        self.generation += 1;
        if !self.destroyed {
            self.view_state = ViewState::Loading;
        }
        debug!(generation = self.generation, source = source.display_name(), "load started");
        PendingLoad {
            generation: self.generation,
            source,
            export: self.observer.wants_export(),
        }
    }

    /// Install a decoded load
    ///
    /// Results from superseded loads, or arriving after destroy, are
    /// dropped untouched. A displayed mesh defers the export until its
    /// first frame has gone out; other outcomes export right away.
    pub fn complete_load(&mut self, decoded: DecodedLoad) -> LoadStatus {
        if self.destroyed || decoded.generation != self.generation {
            warn!(
                generation = decoded.generation,
                current = self.generation,
                destroyed = self.destroyed,
                source = %decoded.name,
                "dropping stale load"
            );
            return LoadStatus::Stale;
        }

        let status = match decoded.result {
            Ok(mesh) => {
                self.install(mesh);
                info!(
                    source = %decoded.name,
                    triangles = self.mesh.as_ref().map_or(0, CanonicalMesh::triangle_count),
                    "model loaded"
                );
                LoadStatus::Ready
            }
            Err(LoadError::UnsupportedFormat { format }) => {
                info!(source = %decoded.name, %format, "no preview for format");
                self.view_state = ViewState::Fallback { format };
                LoadStatus::Fallback { format }
            }
            Err(e) => {
                error!(source = %decoded.name, "failed to load model: {}", e);
                self.observer.on_error(&e);
                LoadStatus::Failed(e)
            }
        };

        self.pending_export = decoded.export;
        if !matches!(status, LoadStatus::Ready) {
            self.flush_export();
        }
        status
    }

    fn flush_export(&mut self) {
        let Some(raw) = self.pending_export.take() else {
            return;
        };
        match compress_zlib(&raw) {
            Ok(buffer) => {
                debug!(bytes = buffer.len(), "exporting deflated source");
                self.observer.on_zip(buffer);
            }
            Err(e) => warn!("re-export failed: {}", e),
        }
    }

    /// Begin, decode and complete a load on the current thread
    pub fn load_model(&mut self, source: ModelSource) -> LoadStatus {
        let pending = self.begin_load(source);
        let loader = Arc::clone(&self.loader);
        let decoded = pending.decode(&loader);
        self.complete_load(decoded)
    }

    fn install(&mut self, mesh: CanonicalMesh) {
        let mut scene = SceneGraph::new();
        self.camera.frame(&mesh);
        self.mesh = Some(mesh);

        if self.toggles.measurement_overlay {
            self.ensure_topology();
        }
        if let Some(mesh) = self.mesh.as_ref() {
            let ctx = LayerContext {
                mesh,
                model_color: self.options.model_rgb(),
                topology: self.topology.as_ref(),
            };
            for kind in LayerKind::ALL {
                if self.toggles.wants_layer(kind) {
                    scene.set_layer(kind, true, &ctx);
                }
            }
        }
        self.scene = Some(scene);

        self.view_state = ViewState::Ready;
        self.awaiting_first_frame = true;
        self.render_loop.start(&mut self.scheduler);
    }

    fn teardown(&mut self) {
        self.render_loop.stop(&mut self.scheduler);
        if self.scene.take().is_some() {
            self.backend.release();
        }
        self.mesh = None;
        self.topology = None;
        self.camera.clear();
        self.toggles.loaded = false;
        self.pending_export = None;
        self.awaiting_first_frame = false;
    }

    /// Handle a fired frame request
    ///
    /// The next frame is already scheduled when the draw runs. The first
    /// frame after a load latches `loaded` and notifies the observer.
    pub fn tick(&mut self, token: FrameToken) -> bool {
        if self.destroyed || !self.render_loop.on_tick(token, &mut self.scheduler) {
            return false;
        }
        self.draw_now();

        if self.awaiting_first_frame {
            self.awaiting_first_frame = false;
            self.toggles.loaded = true;
            self.observer.on_load();
            if self.observer.wants_topology() || self.toggles.info_panel {
                self.ensure_topology();
            }
            self.flush_export();
        }
        true
    }

    /// Draw immediately if there is anything to draw
    ///
    /// Draw failures are logged and never reach the caller.
    pub fn draw_now(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let (Some(scene), Some(camera)) = (self.scene.as_ref(), self.camera.camera()) else {
            return false;
        };
        match self.backend.draw(scene, camera) {
            Ok(()) => true,
            Err(e) => {
                error!("draw failed: {}", e);
                false
            }
        }
    }

    /// An external camera control moved the camera
    pub fn on_camera_changed(&mut self) -> bool {
        self.draw_now()
    }

    /// Set one toggle; returns whether anything changed
    ///
    /// Before a mesh is loaded only the flag is recorded; the matching
    /// layers are built when the load completes.
    pub fn set_toggle(&mut self, toggle: Toggle, value: bool) -> bool {
        if self.destroyed || !self.toggles.set(toggle, value) {
            return false;
        }
        debug!(?toggle, value, "toggle changed");
        if self.mesh.is_none() {
            return true;
        }

        let needs_topology = value && matches!(toggle, Toggle::MeasurementOverlay | Toggle::InfoPanel);
        if needs_topology {
            self.ensure_topology();
        }

        if let (Some(kind), Some(scene), Some(mesh)) = (toggle.layer(), self.scene.as_mut(), self.mesh.as_ref()) {
            let ctx = LayerContext {
                mesh,
                model_color: self.options.model_rgb(),
                topology: self.topology.as_ref(),
            };
            scene.set_layer(kind, value, &ctx);
        }
        true
    }

    pub fn set_shaded(&mut self, value: bool) -> bool {
        self.set_toggle(Toggle::Shaded, value)
    }

    pub fn set_wireframe(&mut self, value: bool) -> bool {
        self.set_toggle(Toggle::Wireframe, value)
    }

    pub fn set_measurement_overlay(&mut self, value: bool) -> bool {
        self.set_toggle(Toggle::MeasurementOverlay, value)
    }

    pub fn set_info_panel(&mut self, value: bool) -> bool {
        self.set_toggle(Toggle::InfoPanel, value)
    }

    pub fn set_ground_plane(&mut self, value: bool) -> bool {
        self.set_toggle(Toggle::GroundPlane, value)
    }

    /// Compute topology once per load and notify the observer
    fn ensure_topology(&mut self) -> Option<TopologyAttributes> {
        if let Some(attributes) = self.topology {
            return Some(attributes);
        }
        let mesh = self.mesh.as_ref()?;
        let attributes = self.topology_calculator.calculate(mesh);
        debug!(
            volume = attributes.volume,
            area = attributes.area,
            triangles = attributes.triangle_count,
            "topology computed"
        );
        self.topology = Some(attributes);
        self.observer.on_topology(&attributes);
        Some(attributes)
    }

    /// Pan one tenth of the model size; no-op before load
    pub fn nudge(&mut self, direction: Nudge) -> bool {
        let Some(mesh) = self.mesh.as_ref() else {
            return false;
        };
        let dims = mesh.dimensions();
        let (axis, delta) = match direction {
            Nudge::Up => (Axis::Y, -dims.y / 10.0),
            Nudge::Down => (Axis::Y, dims.y / 10.0),
            Nudge::Left => (Axis::X, -dims.x / 10.0),
            Nudge::Right => (Axis::X, dims.x / 10.0),
        };
        if !self.camera.translate(axis, delta) {
            return false;
        }
        self.on_camera_changed();
        true
    }

    /// Re-frame the loaded mesh
    pub fn reset_camera(&mut self) -> bool {
        if self.destroyed || self.mesh.is_none() {
            return false;
        }
        self.camera.reset(self.mesh.as_ref());
        self.on_camera_changed();
        true
    }

    /// Orbit around the target; used by drag controls
    pub fn orbit(&mut self, yaw: f32, pitch: f32) -> bool {
        match self.camera.camera_mut() {
            Some(camera) => camera.orbit(yaw, pitch),
            None => return false,
        }
        self.on_camera_changed();
        true
    }

    /// Zoom toward the target; used by wheel controls
    pub fn zoom(&mut self, factor: f32) -> bool {
        match self.camera.camera_mut() {
            Some(camera) => camera.zoom(factor),
            None => return false,
        }
        self.on_camera_changed();
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.destroyed || width == 0 || height == 0 {
            return;
        }
        self.options.width = width;
        self.options.height = height;
        self.camera.set_aspect(width, height);
        self.backend.resize(width, height);
    }

    /// Stop rendering and drop everything; safe with a load in flight
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.teardown();
        self.generation += 1;
        self.destroyed = true;
        self.view_state = ViewState::Idle;
        info!("viewer destroyed");
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn background_color(&self) -> Rgb {
        self.options.background_rgb()
    }

    pub fn loader(&self) -> &Arc<GeometryLoader> {
        &self.loader
    }

    pub fn toggles(&self) -> ToggleState {
        self.toggles
    }

    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    pub fn mesh(&self) -> Option<&CanonicalMesh> {
        self.mesh.as_ref()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.camera()
    }

    /// Cached topology, whether or not the info panel shows it
    pub fn topology(&self) -> Option<&TopologyAttributes> {
        self.topology.as_ref()
    }

    /// Topology as the info panel should show it
    pub fn visible_topology(&self) -> Option<&TopologyAttributes> {
        if self.toggles.info_panel {
            self.topology.as_ref()
        } else {
            None
        }
    }

    pub fn render_loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
