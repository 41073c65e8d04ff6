//! Rendering backend seam
//!
//! The viewer hands the whole scene graph and camera to the backend once per
//! draw. GPU implementations live in their own crate; [`HeadlessBackend`]
//! keeps a snapshot of what it was asked to draw.

use meshview_core::{Error, Point3f, Result};

use crate::camera::Camera;
use crate::scene::{LayerId, LayerKind, SceneGraph};

/// Anything able to draw a scene graph from a camera
pub trait RenderBackend {
    /// Draw one frame
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()>;

    /// The viewport changed size
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Drop every resource tied to the current scene
    fn release(&mut self) {}
}

/// What one headless draw saw
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub layers: Vec<(LayerKind, LayerId)>,
    pub camera_position: Point3f,
    pub scene_revision: u64,
}

/// Backend that records draws instead of rasterizing
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    draws: usize,
    last_frame: Option<FrameSnapshot>,
    size: Option<(u32, u32)>,
    releases: usize,
    fail_draws: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent draw fail
    pub fn fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn last_frame(&self) -> Option<&FrameSnapshot> {
        self.last_frame.as_ref()
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn releases(&self) -> usize {
        self.releases
    }
}

impl RenderBackend for HeadlessBackend {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()> {
        self.draws += 1;
        if self.fail_draws {
            return Err(Error::Visualization("headless draw failure".to_string()));
        }
        self.last_frame = Some(FrameSnapshot {
            layers: scene.layers().map(|l| (l.kind, l.id)).collect(),
            camera_position: camera.position,
            scene_revision: scene.revision(),
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn release(&mut self) {
        self.releases += 1;
        self.last_frame = None;
    }
}

impl<B: RenderBackend + ?Sized> RenderBackend for Box<B> {
    fn draw(&mut self, scene: &SceneGraph, camera: &Camera) -> Result<()> {
        (**self).draw(scene, camera)
    }

    fn resize(&mut self, width: u32, height: u32) {
        (**self).resize(width, height)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
