//! # meshview GPU
//!
//! wgpu render backend for meshview scenes.
//!
//! [`SceneRenderer`] implements [`meshview_viewer::RenderBackend`], so a
//! [`meshview_viewer::Viewer`] can present to a window surface.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshview_gpu::{SceneRenderConfig, SceneRenderer};
//!
//! async fn example(window: Arc<winit::window::Window>) -> meshview_core::Result<()> {
//!     let size = window.inner_size();
//!     let _renderer = SceneRenderer::new(window, size.width, size.height, SceneRenderConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod vertex;
pub mod renderer;

pub use device::{GpuContext, DEPTH_FORMAT};
pub use vertex::{layer_batches, BatchKind, SceneVertex, VertexBatch};
pub use renderer::{CameraUniform, LightingUniform, SceneRenderConfig, SceneRenderer};
