//! Scene synchronization engine for the mesh preview
//!
//! This crate keeps a scene graph in step with a loaded mesh and a set of
//! view toggles:
//! - Independently toggleable layers (shaded mesh, wireframe, measurement
//!   overlay, ground plane)
//! - Camera framing from the mesh bounding sphere, plus pan/orbit/zoom
//! - A render loop driven by a host frame scheduler
//! - Stale-load protection across overlapping loads and teardown
//!
//! Rendering and frame scheduling are pluggable through [`RenderBackend`]
//! and [`FrameScheduler`].

pub mod scene;
pub mod camera;
pub mod render_loop;
pub mod backend;
pub mod events;
pub mod toggles;
pub mod config;
pub mod viewer;

pub use scene::*;
pub use camera::*;
pub use render_loop::*;
pub use backend::*;
pub use events::*;
pub use toggles::*;
pub use config::ViewerOptions;
pub use viewer::*;
