//! Core data structures for meshview
//!
//! This crate provides the geometry types shared by the loader, the scene
//! synchronization engine and the rendering backends:
//! - Triangle meshes and point/vector aliases
//! - Axis-aligned bounds and bounding spheres
//! - The canonical (centered, Y-up) mesh the viewer renders
//! - Derived topology attributes (dimensions, volume, area, triangle count)

pub mod point;
pub mod mesh;
pub mod bounds;
pub mod transform;
pub mod canonical;
pub mod topology;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use bounds::*;
pub use transform::*;
pub use canonical::*;
pub use topology::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4, UnitQuaternion};
