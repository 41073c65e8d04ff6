//! Geometry loading for meshview
//!
//! This crate turns an opaque model source (bytes or a file, possibly
//! compressed) into the canonical mesh the viewer renders:
//! - Format and compression detection from names and magic bytes
//! - zlib/gzip decompression and the zlib re-export used by export sinks
//! - A decoder registry with built-in STL, OBJ and PLY decoders

pub mod error;
pub mod format;
pub mod source;
pub mod compress;
pub mod registry;
pub mod loader;
pub mod stl;
pub mod obj;
pub mod ply;

pub use error::*;
pub use format::{detect_compression, detect_format, sniff_compression, CompressionKind, ModelFormat};
pub use source::{ModelSource, ResolvedSource, SourceData};
pub use compress::{compress_zlib, decompress};
pub use registry::{DecoderRegistry, MeshDecoder};
pub use loader::GeometryLoader;
