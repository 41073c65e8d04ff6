//! Decoder registry for format-agnostic mesh conversion
//!
//! The loader asks the registry whether a format can be previewed at all
//! before touching the payload, and routes the payload to the matching
//! decoder when it can. Hosts register extra decoders to widen the set of
//! previewable formats.

use std::collections::HashMap;

use meshview_core::TriangleMesh;

use crate::error::{LoadError, LoadResult};
use crate::format::ModelFormat;
use crate::{obj::ObjDecoder, ply::PlyDecoder, stl::StlDecoder};

/// Converts an uncompressed payload of one format into a triangle mesh
pub trait MeshDecoder: Send + Sync {
    /// Decode the payload
    fn decode(&self, bytes: &[u8]) -> LoadResult<TriangleMesh>;

    /// Get the format this decoder handles
    fn format(&self) -> ModelFormat;
}

/// Registry that maps formats to decoders
pub struct DecoderRegistry {
    decoders: HashMap<ModelFormat, Box<dyn MeshDecoder>>,
}

impl DecoderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registry with the built-in STL, OBJ and PLY decoders
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(StlDecoder));
        registry.register(Box::new(ObjDecoder));
        registry.register(Box::new(PlyDecoder));
        registry
    }

    /// Register a decoder, replacing any previous one for the same format
    pub fn register(&mut self, decoder: Box<dyn MeshDecoder>) {
        self.decoders.insert(decoder.format(), decoder);
    }

    /// Whether the format can be turned into a preview at all
    pub fn can_decode(&self, format: ModelFormat) -> bool {
        self.decoders.contains_key(&format)
    }

    /// Formats with a registered decoder
    pub fn supported_formats(&self) -> Vec<ModelFormat> {
        let mut formats: Vec<_> = self.decoders.keys().copied().collect();
        formats.sort_by_key(|f| f.name());
        formats
    }

    /// Decode a payload of the given format
    pub fn decode(&self, bytes: &[u8], format: ModelFormat) -> LoadResult<TriangleMesh> {
        let decoder = self
            .decoders
            .get(&format)
            .ok_or(LoadError::UnsupportedFormat { format })?;
        decoder.decode(bytes)
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::Point3f;

    struct FixedDecoder;

    impl MeshDecoder for FixedDecoder {
        fn decode(&self, _bytes: &[u8]) -> LoadResult<TriangleMesh> {
            Ok(TriangleMesh::from_vertices_and_faces(
                vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0), Point3f::new(0.0, 1.0, 0.0)],
                vec![[0, 1, 2]],
            ))
        }

        fn format(&self) -> ModelFormat {
            ModelFormat::Glb
        }
    }

    #[test]
    fn test_builtin_formats() {
        let registry = DecoderRegistry::with_builtin();
        assert_eq!(
            registry.supported_formats(),
            vec![ModelFormat::Obj, ModelFormat::Ply, ModelFormat::Stl]
        );
        assert!(!registry.can_decode(ModelFormat::Step));
    }

    #[test]
    fn test_unregistered_format_is_unsupported() {
        let registry = DecoderRegistry::with_builtin();
        let err = registry.decode(b"glTF", ModelFormat::Glb).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { format: ModelFormat::Glb }));
    }

    #[test]
    fn test_custom_decoder_widens_support() {
        let mut registry = DecoderRegistry::with_builtin();
        registry.register(Box::new(FixedDecoder));
        assert!(registry.can_decode(ModelFormat::Glb));
        assert_eq!(registry.decode(b"", ModelFormat::Glb).unwrap().face_count(), 1);
    }
}
