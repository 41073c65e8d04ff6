//! Geometry loader: source descriptor in, canonical mesh out

use meshview_core::CanonicalMesh;
use tracing::debug;

use crate::compress::decompress;
use crate::error::{LoadError, LoadResult};
use crate::format::{detect_compression, detect_format, sniff_compression, CompressionKind, ModelFormat};
use crate::registry::DecoderRegistry;
use crate::source::{ModelSource, ResolvedSource, SourceData};

/// Turns model sources into canonical meshes
pub struct GeometryLoader {
    registry: DecoderRegistry,
}

impl GeometryLoader {
    pub fn new(registry: DecoderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.registry
    }

    /// Whether a format can be previewed
    pub fn can_preview(&self, format: ModelFormat) -> bool {
        self.registry.can_decode(format)
    }

    /// Read the payload and settle format and compression
    ///
    /// Declared values win over sniffed ones. A source whose format has no
    /// preview is reported as unsupported even when its bytes are unreadable.
    pub fn resolve(&self, source: ModelSource) -> LoadResult<ResolvedSource> {
        let format = source
            .format
            .unwrap_or_else(|| source.name.as_deref().map(detect_format).unwrap_or(ModelFormat::Unknown));

        let raw = match source.data {
            SourceData::Bytes(bytes) => bytes,
            SourceData::File(path) => match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(_) if !self.can_preview(format) => return Err(LoadError::UnsupportedFormat { format }),
                Err(e) => return Err(LoadError::decode(format!("cannot read {}: {}", path.display(), e))),
            },
        };

        let (compression, compression_sniffed) = match source.compression {
            Some(kind) => (kind, false),
            None => match detect_compression(source.name.as_deref(), &[]) {
                CompressionKind::None => {
                    let kind = sniff_compression(&raw);
                    (kind, kind != CompressionKind::None)
                }
                named => (named, false),
            },
        };

        debug!(
            name = source.name.as_deref().unwrap_or("<memory>"),
            %format,
            ?compression,
            bytes = raw.len(),
            "resolved model source"
        );

        Ok(ResolvedSource {
            name: source.name,
            format,
            compression,
            compression_sniffed,
            raw,
        })
    }

    /// Strip compression from a resolved source
    ///
    /// Returns the payload together with the compression actually removed.
    /// A sniffed header that fails to inflate is taken as a coincidence in
    /// an uncompressed file. Unsupported formats short-circuit before any
    /// byte is inspected.
    pub fn inflate(&self, source: &ResolvedSource) -> LoadResult<(Vec<u8>, CompressionKind)> {
        if !self.can_preview(source.format) {
            return Err(LoadError::UnsupportedFormat {
                format: source.format,
            });
        }
        if source.raw.is_empty() {
            return Err(LoadError::EmptySource);
        }

        match decompress(&source.raw, source.compression) {
            Ok(bytes) => Ok((bytes, source.compression)),
            Err(e) if source.compression_sniffed => {
                debug!("sniffed {:?} header did not inflate: {}", source.compression, e);
                Ok((source.raw.clone(), CompressionKind::None))
            }
            Err(e) => Err(e),
        }
    }

    /// Decode and normalize an uncompressed payload
    pub fn decode_payload(&self, format: ModelFormat, payload: &[u8]) -> LoadResult<CanonicalMesh> {
        if payload.is_empty() {
            return Err(LoadError::EmptySource);
        }

        let mesh = self.registry.decode(payload, format)?;
        if mesh.is_empty() {
            return Err(LoadError::EmptySource);
        }
        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "decoded mesh"
        );

        CanonicalMesh::from_mesh(mesh).map_err(|e| LoadError::decode(e.to_string()))
    }

    /// Decompress, decode and normalize a resolved source
    pub fn decode(&self, source: &ResolvedSource) -> LoadResult<CanonicalMesh> {
        let (payload, _) = self.inflate(source)?;
        self.decode_payload(source.format, &payload)
    }

    /// Resolve and decode in one step
    pub fn load(&self, source: ModelSource) -> LoadResult<CanonicalMesh> {
        let resolved = self.resolve(source)?;
        self.decode(&resolved)
    }
}

impl Default for GeometryLoader {
    fn default() -> Self {
        Self::new(DecoderRegistry::with_builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress_zlib;
    use crate::stl::tests::{binary_stl, ASCII_TETRA};
    use approx::assert_relative_eq;

    #[test]
    fn test_ascii_stl_loads_canonical() {
        let loader = GeometryLoader::default();
        let mesh = loader
            .load(ModelSource::from_bytes("tetra.stl", ASCII_TETRA.as_bytes().to_vec()))
            .unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        let dims = mesh.dimensions();
        assert_relative_eq!(dims.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(dims.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_declared_format_overrides_name() {
        let loader = GeometryLoader::default();
        let source = ModelSource::from_bytes("upload.bin", ASCII_TETRA.as_bytes().to_vec())
            .with_format(ModelFormat::Stl);
        assert!(loader.load(source).is_ok());
    }

    #[test]
    fn test_unsupported_format_short_circuits() {
        let loader = GeometryLoader::default();
        // payload would decode fine as STL, the format alone decides
        let source = ModelSource::from_bytes("part.step", ASCII_TETRA.as_bytes().to_vec());
        let err = loader.load(source).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { format: ModelFormat::Step }));
    }

    #[test]
    fn test_zlib_compressed_source() {
        let loader = GeometryLoader::default();
        let packed = compress_zlib(ASCII_TETRA.as_bytes()).unwrap();
        let resolved = loader
            .resolve(ModelSource::from_bytes("tetra.stl.zlib", packed))
            .unwrap();
        assert_eq!(resolved.compression, CompressionKind::Zlib);
        assert!(!resolved.compression_sniffed);
        assert_eq!(loader.decode(&resolved).unwrap().triangle_count(), 4);
    }

    #[test]
    fn test_sniffed_zlib_without_suffix() {
        let loader = GeometryLoader::default();
        let packed = compress_zlib(ASCII_TETRA.as_bytes()).unwrap();
        let resolved = loader.resolve(ModelSource::from_bytes("tetra.stl", packed)).unwrap();
        assert_eq!(resolved.compression, CompressionKind::Zlib);
        assert!(resolved.compression_sniffed);
        assert!(loader.decode(&resolved).is_ok());
    }

    #[test]
    fn test_empty_sources() {
        let loader = GeometryLoader::default();
        let err = loader.load(ModelSource::from_bytes("a.stl", Vec::new())).unwrap_err();
        assert!(matches!(err, LoadError::EmptySource));

        let err = loader
            .load(ModelSource::from_bytes("a.stl", b"solid a\nendsolid a\n".to_vec()))
            .unwrap_err();
        assert!(matches!(err, LoadError::EmptySource));

        let err = loader.load(ModelSource::from_bytes("a.stl", binary_stl(&[]))).unwrap_err();
        assert!(matches!(err, LoadError::EmptySource));
    }

    #[test]
    fn test_missing_unsupported_file_is_unsupported() {
        let loader = GeometryLoader::default();
        let err = loader
            .load(ModelSource::from_path("/definitely/not/here.step"))
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { format: ModelFormat::Step }));
    }

    #[test]
    fn test_coincidental_header_inflates_to_raw() {
        let loader = GeometryLoader::default();
        // valid zlib header followed by a reserved deflate block type
        let mut bytes = vec![0x78, 0x9c, 0x06];
        bytes.extend_from_slice(ASCII_TETRA.as_bytes());
        let resolved = loader.resolve(ModelSource::from_bytes("tetra.stl", bytes.clone())).unwrap();
        assert!(resolved.compression_sniffed);
        let (payload, removed) = loader.inflate(&resolved).unwrap();
        assert_eq!(removed, CompressionKind::None);
        assert_eq!(payload, bytes);
    }

    #[test]
    fn test_missing_file_is_decode_failure() {
        let loader = GeometryLoader::default();
        let err = loader
            .load(ModelSource::from_path("/definitely/not/here.stl"))
            .unwrap_err();
        assert!(matches!(err, LoadError::DecodeFailure { .. }));
    }
}
