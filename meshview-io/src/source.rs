//! Model source descriptors

use std::path::PathBuf;

use crate::format::{CompressionKind, ModelFormat};

/// Where the model bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Bytes(Vec<u8>),
    File(PathBuf),
}

/// A model to load, with optional declared format and compression
///
/// Anything not declared is sniffed from `name` (or the file path) and, for
/// compression, from the leading bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSource {
    pub data: SourceData,
    pub name: Option<String>,
    pub format: Option<ModelFormat>,
    pub compression: Option<CompressionKind>,
}

impl ModelSource {
    /// In-memory bytes with the file name they were uploaded under
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            data: SourceData::Bytes(bytes),
            name: Some(name.into()),
            format: None,
            compression: None,
        }
    }

    /// A file on disk; its path doubles as the name used for sniffing
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: Some(path.to_string_lossy().into_owned()),
            data: SourceData::File(path),
            format: None,
            compression: None,
        }
    }

    pub fn with_format(mut self, format: ModelFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_compression(mut self, compression: CompressionKind) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Human-readable label for logs
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<memory>")
    }
}

/// A source whose bytes have been read and whose format and compression are
/// settled
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub name: Option<String>,
    pub format: ModelFormat,
    pub compression: CompressionKind,
    /// True when compression was sniffed from magic bytes only
    pub compression_sniffed: bool,
    /// Payload exactly as supplied, still compressed
    pub raw: Vec<u8>,
}
