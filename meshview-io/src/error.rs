//! Error types for model loading

use thiserror::Error;

use crate::format::ModelFormat;

/// Why a model source produced no canonical mesh
#[derive(Error, Debug)]
pub enum LoadError {
    /// The format is recognized (or unknown) but cannot be previewed
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: ModelFormat },

    /// Reading, decompressing or decoding the source failed
    #[error("Decode failure: {message}")]
    DecodeFailure { message: String },

    /// The source decoded to no triangles at all
    #[error("Model source contains no mesh data")]
    EmptySource,
}

impl LoadError {
    pub fn decode(message: impl Into<String>) -> Self {
        LoadError::DecodeFailure {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::decode(format!("I/O error: {}", e))
    }
}

impl From<obj::ObjError> for LoadError {
    fn from(e: obj::ObjError) -> Self {
        LoadError::decode(format!("OBJ parse error: {}", e))
    }
}

impl From<meshview_core::Error> for LoadError {
    fn from(e: meshview_core::Error) -> Self {
        match e {
            meshview_core::Error::UnsupportedFormat(_) => LoadError::UnsupportedFormat {
                format: ModelFormat::Unknown,
            },
            other => LoadError::decode(other.to_string()),
        }
    }
}

/// Result type alias for loading operations
pub type LoadResult<T> = std::result::Result<T, LoadError>;
