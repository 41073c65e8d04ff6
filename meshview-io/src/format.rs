//! Format and compression detection
//!
//! Both are sniffed from the file name first. Compression additionally falls
//! back to magic bytes, since compressed uploads often lose their suffix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Model file formats the loader knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Stl,
    Obj,
    Ply,
    Gltf,
    Glb,
    #[serde(rename = "3mf")]
    ThreeMf,
    Fbx,
    Step,
    Iges,
    Unknown,
}

impl ModelFormat {
    /// Map a lowercase extension (without the dot) to a format
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "stl" => ModelFormat::Stl,
            "obj" => ModelFormat::Obj,
            "ply" => ModelFormat::Ply,
            "gltf" => ModelFormat::Gltf,
            "glb" => ModelFormat::Glb,
            "3mf" => ModelFormat::ThreeMf,
            "fbx" => ModelFormat::Fbx,
            "step" | "stp" => ModelFormat::Step,
            "iges" | "igs" => ModelFormat::Iges,
            _ => ModelFormat::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelFormat::Stl => "stl",
            ModelFormat::Obj => "obj",
            ModelFormat::Ply => "ply",
            ModelFormat::Gltf => "gltf",
            ModelFormat::Glb => "glb",
            ModelFormat::ThreeMf => "3mf",
            ModelFormat::Fbx => "fbx",
            ModelFormat::Step => "step",
            ModelFormat::Iges => "iges",
            ModelFormat::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression wrapped around the model bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    #[default]
    None,
    Zlib,
    Gzip,
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Split off a compression suffix, returning the remaining name
fn strip_compression_suffix(name: &str) -> (&str, CompressionKind) {
    let lower = name.to_ascii_lowercase();
    for (suffix, kind) in [
        (".gz", CompressionKind::Gzip),
        (".zlib", CompressionKind::Zlib),
        (".zz", CompressionKind::Zlib),
    ] {
        if lower.ends_with(suffix) {
            return (&name[..name.len() - suffix.len()], kind);
        }
    }
    (name, CompressionKind::None)
}

/// Detect the model format from a file name or source URL
///
/// Query strings and compression suffixes are ignored, so
/// `part.stl.gz?token=1` is an STL.
pub fn detect_format(name_or_src: &str) -> ModelFormat {
    let without_query = name_or_src.split(['?', '#']).next().unwrap_or(name_or_src);
    let (stem, _) = strip_compression_suffix(without_query);
    Path::new(stem)
        .extension()
        .and_then(|s| s.to_str())
        .map(ModelFormat::from_extension)
        .unwrap_or(ModelFormat::Unknown)
}

/// Detect compression from the name, then from the leading bytes
pub fn detect_compression(name_or_src: Option<&str>, bytes: &[u8]) -> CompressionKind {
    if let Some(name) = name_or_src {
        let without_query = name.split(['?', '#']).next().unwrap_or(name);
        let (_, kind) = strip_compression_suffix(without_query);
        if kind != CompressionKind::None {
            return kind;
        }
    }
    sniff_compression(bytes)
}

/// Magic-byte sniffing
///
/// A zlib stream starts with CMF=0x78 and a FLG byte making the 16-bit header
/// a multiple of 31.
pub fn sniff_compression(bytes: &[u8]) -> CompressionKind {
    match bytes {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => CompressionKind::Gzip,
        [0x78, flg, ..] if (0x7800u16 | *flg as u16) % 31 == 0 => CompressionKind::Zlib,
        _ => CompressionKind::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_from_names() {
        assert_eq!(detect_format("bracket.STL"), ModelFormat::Stl);
        assert_eq!(detect_format("https://cdn/x/part.obj?sig=abc"), ModelFormat::Obj);
        assert_eq!(detect_format("scan.ply.gz"), ModelFormat::Ply);
        assert_eq!(detect_format("housing.stp"), ModelFormat::Step);
        assert_eq!(detect_format("assembly.3mf"), ModelFormat::ThreeMf);
        assert_eq!(detect_format("README"), ModelFormat::Unknown);
    }

    #[test]
    fn test_detect_compression_prefers_name() {
        assert_eq!(detect_compression(Some("a.stl.gz"), b"solid"), CompressionKind::Gzip);
        assert_eq!(detect_compression(Some("a.stl.zlib"), b""), CompressionKind::Zlib);
        assert_eq!(detect_compression(Some("a.stl"), b"solid x"), CompressionKind::None);
    }

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(sniff_compression(&[0x1f, 0x8b, 8, 0]), CompressionKind::Gzip);
        assert_eq!(sniff_compression(&[0x78, 0x9c, 0, 0]), CompressionKind::Zlib);
        assert_eq!(sniff_compression(&[0x78, 0x01]), CompressionKind::Zlib);
        assert_eq!(sniff_compression(&[0x78, 0x00]), CompressionKind::None);
        assert_eq!(sniff_compression(b"ply\n"), CompressionKind::None);
    }
}
