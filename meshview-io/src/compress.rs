//! Decompression of model payloads and the zlib re-export

use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{LoadError, LoadResult};
use crate::format::CompressionKind;

/// Inflate `bytes` according to `kind`
pub fn decompress(bytes: &[u8], kind: CompressionKind) -> LoadResult<Vec<u8>> {
    let mut out = Vec::new();
    match kind {
        CompressionKind::None => return Ok(bytes.to_vec()),
        CompressionKind::Zlib => {
            ZlibDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|e| LoadError::decode(format!("zlib inflate failed: {}", e)))?;
        }
        CompressionKind::Gzip => {
            GzDecoder::new(bytes)
                .read_to_end(&mut out)
                .map_err(|e| LoadError::decode(format!("gzip inflate failed: {}", e)))?;
        }
    }
    Ok(out)
}

/// Deflate raw model bytes into the zlib stream handed to export sinks
pub fn compress_zlib(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::sniff_compression;
    use flate2::write::GzEncoder;

    #[test]
    fn test_zlib_export_is_inflatable() {
        let payload = b"solid cube\nendsolid cube\n".repeat(8);
        let packed = compress_zlib(&payload).unwrap();
        assert_eq!(sniff_compression(&packed), CompressionKind::Zlib);
        assert_eq!(decompress(&packed, CompressionKind::Zlib).unwrap(), payload);
    }

    #[test]
    fn test_gzip_inflate() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(b"ply\nformat ascii 1.0\n").unwrap();
        let packed = enc.finish().unwrap();
        assert_eq!(
            decompress(&packed, CompressionKind::Gzip).unwrap(),
            b"ply\nformat ascii 1.0\n".to_vec()
        );
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        let err = decompress(b"\x78\x9cnot really zlib", CompressionKind::Zlib).unwrap_err();
        assert!(matches!(err, LoadError::DecodeFailure { .. }));
    }
}
