//! Decompression backends for entry payloads.

use std::io::Read;

use flate2::bufread::GzDecoder;
use flate2::read::DeflateDecoder;
use tracing::trace;

use super::error::CodecError;

/// Length of a gzip member header (magic, method, flags, mtime, xfl, os).
const GZIP_HEADER_SIZE: usize = 10;
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const GZIP_METHOD_DEFLATE: u8 = 8;

/// Output buffers start at most this many times the compressed size.
const MAX_PREALLOC_RATIO: usize = 8;

/// Decompression algorithms used by entry payloads.
///
/// `expected_size` is the size declared in the entry table; implementations
/// may use it as a capacity hint or limit, the caller verifies the final length.
pub trait CodecProvider: Send + Sync {
    /// Inflate a gzip-framed or raw DEFLATE stream.
    fn inflate(&self, src: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError>;

    /// Decompress one (or several concatenated) Zstandard frames.
    fn zstd_decompress(&self, src: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError>;
}

/// [`CodecProvider`] backed by `flate2` and `zstd`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodecs;

/// Check for a gzip member header using DEFLATE.
pub fn is_gzip_stream(src: &[u8]) -> bool {
    src.len() > GZIP_HEADER_SIZE && src[..2] == GZIP_MAGIC && src[2] == GZIP_METHOD_DEFLATE
}

impl CodecProvider for NativeCodecs {
    fn inflate(&self, src: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
        // One byte past the declared size is enough to detect an overlong stream.
        let limit = expected_size as u64 + 1;
        let mut out = Vec::with_capacity(initial_capacity(src, expected_size));

        if !is_gzip_stream(src) {
            trace!(len = src.len(), "inflating raw deflate stream");
            DeflateDecoder::new(src).take(limit).read_to_end(&mut out)?;
            return Ok(out);
        }

        // Members are decoded back to back; bytes after the last one are padding.
        let mut rest = src;
        let mut members = 0;
        while is_gzip_stream(rest) && (out.len() as u64) < limit {
            let budget = limit - out.len() as u64;
            GzDecoder::new(&mut rest).take(budget).read_to_end(&mut out)?;
            members += 1;
        }
        trace!(len = src.len(), members, tail = rest.len(), "inflated gzip stream");

        Ok(out)
    }

    fn zstd_decompress(&self, src: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
        trace!(len = src.len(), expected_size, "decompressing zstd frame");
        let limit = expected_size as u64 + 1;
        let mut out = Vec::with_capacity(initial_capacity(src, expected_size));
        zstd::stream::read::Decoder::with_buffer(src)?
            .take(limit)
            .read_to_end(&mut out)?;
        Ok(out)
    }
}

/// Preallocation for a decode: the declared size, capped relative to the input.
fn initial_capacity(src: &[u8], expected_size: usize) -> usize {
    expected_size.min(src.len().saturating_mul(MAX_PREALLOC_RATIO))
}
