//! Per-entry payload location and decompression.
//!
//! Entries are independent of each other, so a single [`EntryDecoder`] can
//! be shared across worker threads over one immutable [`Archive`].

use std::sync::Arc;

use tracing::{debug, trace};

use super::codec::CodecProvider;
use super::cursor::ByteCursor;
use super::error::{CodecError, DecodeError};
use super::structures::{Archive, Entry, Method};

/// Upper bound on chunk-size words read from a split-chunk table.
pub const CHUNK_TABLE_SCAN_LIMIT: usize = 0x4000;

/// The table ends once no more than this many compressed bytes remain.
const CHUNK_TABLE_END_THRESHOLD: u64 = 4;

const CHUNK_SIZE_FIELD: u64 = 4;

pub struct EntryDecoder<D: CodecProvider> {
    codecs: Arc<D>,
}

impl<D: CodecProvider> EntryDecoder<D> {
    pub fn new(codecs: Arc<D>) -> Self {
        Self { codecs }
    }

    /// Decode one entry into a buffer of exactly `uncompressed_size` bytes.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::UnsupportedMethod`] if both codec bits are set
    /// - [`DecodeError::PayloadOutOfBounds`] if the entry does not fit in the archive
    /// - [`DecodeError::CorruptChunkTable`] if a split-chunk table never terminates
    /// - [`DecodeError::DecompressFailed`] if the codec fails or yields the wrong length
    pub fn decode(&self, archive: &Archive, entry: &Entry) -> Result<Vec<u8>, DecodeError> {
        let method = entry.method().ok_or(DecodeError::UnsupportedMethod {
            flags: entry.flags.bits(),
        })?;

        let region = entry_region(archive.data(), entry)?;
        let payload = if entry.flags.split_chunks {
            skip_chunk_table(region)?
        } else {
            region
        };

        let expected = entry.uncompressed_size as usize;
        debug!(
            name = %entry.name,
            %method,
            payload_len = payload.len(),
            expected,
            "decoding entry"
        );

        let decoded = match method {
            Method::Stored => payload
                .get(..expected)
                .map(<[u8]>::to_vec)
                .ok_or(CodecError::LengthMismatch {
                    expected,
                    actual: payload.len(),
                }),
            Method::Deflate => self.codecs.inflate(payload, expected),
            Method::Zstd => self.codecs.zstd_decompress(payload, expected),
        }
        .and_then(|out| check_length(out, expected))
        .map_err(|source| DecodeError::DecompressFailed { method, source })?;

        Ok(decoded)
    }
}

fn check_length(out: Vec<u8>, expected: usize) -> Result<Vec<u8>, CodecError> {
    if out.len() == expected {
        Ok(out)
    } else {
        Err(CodecError::LengthMismatch {
            expected,
            actual: out.len(),
        })
    }
}

/// The `compressed_size` bytes starting at the entry's offset.
fn entry_region<'a>(data: &'a [u8], entry: &Entry) -> Result<&'a [u8], DecodeError> {
    let start = entry.offset as usize;
    start
        .checked_add(entry.compressed_size as usize)
        .and_then(|end| data.get(start..end))
        .ok_or(DecodeError::PayloadOutOfBounds {
            offset: u64::from(entry.offset),
            size: u64::from(entry.compressed_size),
            len: data.len(),
        })
}

/// Step over the lead word and chunk-size table of a split entry.
///
/// Returns the remainder of `region`, which starts at the compressed data.
fn skip_chunk_table(region: &[u8]) -> Result<&[u8], DecodeError> {
    let corrupt = DecodeError::CorruptChunkTable;
    let mut cursor = ByteCursor::new(region);

    let lead = cursor.read_u32_le().map_err(|e| corrupt(e.to_string()))?;
    let mut remaining = region.len() as u64 - CHUNK_SIZE_FIELD;
    trace!(lead, remaining, "scanning chunk table");

    for _ in 0..CHUNK_TABLE_SCAN_LIMIT {
        let chunk_size = cursor.read_u32_le().map_err(|e| corrupt(e.to_string()))?;
        let step = u64::from(chunk_size) + CHUNK_SIZE_FIELD;

        let Some(left) = remaining.checked_sub(step) else {
            return Err(corrupt(format!(
                "chunk of {chunk_size} bytes exceeds the {remaining} bytes left"
            )));
        };
        remaining = left;

        if remaining <= CHUNK_TABLE_END_THRESHOLD {
            trace!(table_len = cursor.position(), "chunk table end");
            return Ok(&region[cursor.position()..]);
        }
    }

    Err(corrupt(format!(
        "no end of table after {CHUNK_TABLE_SCAN_LIMIT} chunk sizes"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farc::codec::NativeCodecs;
    use crate::farc::crypto::SoftwareCrypto;
    use crate::farc::parser::ArchiveParser;
    use crate::farc::test_utils::{
        ArchiveBuilder, FLAG_GZIP, FLAG_SPLIT, FLAG_ZSTD, TestEntry, split_payload,
    };
    use byteorder::{LittleEndian, WriteBytesExt};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn parse(data: Vec<u8>) -> Archive {
        ArchiveParser::new(Arc::new(SoftwareCrypto))
            .parse(data)
            .unwrap()
    }

    fn decoder() -> EntryDecoder<NativeCodecs> {
        EntryDecoder::new(Arc::new(NativeCodecs))
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn decode_first(archive: &Archive) -> Result<Vec<u8>, DecodeError> {
        decoder().decode(archive, &archive.entries[0])
    }

    #[test]
    fn test_stored_is_exact_copy() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let archive = parse(ArchiveBuilder::new().stored("bin", &payload).build());
        assert_eq!(decode_first(&archive).unwrap(), payload);
    }

    #[test]
    fn test_stored_prefix_of_larger_region() {
        let archive = parse(
            ArchiveBuilder::new()
                .entry("p", b"hello world".to_vec(), 5, 0)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), b"hello");
    }

    #[test]
    fn test_stored_short_payload_fails() {
        let archive = parse(ArchiveBuilder::new().entry("p", b"abc".to_vec(), 10, 0).build());
        assert!(matches!(
            decode_first(&archive),
            Err(DecodeError::DecompressFailed {
                method: Method::Stored,
                source: CodecError::LengthMismatch {
                    expected: 10,
                    actual: 3
                }
            })
        ));
    }

    #[test]
    fn test_gzip_entry() {
        let text = b"gzip entry body ".repeat(20);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("g.txt", gzip(&text), text.len() as u32, FLAG_GZIP)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), text);
    }

    #[test]
    fn test_zstd_entry() {
        let text = b"zstd entry body ".repeat(20);
        let compressed = zstd::bulk::compress(&text, 3).unwrap();
        let archive = parse(
            ArchiveBuilder::new()
                .entry("z.txt", compressed, text.len() as u32, FLAG_ZSTD)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), text);
    }

    #[test]
    fn test_declared_size_mismatch_fails() {
        let text = b"eighty bytes?".repeat(6);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("g", gzip(&text), text.len() as u32 + 20, FLAG_GZIP)
                .entry("g2", gzip(&text), text.len() as u32 - 1, FLAG_GZIP)
                .build(),
        );
        for entry in &archive.entries {
            assert!(matches!(
                decoder().decode(&archive, entry),
                Err(DecodeError::DecompressFailed {
                    method: Method::Deflate,
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_both_codec_bits_unsupported() {
        let archive = parse(
            ArchiveBuilder::new()
                .entry("both", vec![0; 8], 8, FLAG_GZIP | FLAG_ZSTD)
                .build(),
        );
        assert!(matches!(
            decode_first(&archive),
            Err(DecodeError::UnsupportedMethod { flags: 0x22 })
        ));
    }

    #[test]
    fn test_split_chunks_gzip_members() {
        let (a, b) = (b"chunk one ".repeat(30), b"chunk two ".repeat(30));
        let (ga, gb) = (gzip(&a), gzip(&b));
        let payload = split_payload(&[&ga, &gb]);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("split", payload, (a.len() + b.len()) as u32, FLAG_GZIP | FLAG_SPLIT)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), [a, b].concat());
    }

    #[test]
    fn test_split_chunks_gzip_with_short_tail() {
        let text = b"split entry with a tail ".repeat(12);
        let mut payload = split_payload(&[&gzip(&text)]);
        // The scan stops with exactly 4 bytes left, which stay in the payload.
        payload.extend_from_slice(&[0; 4]);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("tail", payload, text.len() as u32, FLAG_GZIP | FLAG_SPLIT)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), text);
    }

    #[test]
    fn test_gzip_entry_with_padding() {
        let text = b"padded gzip entry ".repeat(12);
        let mut payload = gzip(&text);
        payload.extend_from_slice(&[0; 3]);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("pad", payload, text.len() as u32, FLAG_GZIP)
                .build(),
        );
        assert_eq!(decode_first(&archive).unwrap(), text);
    }

    #[test]
    fn test_split_chunks_stored() {
        let payload = split_payload(&[b"abcd", b"efgh", b"ij"]);
        let archive = parse(ArchiveBuilder::new().entry("s", payload, 10, FLAG_SPLIT).build());
        assert_eq!(decode_first(&archive).unwrap(), b"abcdefghij");
    }

    #[test]
    fn test_skip_chunk_table_position() {
        let region = split_payload(&[&[0xAA; 100]]);
        let payload = skip_chunk_table(&region).unwrap();
        assert_eq!(payload, &[0xAA; 100][..]);
    }

    #[test]
    fn test_runaway_chunk_table_is_bounded() {
        // All-zero sizes only consume 4 bytes per step; the table would need
        // more than the scan limit to reach its end.
        let region = vec![0u8; 4 + CHUNK_TABLE_SCAN_LIMIT * 4 + 100];
        let err = skip_chunk_table(&region).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptChunkTable(ref msg) if msg.contains("no end")));

        let archive = parse(
            ArchiveBuilder::new()
                .entry("loop", region, 1, FLAG_SPLIT)
                .build(),
        );
        assert!(matches!(
            decode_first(&archive),
            Err(DecodeError::CorruptChunkTable(_))
        ));
    }

    #[test]
    fn test_chunk_table_ends_on_last_permitted_read() {
        // The final zero-sized chunk read brings the remainder down to exactly 4.
        let region = vec![0u8; 4 + CHUNK_TABLE_SCAN_LIMIT * 4 + 4];
        assert_eq!(skip_chunk_table(&region).unwrap().len(), 4);
    }

    #[test]
    fn test_oversized_chunk_is_corrupt() {
        let mut region = Vec::new();
        region.write_u32::<LittleEndian>(1).unwrap();
        region.write_u32::<LittleEndian>(u32::MAX).unwrap();
        region.extend_from_slice(&[0; 16]);
        assert!(matches!(
            skip_chunk_table(&region),
            Err(DecodeError::CorruptChunkTable(ref msg)) if msg.contains("exceeds")
        ));
    }

    #[test]
    fn test_truncated_chunk_table() {
        assert!(matches!(
            skip_chunk_table(&[1, 2]),
            Err(DecodeError::CorruptChunkTable(_))
        ));
        // lead word only, then the region runs out before any chunk size
        assert!(matches!(
            skip_chunk_table(&[1, 0, 0, 0, 9]),
            Err(DecodeError::CorruptChunkTable(_))
        ));
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let archive = parse(
            ArchiveBuilder::new()
                .raw_entry(TestEntry {
                    name: "big".into(),
                    payload: b"tiny".to_vec(),
                    uncompressed_size: 4,
                    flags: 0,
                    offset: None,
                    compressed_size: Some(0x10_0000),
                })
                .build(),
        );
        assert!(matches!(
            decode_first(&archive),
            Err(DecodeError::PayloadOutOfBounds { size: 0x10_0000, .. })
        ));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let text = b"same bytes every time ".repeat(10);
        let archive = parse(
            ArchiveBuilder::new()
                .entry("g", gzip(&text), text.len() as u32, FLAG_GZIP)
                .build(),
        );
        let first = decode_first(&archive).unwrap();
        let second = decode_first(&archive).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encrypted_archive_entries_decode() {
        let text = b"encrypted archive content ".repeat(5);
        let archive = parse(
            ArchiveBuilder::new()
                .encrypted([0x42; 16])
                .stored("plain.txt", b"hello")
                .entry("g.txt", gzip(&text), text.len() as u32, FLAG_GZIP)
                .build(),
        );
        let decoder = decoder();
        assert_eq!(decoder.decode(&archive, &archive.entries[0]).unwrap(), b"hello");
        assert_eq!(decoder.decode(&archive, &archive.entries[1]).unwrap(), text);
    }
}
