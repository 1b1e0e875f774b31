//! Error taxonomy for FArc parsing, decoding and extraction.
//!
//! Parse-time errors ([`ParseError`]) are fatal for the whole archive.
//! Decode and extract errors are scoped to a single entry.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::structures::Method;

/// Failure of a bounded read through [`ByteCursor`](super::cursor::ByteCursor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("read of {wanted} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        len: usize,
    },

    #[error("string at offset {offset} has no null terminator")]
    MalformedString { offset: usize },
}

/// Structural problems with the container header or entry table.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unknown FArc signature {0:#010X}")]
    UnknownSignature(u32),

    #[error("archive is truncated: {0}")]
    Truncated(#[from] CursorError),

    #[error("entry {index} ({name}) points at offset {offset}, past the end of a {len} byte archive")]
    EntryOutOfBounds {
        index: usize,
        name: String,
        offset: u64,
        len: usize,
    },

    #[error("entry {index} ({name}) offset overflows after the encryption adjustment")]
    OffsetOverflow { index: usize, name: String },
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AES-128-CBC decryption of {len} bytes failed")]
    DecryptFailed { len: usize },

    #[error("invalid AES-128 key: {0}")]
    InvalidKey(String),
}

/// Anything that aborts [`ArchiveParser::parse`](super::parser::ArchiveParser::parse).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<CursorError> for ParseError {
    fn from(err: CursorError) -> Self {
        ParseError::Format(FormatError::Truncated(err))
    }
}

/// Failure reported by a [`CodecProvider`](super::codec::CodecProvider).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),

    #[error("produced {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("corrupt chunk table: {0}")]
    CorruptChunkTable(String),

    #[error("unsupported compression flags {flags:#06X}")]
    UnsupportedMethod { flags: u32 },

    #[error("{method} decompression failed: {source}")]
    DecompressFailed {
        method: Method,
        #[source]
        source: CodecError,
    },

    #[error("payload at {offset}+{size} exceeds archive of {len} bytes")]
    PayloadOutOfBounds { offset: u64, size: u64, len: usize },
}

/// Per-entry or directory-level extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("entry {index} has an empty name")]
    EmptyName { index: usize },

    #[error("entry {index} has an unsafe path: {name}")]
    UnsafePath { index: usize, name: String },

    #[error("entry {index} ({name}): {source}")]
    Decode {
        index: usize,
        name: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("extraction worker failed: {0}")]
    Worker(String),
}
