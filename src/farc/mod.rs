//! FArc archive parsing and extraction.
//!
//! ## Architecture
//!
//! - [`cursor`]: bounds-checked big-endian reader
//! - [`flags`]: archive and entry flag word decoding
//! - [`structures`]: signature, header, entry and archive types
//! - [`crypto`]: AES-128-CBC provider for encrypted archives
//! - [`codec`]: DEFLATE/gzip and Zstandard providers
//! - [`parser`]: header and entry table parsing, in-place decryption
//! - [`decoder`]: per-entry payload location and decompression
//! - [`extractor`]: concurrent decode and write-out of all entries
//!
//! ## Format Overview
//!
//! An FArc file is a 16 byte header prefix, an optional 16 byte IV, an entry
//! table and the entry payloads. Header fields are big-endian. If the archive
//! flags mark it as encrypted, everything after the IV is AES-128-CBC
//! ciphertext under a fixed key.
//!
//! Each entry is stored uncompressed, gzip/DEFLATE compressed or Zstandard
//! compressed. Split entries prefix their payload with a table of chunk sizes
//! that has to be skipped to find the compressed data.
//!
//! ## Limitations
//!
//! - Read only; archives cannot be created
//! - The whole archive is held in memory
//! - Per-entry encryption bits are parsed but not acted on

pub mod codec;
pub mod crypto;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod flags;
pub mod parser;
pub mod structures;

#[cfg(test)]
pub(crate) mod test_utils;

pub use codec::{CodecProvider, NativeCodecs};
pub use crypto::{CryptoProvider, DEFAULT_KEY, SoftwareCrypto, parse_hex_key};
pub use decoder::EntryDecoder;
pub use error::{
    CodecError, CryptoError, CursorError, DecodeError, ExtractError, FormatError, ParseError,
};
pub use extractor::{ExtractOptions, ExtractSummary, FarcExtractor};
pub use parser::{ArchiveParser, ParserOptions};
pub use structures::*;
