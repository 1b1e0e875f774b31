//! # unfarc
//!
//! Extracts files stored inside FArc archive containers.
//!
//! FArc archives may be AES-128-CBC encrypted as a whole, and each entry may
//! be stored as-is, gzip/DEFLATE compressed or Zstandard compressed, with an
//! optional chunk-size table in front of the payload.
//!
//! ## Features
//!
//! - All three known signatures (`FArC`, `FARC`, `FARc`)
//! - In-place decryption of encrypted archives
//! - STORED, gzip/raw DEFLATE and Zstandard entries, split or not
//! - Concurrent per-entry decoding with bounded parallelism
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use unfarc::{ArchiveParser, EntryDecoder, FarcExtractor, NativeCodecs, SoftwareCrypto};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let data = unfarc::io::read_entire_file(Path::new("bgm.farc")).await?;
//!     let archive = ArchiveParser::new(Arc::new(SoftwareCrypto)).parse(data)?;
//!     archive.ensure_valid()?;
//!
//!     for entry in &archive.entries {
//!         println!("{}", entry.name);
//!     }
//!
//!     let extractor = FarcExtractor::new(Arc::new(archive), EntryDecoder::new(Arc::new(NativeCodecs)));
//!     let summary = extractor.extract_to_dir(Path::new("bgm")).await?;
//!     println!("{} files extracted", summary.extracted);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod farc;
pub mod io;

pub use cli::Cli;
pub use farc::{
    Archive, ArchiveParser, Entry, EntryDecoder, ExtractSummary, FarcExtractor, NativeCodecs,
    SoftwareCrypto,
};
