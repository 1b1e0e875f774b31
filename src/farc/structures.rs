use std::fmt;

use super::error::FormatError;
use super::flags::{ArchiveFlags, EntryFlags};

/// Recognized container revisions, keyed by the big-endian magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Invalid,
    /// `FArC`
    FArC,
    /// `FARC`
    FARC,
    /// `FARc`
    FARc,
}

impl Signature {
    pub fn from_u32(value: u32) -> Self {
        match &value.to_be_bytes() {
            b"FArC" => Signature::FArC,
            b"FARC" => Signature::FARC,
            b"FARc" => Signature::FARc,
            _ => Signature::Invalid,
        }
    }

    pub fn is_valid(&self) -> bool {
        *self != Signature::Invalid
    }
}

/// How an entry's payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
    Zstd,
}

impl Method {
    /// Select the method from entry flags; `None` when both codec bits are set.
    pub fn from_flags(flags: &EntryFlags) -> Option<Self> {
        match (flags.gzip_compressed, flags.zstd_compressed) {
            (false, false) => Some(Method::Stored),
            (true, false) => Some(Method::Deflate),
            (false, true) => Some(Method::Zstd),
            (true, true) => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Stored => "stored",
            Method::Deflate => "deflate",
            Method::Zstd => "zstd",
        })
    }
}

/// Header fields that precede the entry table.
///
/// The `reserved*` and `unk*` words have no known meaning; they are kept so
/// the parsed header accounts for every byte on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub header_size: u32,
    pub flags: ArchiveFlags,
    pub reserved: u32,
    pub iv: Option<[u8; 16]>,
    pub unk_a: u32,
    pub unk_b: u32,
    pub file_count: u32,
    pub unk_c: u32,
}

/// One record of the entry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Offset into [`Archive::data`], already adjusted for encryption.
    pub offset: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub flags: EntryFlags,
}

impl Entry {
    pub fn method(&self) -> Option<Method> {
        Method::from_flags(&self.flags)
    }
}

/// A parsed archive: header, entry table and the (decrypted) file contents.
///
/// Entries only hold offsets into `data`; nothing is copied until decode.
#[derive(Debug)]
pub struct Archive {
    pub signature: Signature,
    pub header: ArchiveHeader,
    pub entries: Vec<Entry>,
    data: Vec<u8>,
}

impl Archive {
    pub(crate) fn new(
        signature: Signature,
        header: ArchiveHeader,
        entries: Vec<Entry>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            signature,
            header,
            entries,
            data,
        }
    }

    pub fn flags(&self) -> ArchiveFlags {
        self.header.flags
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fail with [`FormatError::UnknownSignature`] for an unrecognized magic.
    pub fn ensure_valid(&self) -> Result<(), FormatError> {
        if self.signature.is_valid() {
            return Ok(());
        }
        let magic = self
            .data
            .first_chunk::<4>()
            .map(|b| u32::from_be_bytes(*b))
            .unwrap_or_default();
        Err(FormatError::UnknownSignature(magic))
    }
}
