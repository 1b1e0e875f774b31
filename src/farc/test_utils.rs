//! Builders for FArc fixtures used across the unit tests.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::crypto::{Aes128Iv, Aes128Key, DEFAULT_KEY, encrypt_aes128_cbc};
use super::parser::{ENCRYPTED_DATA_OFFSET, ENCRYPTED_OFFSET_ADJUSTMENT, HEADER_PREFIX_SIZE};

pub(crate) const FLAG_GZIP: u32 = 1 << 1;
pub(crate) const FLAG_ENCRYPTED: u32 = 1 << 2;
pub(crate) const FLAG_SPLIT: u32 = 1 << 4;
pub(crate) const FLAG_ZSTD: u32 = 1 << 5;

pub(crate) struct TestEntry {
    pub name: String,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
    pub flags: u32,
    /// Written verbatim instead of the computed offset.
    pub offset: Option<u32>,
    /// Written verbatim instead of `payload.len()`.
    pub compressed_size: Option<u32>,
}

pub(crate) struct ArchiveBuilder {
    magic: [u8; 4],
    encryption: Option<(Aes128Key, Aes128Iv)>,
    file_count: Option<u32>,
    entries: Vec<TestEntry>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            magic: *b"FArC",
            encryption: None,
            file_count: None,
            entries: Vec::new(),
        }
    }

    pub fn magic(mut self, magic: &[u8; 4]) -> Self {
        self.magic = *magic;
        self
    }

    pub fn encrypted(self, iv: Aes128Iv) -> Self {
        self.encrypted_with(DEFAULT_KEY, iv)
    }

    pub fn encrypted_with(mut self, key: Aes128Key, iv: Aes128Iv) -> Self {
        self.encryption = Some((key, iv));
        self
    }

    /// Override the declared file count.
    pub fn file_count(mut self, count: u32) -> Self {
        self.file_count = Some(count);
        self
    }

    pub fn stored(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, data.to_vec(), data.len() as u32, 0)
    }

    pub fn entry(self, name: &str, payload: Vec<u8>, uncompressed_size: u32, flags: u32) -> Self {
        self.raw_entry(TestEntry {
            name: name.to_string(),
            payload,
            uncompressed_size,
            flags,
            offset: None,
            compressed_size: None,
        })
    }

    pub fn raw_entry(mut self, entry: TestEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let encrypted = self.encryption.is_some();
        let table_start = if encrypted {
            ENCRYPTED_DATA_OFFSET
        } else {
            HEADER_PREFIX_SIZE
        };
        let table_len: usize = 16
            + self
                .entries
                .iter()
                .map(|e| e.name.len() + 1 + 16)
                .sum::<usize>();
        let adjustment = if encrypted {
            ENCRYPTED_OFFSET_ADJUSTMENT
        } else {
            0
        };

        let mut body = Vec::new();
        body.write_u32::<BigEndian>(0).unwrap();
        body.write_u32::<BigEndian>(1).unwrap();
        body.write_u32::<BigEndian>(self.file_count.unwrap_or(self.entries.len() as u32))
            .unwrap();
        body.write_u32::<BigEndian>(0).unwrap();

        let mut payload_pos = table_start + table_len;
        for entry in &self.entries {
            let offset = entry
                .offset
                .unwrap_or(payload_pos as u32 - adjustment);
            body.extend_from_slice(entry.name.as_bytes());
            body.push(0);
            body.write_u32::<BigEndian>(offset).unwrap();
            body.write_u32::<BigEndian>(entry.compressed_size.unwrap_or(entry.payload.len() as u32))
                .unwrap();
            body.write_u32::<BigEndian>(entry.uncompressed_size).unwrap();
            body.write_u32::<BigEndian>(entry.flags).unwrap();
            payload_pos += entry.payload.len();
        }
        for entry in &self.entries {
            body.extend_from_slice(&entry.payload);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&self.magic);
        out.write_u32::<BigEndian>(table_len as u32).unwrap();
        out.write_u32::<BigEndian>(if encrypted { FLAG_ENCRYPTED } else { 0 })
            .unwrap();
        out.write_u32::<BigEndian>(0).unwrap();

        if let Some((key, iv)) = self.encryption {
            out.extend_from_slice(&iv);
            body.resize(body.len().next_multiple_of(16), 0);
            encrypt_aes128_cbc(&mut body, &key, &iv);
        }
        out.extend_from_slice(&body);
        out
    }
}

/// Lay out a split-chunk payload: lead word, little-endian chunk sizes, chunks.
pub(crate) fn split_payload(chunks: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(chunks.len() as u32).unwrap();
    for chunk in chunks {
        out.write_u32::<LittleEndian>(chunk.len() as u32).unwrap();
    }
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}
