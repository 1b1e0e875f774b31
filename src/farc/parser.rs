//! FArc header and entry table parser.
//!
//! ## Layout
//!
//! ```text
//! 0x00  signature        "FArC" | "FARC" | "FARc"
//! 0x04  header size      u32 BE
//! 0x08  archive flags    u32 BE
//! 0x0C  reserved         u32 BE
//! 0x10  IV               16 bytes, only when encrypted
//! ....  unk_a, unk_b, file count, unk_c   (u32 BE each)
//! ....  entry table      name\0, offset, compressed, uncompressed, flags
//! ```
//!
//! When the archive is encrypted everything from 0x20 onwards is AES-128-CBC
//! ciphertext. It is decrypted in place before the entry table is read, and
//! each stored entry offset is shifted by 16 to land in the original buffer.

use std::sync::Arc;

use tracing::{debug, error, trace};

use super::crypto::{Aes128Iv, Aes128Key, CryptoProvider, DEFAULT_KEY};
use super::cursor::ByteCursor;
use super::error::{FormatError, ParseError};
use super::flags::{decode_archive_flags, decode_entry_flags};
use super::structures::{Archive, ArchiveHeader, Entry, Signature};

/// Unencrypted header prefix: signature, header size, flags, reserved.
pub const HEADER_PREFIX_SIZE: usize = 16;
pub const IV_SIZE: usize = 16;
/// Start of the ciphertext in an encrypted archive.
pub const ENCRYPTED_DATA_OFFSET: usize = HEADER_PREFIX_SIZE + IV_SIZE;
/// Added to every stored entry offset of an encrypted archive.
pub const ENCRYPTED_OFFSET_ADJUSTMENT: u32 = 16;

/// Smallest possible entry record: empty name plus four u32 fields.
const MIN_ENTRY_SIZE: usize = 1 + 16;

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Key for encrypted archives.
    pub key: Aes128Key,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { key: DEFAULT_KEY }
    }
}

/// Turns raw archive bytes into an [`Archive`].
pub struct ArchiveParser<C: CryptoProvider> {
    crypto: Arc<C>,
    options: ParserOptions,
}

impl<C: CryptoProvider> ArchiveParser<C> {
    pub fn new(crypto: Arc<C>) -> Self {
        Self::with_options(crypto, ParserOptions::default())
    }

    pub fn with_options(crypto: Arc<C>, options: ParserOptions) -> Self {
        Self { crypto, options }
    }

    /// Parse `data`, taking ownership of it.
    ///
    /// An unrecognized signature is logged and yields an archive with
    /// [`Signature::Invalid`] and no entries; callers decide whether that is
    /// fatal via [`Archive::ensure_valid`].
    ///
    /// # Errors
    ///
    /// Truncation anywhere in the header or entry table, an entry pointing
    /// outside the buffer, or a failed decryption.
    pub fn parse(&self, mut data: Vec<u8>) -> Result<Archive, ParseError> {
        let mut cursor = ByteCursor::new(&data);
        let magic = cursor.read_u32()?;
        let signature = Signature::from_u32(magic);

        if !signature.is_valid() {
            error!("unexpected FArc signature {magic:#010X}");
            return Ok(Archive::new(
                signature,
                ArchiveHeader::default(),
                Vec::new(),
                data,
            ));
        }

        let header_size = cursor.read_u32()?;
        let flags = decode_archive_flags(cursor.read_u32()?);
        let reserved = cursor.read_u32()?;
        debug!(?signature, header_size, ?flags, "read FArc header");

        let (table_start, iv) = if flags.encrypted {
            let iv = self.decrypt_body(&mut data)?;
            (ENCRYPTED_DATA_OFFSET, Some(iv))
        } else {
            (HEADER_PREFIX_SIZE, None)
        };

        let mut cursor = ByteCursor::at(&data, table_start);
        let unk_a = cursor.read_u32()?;
        let unk_b = cursor.read_u32()?;
        let file_count = cursor.read_u32()?;
        let unk_c = cursor.read_u32()?;

        // The count is untrusted; never reserve more than the table could hold.
        let capacity = (file_count as usize).min(cursor.remaining() / MIN_ENTRY_SIZE);
        let mut entries = Vec::with_capacity(capacity);

        for index in 0..file_count as usize {
            let name = String::from_utf8_lossy(cursor.read_cstring()?).into_owned();
            let mut offset = cursor.read_u32()?;
            let compressed_size = cursor.read_u32()?;
            let uncompressed_size = cursor.read_u32()?;
            let entry_flags = decode_entry_flags(cursor.read_u32()?);

            if flags.encrypted {
                offset = offset
                    .checked_add(ENCRYPTED_OFFSET_ADJUSTMENT)
                    .ok_or_else(|| FormatError::OffsetOverflow {
                        index,
                        name: name.clone(),
                    })?;
            }

            if offset as usize > data.len() {
                return Err(FormatError::EntryOutOfBounds {
                    index,
                    name,
                    offset: u64::from(offset),
                    len: data.len(),
                }
                .into());
            }

            trace!(
                index,
                %name,
                offset,
                compressed_size,
                uncompressed_size,
                flags = ?entry_flags,
                "entry"
            );

            entries.push(Entry {
                name,
                offset,
                compressed_size,
                uncompressed_size,
                flags: entry_flags,
            });
        }

        debug!(entries = entries.len(), "parsed FArc entry table");

        let header = ArchiveHeader {
            header_size,
            flags,
            reserved,
            iv,
            unk_a,
            unk_b,
            file_count,
            unk_c,
        };
        Ok(Archive::new(signature, header, entries, data))
    }

    /// Decrypt everything after the IV in place and return the IV.
    fn decrypt_body(&self, data: &mut [u8]) -> Result<Aes128Iv, ParseError> {
        let iv: Aes128Iv = ByteCursor::at(data, HEADER_PREFIX_SIZE).read_array()?;
        let body = &mut data[ENCRYPTED_DATA_OFFSET..];
        let len = body.len();

        self.crypto
            .decrypt_aes128_cbc(body, &self.options.key, &iv)?;
        debug!(len, "decrypted archive body");

        Ok(iv)
    }
}
