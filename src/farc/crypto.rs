//! AES-128-CBC decryption of the archive body.

use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
use tracing::trace;

use super::error::CryptoError;

pub type Aes128Key = [u8; 16];
pub type Aes128Iv = [u8; 16];

/// Key shipped with the game client, as a hex string.
pub const DEFAULT_KEY_HEX: &str = "62EC7CD79141695E53592ACC10CDC04C";

/// [`DEFAULT_KEY_HEX`] as bytes.
pub const DEFAULT_KEY: Aes128Key = [
    0x62, 0xEC, 0x7C, 0xD7, 0x91, 0x41, 0x69, 0x5E, 0x53, 0x59, 0x2A, 0xCC, 0x10, 0xCD, 0xC0, 0x4C,
];

/// Block cipher backend used by the parser.
pub trait CryptoProvider: Send + Sync {
    /// Decrypt `buf` in place. `buf.len()` must be a multiple of 16.
    fn decrypt_aes128_cbc(
        &self,
        buf: &mut [u8],
        key: &Aes128Key,
        iv: &Aes128Iv,
    ) -> Result<(), CryptoError>;
}

/// [`CryptoProvider`] backed by the RustCrypto `aes` and `cbc` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCrypto;

impl CryptoProvider for SoftwareCrypto {
    fn decrypt_aes128_cbc(
        &self,
        buf: &mut [u8],
        key: &Aes128Key,
        iv: &Aes128Iv,
    ) -> Result<(), CryptoError> {
        let len = buf.len();
        trace!(len, "decrypting AES-128-CBC region");

        cbc::Decryptor::<Aes128>::new(&(*key).into(), &(*iv).into())
            .decrypt_padded_mut::<NoPadding>(buf)
            .map_err(|_| CryptoError::DecryptFailed { len })?;
        Ok(())
    }
}

/// Parse a 32-digit hex key. Whitespace is ignored, case does not matter.
pub fn parse_hex_key(text: &str) -> Result<Aes128Key, CryptoError> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&digits).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    Aes128Key::try_from(bytes.as_slice())
        .map_err(|_| CryptoError::InvalidKey(format!("expected 16 bytes, got {}", bytes.len())))
}

#[cfg(test)]
pub(crate) fn encrypt_aes128_cbc(buf: &mut [u8], key: &Aes128Key, iv: &Aes128Iv) {
    use cbc::cipher::BlockEncryptMut;

    let len = buf.len();
    cbc::Encryptor::<Aes128>::new(&(*key).into(), &(*iv).into())
        .encrypt_padded_mut::<NoPadding>(buf, len)
        .unwrap();
}
