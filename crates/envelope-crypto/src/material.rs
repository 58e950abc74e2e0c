//! Fixed-size key material: symmetric keys, nonces and authentication tags
//!
//! Each type wraps a byte array of the exact length the AEAD requires, so a
//! value that exists has already passed length validation. Hex decoding goes
//! through [`decode_hex`], which names the offending field on failure.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{CryptoError, CryptoResult, KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// Fill `buf` from the operating system's secure random source.
///
/// There is no fallback generator: if the OS source fails, so does the caller.
pub(crate) fn fill_random(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::EntropySourceUnavailable(e.to_string()))
}

/// Decode a hex string, reporting failures against `field`.
///
/// Accepts upper or lower case digits. A `0x` prefix is not stripped and
/// fails like any other non-hex character.
pub(crate) fn decode_hex(field: &'static str, input: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    hex::decode(input)
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::InvalidHex {
            field,
            reason: e.to_string(),
        })
}

/// 256-bit symmetric key, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generate a fresh key from the OS random source
    pub fn generate() -> CryptoResult<Self> {
        let mut key = Self([0u8; KEY_SIZE]);
        fill_random(&mut key.0)?;
        Ok(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice that must be exactly [`KEY_SIZE`] bytes
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            })
    }

    /// Parse a key from its 64-character hex form
    pub fn from_hex(input: &str) -> CryptoResult<Self> {
        let bytes = decode_hex("key", input)?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex form of the key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_slice())
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// 96-bit per-envelope nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Draw a fresh random nonce
    pub fn random() -> CryptoResult<Self> {
        let mut nonce = [0u8; NONCE_SIZE];
        fill_random(&mut nonce)?;
        Ok(Self(nonce))
    }

    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            })
    }

    pub fn from_hex(input: &str) -> CryptoResult<Self> {
        let bytes = decode_hex("nonce", input)?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 128-bit authentication tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthTag([u8; TAG_SIZE]);

impl AuthTag {
    pub fn from_bytes(bytes: [u8; TAG_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| CryptoError::InvalidTagLength {
                expected: TAG_SIZE,
                actual: bytes.len(),
            })
    }

    pub fn from_hex(input: &str) -> CryptoResult<Self> {
        let bytes = decode_hex("tag", input)?;
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }
}

impl fmt::Display for AuthTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
