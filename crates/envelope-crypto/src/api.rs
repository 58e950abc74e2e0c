//! Hex-string entry points
//!
//! Thin wrappers over [`SymmetricKey`] and [`EnvelopeCipher`] for callers that
//! hold keys and envelopes as hex text. Every input is validated into its
//! typed form first, so length and syntax errors surface before any cipher is
//! built.

use tracing::debug;
use zeroize::Zeroize;

use crate::{CipherSuite, CryptoError, CryptoResult, Envelope, EnvelopeCipher, EnvelopeHex, SymmetricKey};

/// Generate a fresh key as 64 lowercase hex characters
pub fn generate_key() -> CryptoResult<String> {
    let key = SymmetricKey::generate()?;
    debug!("generated symmetric key");
    Ok(key.to_hex())
}

/// Encrypt `plaintext` under `key_hex` with the default suite
pub fn encrypt(key_hex: &str, plaintext: impl AsRef<[u8]>) -> CryptoResult<EnvelopeHex> {
    encrypt_with_suite(CipherSuite::default(), key_hex, plaintext)
}

pub fn encrypt_with_suite(
    suite: CipherSuite,
    key_hex: &str,
    plaintext: impl AsRef<[u8]>,
) -> CryptoResult<EnvelopeHex> {
    let key = SymmetricKey::from_hex(key_hex)?;
    let envelope = EnvelopeCipher::with_suite(&key, suite).seal(plaintext.as_ref())?;
    Ok(envelope.to_hex(suite))
}

/// Decrypt a default-suite envelope given as hex components
pub fn decrypt(
    key_hex: &str,
    nonce_hex: &str,
    tag_hex: &str,
    ciphertext_hex: &str,
) -> CryptoResult<Vec<u8>> {
    decrypt_with_suite(CipherSuite::default(), key_hex, nonce_hex, tag_hex, ciphertext_hex)
}

pub fn decrypt_with_suite(
    suite: CipherSuite,
    key_hex: &str,
    nonce_hex: &str,
    tag_hex: &str,
    ciphertext_hex: &str,
) -> CryptoResult<Vec<u8>> {
    let key = SymmetricKey::from_hex(key_hex)?;
    let envelope = Envelope::from_hex(nonce_hex, tag_hex, ciphertext_hex)?;
    EnvelopeCipher::with_suite(&key, suite).open(&envelope)
}

/// Decrypt a wire record, using the suite it names
pub fn decrypt_envelope(key_hex: &str, record: &EnvelopeHex) -> CryptoResult<Vec<u8>> {
    decrypt_with_suite(
        record.suite,
        key_hex,
        &record.nonce_hex,
        &record.tag_hex,
        &record.ciphertext_hex,
    )
}

/// Decrypt and interpret the plaintext as UTF-8.
///
/// Bytes that fail UTF-8 validation are zeroized before the error returns.
pub fn decrypt_to_string(
    key_hex: &str,
    nonce_hex: &str,
    tag_hex: &str,
    ciphertext_hex: &str,
) -> CryptoResult<String> {
    let plaintext = decrypt(key_hex, nonce_hex, tag_hex, ciphertext_hex)?;
    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        CryptoError::InvalidUtf8
    })
}
