//! Envelope Crypto - symmetric authenticated encryption envelopes
//!
//! Seals arbitrary payloads under a 256-bit key with a fresh random 96-bit
//! nonce per call and a detached 128-bit tag. Keys, nonces, tags and
//! ciphertexts travel as lowercase hex.
//!
//! ```
//! let key = envelope_crypto::generate_key()?;
//! let sealed = envelope_crypto::encrypt(&key, "hello")?;
//! let plaintext = envelope_crypto::decrypt(
//!     &key,
//!     &sealed.nonce_hex,
//!     &sealed.tag_hex,
//!     &sealed.ciphertext_hex,
//! )?;
//! assert_eq!(plaintext, b"hello");
//! # Ok::<(), envelope_crypto::CryptoError>(())
//! ```

mod api;
mod envelope;
mod error;
mod material;
mod suite;

pub use api::*;
pub use envelope::*;
pub use error::*;
pub use material::{AuthTag, Nonce, SymmetricKey};
pub use suite::*;

/// Symmetric key size (256 bits / 32 bytes)
pub const KEY_SIZE: usize = 32;

/// Nonce size (96 bits / 12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (128 bits / 16 bytes)
pub const TAG_SIZE: usize = 16;
