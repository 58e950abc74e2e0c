//! Envelope error types

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength { expected: usize, actual: usize },

    #[error("Invalid tag length: expected {expected} bytes, got {actual}")]
    InvalidTagLength { expected: usize, actual: usize },

    #[error("Invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    #[error("Decryption failed: authentication tag mismatch")]
    AuthenticationFailure,

    #[error("Secure random source unavailable: {0}")]
    EntropySourceUnavailable(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unknown cipher suite: {0}")]
    UnknownSuite(String),
}

impl CryptoError {
    /// True when the tag did not verify (wrong key or tampered envelope)
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailure)
    }

    /// True for any of the fixed-length precondition violations
    pub fn is_length_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyLength { .. }
                | Self::InvalidNonceLength { .. }
                | Self::InvalidTagLength { .. }
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
