//! Sealed envelopes and the cipher that produces them

use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    ChaCha20Poly1305,
};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use zeroize::Zeroizing;

use crate::material::decode_hex;
use crate::{AuthTag, CipherSuite, CryptoError, CryptoResult, Nonce, SymmetricKey};

/// Nonce, detached tag and ciphertext of one sealed payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: Nonce,
    pub tag: AuthTag,
    /// Same length as the plaintext
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Decode an envelope from its three hex components.
    ///
    /// Nonce and tag lengths are checked here, before any cipher exists.
    pub fn from_hex(nonce_hex: &str, tag_hex: &str, ciphertext_hex: &str) -> CryptoResult<Self> {
        let nonce = Nonce::from_hex(nonce_hex)?;
        let tag = AuthTag::from_hex(tag_hex)?;
        let ciphertext = decode_hex("ciphertext", ciphertext_hex)?.to_vec();
        Ok(Self {
            nonce,
            tag,
            ciphertext,
        })
    }

    /// Hex wire record for this envelope, stamped with the suite that sealed it
    pub fn to_hex(&self, suite: CipherSuite) -> EnvelopeHex {
        EnvelopeHex {
            suite,
            nonce_hex: self.nonce.to_hex(),
            tag_hex: self.tag.to_hex(),
            ciphertext_hex: hex::encode(&self.ciphertext),
        }
    }
}

/// Wire form of an envelope: every binary field as lowercase hex.
///
/// Serialized as `{"suite", "nonceHex", "tagHex", "ciphertextHex"}`. The
/// JavaScript SDK's `ivHex` / `authTagHex` names are accepted on input, and a
/// record without `suite` is read as the default suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHex {
    #[serde(default)]
    pub suite: CipherSuite,
    #[serde(alias = "ivHex")]
    pub nonce_hex: String,
    #[serde(alias = "authTagHex")]
    pub tag_hex: String,
    pub ciphertext_hex: String,
}

impl EnvelopeHex {
    /// Validate the hex fields into a typed [`Envelope`]
    pub fn to_envelope(&self) -> CryptoResult<Envelope> {
        Envelope::from_hex(&self.nonce_hex, &self.tag_hex, &self.ciphertext_hex)
    }
}

enum SuiteCipher {
    ChaCha20Poly1305(ChaCha20Poly1305),
    Aes256Gcm(Aes256Gcm),
}

/// AEAD bound to one key and one suite.
///
/// Holds no per-message state: every [`seal`](Self::seal) draws its own
/// nonce, so a single instance can be shared across threads.
pub struct EnvelopeCipher {
    suite: CipherSuite,
    cipher: SuiteCipher,
}

impl EnvelopeCipher {
    /// Cipher for `key` using the default suite
    pub fn new(key: &SymmetricKey) -> Self {
        Self::with_suite(key, CipherSuite::default())
    }

    pub fn with_suite(key: &SymmetricKey, suite: CipherSuite) -> Self {
        let key = GenericArray::from_slice(key.as_bytes());
        let cipher = match suite {
            CipherSuite::ChaCha20Poly1305 => {
                SuiteCipher::ChaCha20Poly1305(ChaCha20Poly1305::new(key))
            }
            CipherSuite::Aes256Gcm => SuiteCipher::Aes256Gcm(Aes256Gcm::new(key)),
        };
        Self { suite, cipher }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Encrypt `plaintext` under a fresh random nonce
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<Envelope> {
        let nonce = Nonce::random()?;
        self.seal_with_nonce(nonce, plaintext)
    }

    // Crate-private: a caller-chosen nonce is only safe for fixed test vectors.
    pub(crate) fn seal_with_nonce(&self, nonce: Nonce, plaintext: &[u8]) -> CryptoResult<Envelope> {
        trace!(suite = %self.suite, len = plaintext.len(), "sealing envelope");

        let mut buffer = Zeroizing::new(plaintext.to_vec());
        let aead_nonce = GenericArray::from_slice(nonce.as_bytes());
        let tag = match &self.cipher {
            SuiteCipher::ChaCha20Poly1305(cipher) => {
                cipher.encrypt_in_place_detached(aead_nonce, &[], buffer.as_mut_slice())
            }
            SuiteCipher::Aes256Gcm(cipher) => {
                cipher.encrypt_in_place_detached(aead_nonce, &[], buffer.as_mut_slice())
            }
        }
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(Envelope {
            nonce,
            tag: AuthTag::from_slice(&tag)?,
            ciphertext: std::mem::take(&mut *buffer),
        })
    }

    /// Verify and decrypt an envelope.
    ///
    /// Returns [`CryptoError::AuthenticationFailure`] if the tag does not
    /// match. The working buffer is zeroized on that path, so no decrypted
    /// bytes outlive the call.
    pub fn open(&self, envelope: &Envelope) -> CryptoResult<Vec<u8>> {
        trace!(suite = %self.suite, len = envelope.ciphertext.len(), "opening envelope");

        let mut buffer = Zeroizing::new(envelope.ciphertext.clone());
        let aead_nonce = GenericArray::from_slice(envelope.nonce.as_bytes());
        let tag = GenericArray::from_slice(envelope.tag.as_bytes());
        let verified = match &self.cipher {
            SuiteCipher::ChaCha20Poly1305(cipher) => {
                cipher.decrypt_in_place_detached(aead_nonce, &[], buffer.as_mut_slice(), tag)
            }
            SuiteCipher::Aes256Gcm(cipher) => {
                cipher.decrypt_in_place_detached(aead_nonce, &[], buffer.as_mut_slice(), tag)
            }
        };

        if verified.is_err() {
            warn!(suite = %self.suite, "envelope authentication failed");
            return Err(CryptoError::AuthenticationFailure);
        }

        Ok(std::mem::take(&mut *buffer))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;
    use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

    fn flip_bit(bytes: &mut [u8], bit: usize) {
        bytes[bit / 8] ^= 1 << (bit % 8);
    }

    #[test]
    fn test_seal_and_open() {
        for suite in CipherSuite::ALL {
            let key = SymmetricKey::generate().unwrap();
            let cipher = EnvelopeCipher::with_suite(&key, suite);

            let message = b"Hello from the envelope!";
            let envelope = cipher.seal(message).unwrap();
            assert_eq!(envelope.ciphertext.len(), message.len());
            assert_ne!(envelope.ciphertext.as_slice(), message.as_slice());

            let opened = cipher.open(&envelope).unwrap();
            assert_eq!(message.as_slice(), opened.as_slice());
        }
    }

    #[test]
    fn test_empty_plaintext() {
        for suite in CipherSuite::ALL {
            let key = SymmetricKey::generate().unwrap();
            let cipher = EnvelopeCipher::with_suite(&key, suite);

            let envelope = cipher.seal(b"").unwrap();
            assert!(envelope.ciphertext.is_empty());
            assert!(cipher.open(&envelope).unwrap().is_empty());
        }
    }

    #[test]
    fn test_default_cipher_opens_sdk_vector() {
        // All-zero key and IV over an empty payload, as written by the SDK
        let key = SymmetricKey::from_bytes([0u8; KEY_SIZE]);
        let cipher = EnvelopeCipher::new(&key);
        assert_eq!(cipher.suite(), CipherSuite::Aes256Gcm);

        let envelope = Envelope::from_hex(
            "000000000000000000000000",
            "530f8afbc74536b9a963b4f1c4cb738b",
            "",
        )
        .unwrap();
        assert!(cipher.open(&envelope).unwrap().is_empty());
    }

    #[test]
    fn test_nonce_uniqueness() {
        let key = SymmetricKey::generate().unwrap();
        let cipher = EnvelopeCipher::new(&key);

        let mut nonces = HashSet::new();
        let mut tags = HashSet::new();
        for _ in 0..10_000 {
            let envelope = cipher.seal(b"same message every time").unwrap();
            assert!(nonces.insert(envelope.nonce), "nonce repeated");
            tags.insert((envelope.tag, envelope.ciphertext));
        }
        assert_eq!(tags.len(), 10_000);
    }

    #[test]
    fn test_every_bit_flip_detected() {
        for suite in CipherSuite::ALL {
            let key = SymmetricKey::generate().unwrap();
            let cipher = EnvelopeCipher::with_suite(&key, suite);
            let envelope = cipher.seal(b"hello").unwrap();

            for bit in 0..NONCE_SIZE * 8 {
                let mut nonce = *envelope.nonce.as_bytes();
                flip_bit(&mut nonce, bit);
                let tampered = Envelope {
                    nonce: Nonce::from_bytes(nonce),
                    ..envelope.clone()
                };
                assert!(cipher.open(&tampered).unwrap_err().is_authentication_failure());
            }

            for bit in 0..TAG_SIZE * 8 {
                let mut tag = *envelope.tag.as_bytes();
                flip_bit(&mut tag, bit);
                let tampered = Envelope {
                    tag: AuthTag::from_bytes(tag),
                    ..envelope.clone()
                };
                assert!(cipher.open(&tampered).unwrap_err().is_authentication_failure());
            }

            for bit in 0..envelope.ciphertext.len() * 8 {
                let mut tampered = envelope.clone();
                flip_bit(&mut tampered.ciphertext, bit);
                assert!(cipher.open(&tampered).unwrap_err().is_authentication_failure());
            }
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = SymmetricKey::generate().unwrap();
        let other = SymmetricKey::generate().unwrap();

        let envelope = EnvelopeCipher::new(&key).seal(b"secret").unwrap();
        let err = EnvelopeCipher::new(&other).open(&envelope).unwrap_err();
        assert!(err.is_authentication_failure());

        // One flipped key bit is as good as a different key
        let mut near = *key.as_bytes();
        flip_bit(&mut near, 200);
        let err = EnvelopeCipher::new(&SymmetricKey::from_bytes(near))
            .open(&envelope)
            .unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_suites_do_not_cross_open() {
        let key = SymmetricKey::generate().unwrap();
        let chacha = EnvelopeCipher::with_suite(&key, CipherSuite::ChaCha20Poly1305);
        let aes = EnvelopeCipher::with_suite(&key, CipherSuite::Aes256Gcm);

        let envelope = chacha.seal(b"suite bound").unwrap();
        assert!(aes.open(&envelope).unwrap_err().is_authentication_failure());

        let envelope = aes.seal(b"suite bound").unwrap();
        assert!(chacha.open(&envelope).unwrap_err().is_authentication_failure());
    }

    // NIST GCM test cases 13 and 14 (256-bit zero key, zero IV). Node's
    // `aes-256-gcm` produces the same bytes, so these pin interop with
    // envelopes written by the JavaScript SDK.
    #[test]
    fn test_aes_gcm_known_vectors() {
        let key = SymmetricKey::from_bytes([0u8; KEY_SIZE]);
        let cipher = EnvelopeCipher::with_suite(&key, CipherSuite::Aes256Gcm);
        let nonce = Nonce::from_bytes([0u8; NONCE_SIZE]);

        let empty = cipher.seal_with_nonce(nonce, b"").unwrap();
        assert_eq!(empty.tag.to_hex(), "530f8afbc74536b9a963b4f1c4cb738b");

        let block = cipher.seal_with_nonce(nonce, &[0u8; 16]).unwrap();
        assert_eq!(hex::encode(&block.ciphertext), "cea7403d4d606b6e074ec5d3baf39d18");
        assert_eq!(block.tag.to_hex(), "d0d1c8a799996bf0265b98b5d48ab919");
        assert_eq!(cipher.open(&block).unwrap(), vec![0u8; 16]);
    }

    #[test]
    fn test_concurrent_sealing() {
        let key = SymmetricKey::generate().unwrap();
        let cipher = EnvelopeCipher::new(&key);

        let nonces: Vec<Nonce> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cipher = &cipher;
                    scope.spawn(move || {
                        (0..250)
                            .map(|j| {
                                let msg = format!("thread {i} message {j}");
                                let envelope = cipher.seal(msg.as_bytes()).unwrap();
                                assert_eq!(cipher.open(&envelope).unwrap(), msg.as_bytes());
                                envelope.nonce
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let unique: HashSet<_> = nonces.iter().collect();
        assert_eq!(unique.len(), nonces.len());
    }

    #[test]
    fn test_hex_record_round_trip() {
        let key = SymmetricKey::generate().unwrap();
        let cipher = EnvelopeCipher::with_suite(&key, CipherSuite::ChaCha20Poly1305);
        let envelope = cipher.seal(b"wire").unwrap();

        let record = envelope.to_hex(cipher.suite());
        assert_eq!(record.suite, CipherSuite::ChaCha20Poly1305);
        assert_eq!(record.to_envelope().unwrap(), envelope);
    }

    #[test]
    fn test_record_accepts_sdk_field_names() {
        let json = r#"{"ivHex":"000000000000000000000000","authTagHex":"530f8afbc74536b9a963b4f1c4cb738b","ciphertextHex":""}"#;
        let record: EnvelopeHex = serde_json::from_str(json).unwrap();
        assert_eq!(record.suite, CipherSuite::Aes256Gcm);
        assert_eq!(record.nonce_hex, "0".repeat(24));

        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(serialized["suite"], "aes-256-gcm");
        assert!(serialized.get("nonceHex").is_some());
        assert!(serialized.get("tagHex").is_some());
        assert!(serialized.get("ivHex").is_none());
    }

    proptest! {
        #[test]
        fn prop_round_trip(payload in prop::collection::vec(any::<u8>(), 0..1024)) {
            let key = SymmetricKey::generate().unwrap();
            let cipher = EnvelopeCipher::new(&key);
            let envelope = cipher.seal(&payload).unwrap();
            prop_assert_eq!(envelope.ciphertext.len(), payload.len());
            prop_assert_eq!(cipher.open(&envelope).unwrap(), payload);
        }

        #[test]
        fn prop_ciphertext_tamper_detected(
            payload in prop::collection::vec(any::<u8>(), 1..256),
            bit in any::<prop::sample::Index>(),
        ) {
            let key = SymmetricKey::generate().unwrap();
            let cipher = EnvelopeCipher::new(&key);
            let mut envelope = cipher.seal(&payload).unwrap();
            flip_bit(&mut envelope.ciphertext, bit.index(payload.len() * 8));
            prop_assert!(cipher.open(&envelope).unwrap_err().is_authentication_failure());
        }
    }
}
