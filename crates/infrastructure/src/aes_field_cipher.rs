//! AES-256-GCM cipher for credential fields at rest.
//!
//! Envelope layout: base64 (standard, padded) of
//! `nonce (16 bytes) || tag (16 bytes) || ciphertext`.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hearth_application::{FieldCipher, OpenFailure};
use hearth_core::{AppError, AppResult};
use hearth_domain::Envelope;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16, U16>;

/// AES-256-GCM field cipher keyed by the SHA-256 digest of a secret.
#[derive(Clone)]
pub struct AesGcmFieldCipher {
    cipher: Aes256Gcm16,
}

impl AesGcmFieldCipher {
    /// Creates a cipher from a raw 32-byte key.
    #[must_use]
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let cipher = Aes256Gcm16::new(key_bytes.into());
        Self { cipher }
    }

    /// Derives the key from the long-term encryption secret.
    ///
    /// The secret itself is never used as key material.
    pub fn from_secret(secret: &str) -> AppResult<Self> {
        if secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "ENCRYPTION_SECRET must not be empty".to_owned(),
            ));
        }

        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Ok(Self::new(&key))
    }
}

impl FieldCipher for AesGcmFieldCipher {
    fn seal(&self, plaintext: &str) -> AppResult<Envelope> {
        let nonce = Aes256Gcm16::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|error| AppError::Internal(format!("failed to encrypt field: {error}")))?;

        let mut envelope = Vec::with_capacity(NONCE_LEN + TAG_LEN + buffer.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&tag);
        envelope.extend_from_slice(&buffer);
        Ok(Envelope::new(STANDARD.encode(envelope)))
    }

    fn open(&self, envelope: &Envelope) -> Result<String, OpenFailure> {
        let decoded = STANDARD
            .decode(envelope.as_str())
            .map_err(|_| OpenFailure::Encoding)?;
        if decoded.len() < NONCE_LEN + TAG_LEN {
            return Err(OpenFailure::Truncated);
        }

        let (nonce, rest) = decoded.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(nonce),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(tag),
            )
            .map_err(|_| OpenFailure::Authentication)?;

        String::from_utf8(buffer).map_err(|_| OpenFailure::Utf8)
    }
}
