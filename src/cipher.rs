//! Authenticated encryption of small payloads
//!
//! Used for values that have to leave the service but must stay opaque and
//! tamper-proof, e.g. a provider user id handed to a client during sign-up.
//! The sealed form is standard base64 of `nonce || ciphertext || tag` (AES-256-GCM,
//! 96-bit random nonce).

use aes_gcm::aead::Aead;
use aes_gcm::aead::AeadCore;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::OsRng;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CipherError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM sealing with a hex-encoded 32-byte key
#[derive(Clone)]
pub struct PayloadCipher {
    cipher: Aes256Gcm,
}

impl PayloadCipher {
    /// # Errors
    /// Returns `CipherError::InvalidKey` if `hex_key` is not 64 hex characters
    pub fn from_hex(hex_key: &str) -> Result<Self, CipherError> {
        let key = hex::decode(hex_key.trim())
            .map_err(|error| CipherError::InvalidKey(error.to_string()))?;
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| {
            CipherError::InvalidKey(format!("expected 32 bytes, got {}", key.len()))
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` under a fresh random nonce
    ///
    /// # Errors
    /// Returns `CipherError::Seal` if encryption fails
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(sealed))
    }

    /// Decrypt a value produced by [`seal`](PayloadCipher::seal)
    ///
    /// # Errors
    /// - `CipherError::Encoding` if `sealed` is not base64 or too short
    /// - `CipherError::Open` if it was tampered with or sealed under another key
    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, CipherError> {
        let raw = STANDARD
            .decode(sealed.trim())
            .map_err(|error| CipherError::Encoding(error.to_string()))?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Encoding("sealed payload is too short".to_string()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Open)
    }
}

impl std::fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadCipher").finish_non_exhaustive()
    }
}
