//! AES-256-GCM authenticated encryption.

use crate::config::{NONCE_LENGTH, TAG_LENGTH};
use crate::crypto::kdf::DerivedKey;
use crate::crypto::rng::random_nonce;
use crate::error::{Error, Result};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};

/// AES-256-GCM cipher wrapper.
///
/// No associated data is bound; the nonce is always supplied by the caller
/// or drawn fresh from the OS random source.
pub struct Cipher {
    cipher: Aes256Gcm,
}

impl Cipher {
    /// Create a new cipher from a derived key.
    pub fn new(key: &DerivedKey) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypt under an explicit nonce.
    ///
    /// Returns: ciphertext || tag (16 bytes)
    pub fn encrypt_with_nonce(&self, nonce: &[u8; NONCE_LENGTH], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| Error::Encryption(e.to_string()))
    }

    /// Decrypt ciphertext || tag produced under `nonce`.
    pub fn decrypt_with_nonce(&self, nonce: &[u8; NONCE_LENGTH], ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < TAG_LENGTH {
            return Err(Error::Decryption);
        }

        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Decryption)
    }

    /// Encrypt data with a random nonce.
    ///
    /// Returns: nonce (12 bytes) || ciphertext || tag (16 bytes)
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = random_nonce();
        let ciphertext = self.encrypt_with_nonce(&nonce, plaintext)?;

        let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Decrypt data that was encrypted with `seal`.
    ///
    /// Expects: nonce (12 bytes) || ciphertext || tag (16 bytes)
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(Error::Decryption);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
        let nonce: [u8; NONCE_LENGTH] = nonce_bytes.try_into().map_err(|_| Error::Decryption)?;

        self.decrypt_with_nonce(&nonce, ciphertext)
    }
}
