//! PBKDF2-HMAC-SHA256 key derivation for password-based encryption.

use crate::config::{pbkdf2_params, KEY_LENGTH, SALT_LENGTH};
use crate::crypto::rng::fill_random;
use crate::error::{Error, Result};
use hmac::Hmac;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroize;

/// A 256-bit AES-GCM key derived from a password.
///
/// Zeroized on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    bytes: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a key from a password and salt.
///
/// Deterministic for a given `(password, salt)` pair. The iteration count and
/// hash are fixed by the archive format. Empty passwords are accepted.
pub fn derive(password: &[u8], salt: &[u8; SALT_LENGTH]) -> Result<DerivedKey> {
    let mut bytes = [0u8; pbkdf2_params::OUTPUT_LENGTH];
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, pbkdf2_params::ITERATIONS, &mut bytes)
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey { bytes })
}

/// Key derivation bound to one salt.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: [u8; SALT_LENGTH],
}

impl KeyDerivation {
    /// Create a KDF with a fresh random salt (for encryption).
    pub fn new() -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        fill_random(&mut salt);
        Self { salt }
    }

    /// Create a KDF from a stored salt (for decryption).
    pub fn from_salt(salt: [u8; SALT_LENGTH]) -> Self {
        Self { salt }
    }

    /// Create a KDF from a salt member of unchecked length.
    pub fn from_salt_slice(salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LENGTH] = salt.try_into().map_err(|_| {
            Error::InputIncomplete(format!(
                "salt must be {} bytes, found {}",
                SALT_LENGTH,
                salt.len()
            ))
        })?;
        Ok(Self { salt })
    }

    /// Get the salt for storage.
    pub fn salt(&self) -> &[u8; SALT_LENGTH] {
        &self.salt
    }

    /// Derive the 256-bit key for `password`.
    pub fn derive_key(&self, password: &str) -> Result<DerivedKey> {
        derive(password.as_bytes(), &self.salt)
    }
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self::new()
    }
}
