//! Secure random bytes for salts and nonces.

use crate::config::NONCE_LENGTH;
use rand::rngs::OsRng;
use rand::RngCore;

/// Fill `dest` from the operating system CSPRNG.
///
/// Panics only if the OS random source is unavailable, which `getrandom`
/// treats as unrecoverable.
pub fn fill_random(dest: &mut [u8]) {
    OsRng.fill_bytes(dest);
}

/// Draw a fresh AES-GCM nonce.
pub fn random_nonce() -> [u8; NONCE_LENGTH] {
    let mut nonce = [0u8; NONCE_LENGTH];
    fill_random(&mut nonce);
    nonce
}
