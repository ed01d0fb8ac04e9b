//! Cryptographic operations for vaultpack.
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA256 password-based key derivation
//! - OS-backed random salts and nonces

mod cipher;
mod kdf;
pub mod rng;

pub use cipher::Cipher;
pub use kdf::{derive, DerivedKey, KeyDerivation};
