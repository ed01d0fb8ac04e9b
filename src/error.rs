//! Error types for vaultpack.

use thiserror::Error;

/// Result type alias for vaultpack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an encrypt or decrypt operation.
///
/// Problems scoped to a single archive entry are not errors; they are
/// collected as [`EntryIssue`](crate::archive::EntryIssue)s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required archive member is missing.
    #[error("Incomplete input: {0}")]
    InputIncomplete(String),

    /// Key derivation error.
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Manifest decryption failed (wrong password or corrupted data).
    #[error("Decryption failed: wrong password or corrupted data")]
    Decryption,

    /// The manifest decrypted but is not a valid manifest document.
    #[error("Malformed manifest: {0}")]
    ManifestFormat(String),

    /// Path is unsafe or appears twice in one archive.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
