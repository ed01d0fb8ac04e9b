//! Configuration constants and types for vaultpack archives.

use serde::{Deserialize, Serialize};

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// AES-GCM nonce (IV) length in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// Derived key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Archive member holding the raw salt.
pub const SALT_MEMBER: &str = "salt.bin";

/// Archive member holding the encrypted manifest.
pub const MANIFEST_MEMBER: &str = "manifest.json.enc";

/// Suffix appended to an original path to name its encrypted member.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Largest plaintext AES-GCM accepts under one nonce (2^39 - 256 bits).
pub const MAX_PLAINTEXT_LENGTH: u64 = (1 << 36) - 32;

/// PBKDF2 parameters for key derivation.
///
/// These are part of the archive format and are not configurable.
pub mod pbkdf2_params {
    /// Number of HMAC-SHA256 iterations.
    pub const ITERATIONS: u32 = 100_000;

    /// Output length in bytes (256 bits).
    pub const OUTPUT_LENGTH: usize = super::KEY_LENGTH;
}

/// Runtime options for building and opening archives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Run per-file encryption and decryption on the rayon thread pool.
    pub parallel: bool,

    /// Include dot-files and dot-directories when collecting input files.
    pub include_hidden: bool,

    /// Follow symbolic links when collecting input files.
    pub follow_links: bool,

    /// Skip input files larger than this many bytes.
    pub max_file_size: Option<u64>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            include_hidden: false,
            follow_links: false,
            max_file_size: None,
        }
    }
}

impl ArchiveConfig {
    /// Configuration that processes every file on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.max_file_size {
            Some(0) => Err("Maximum file size must be greater than 0".to_string()),
            Some(size) if size > MAX_PLAINTEXT_LENGTH => Err(format!(
                "Maximum file size must not exceed {} bytes",
                MAX_PLAINTEXT_LENGTH
            )),
            _ => Ok(()),
        }
    }
}
