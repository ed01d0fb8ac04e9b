//! vaultpack
//!
//! Password-protected encrypted archives: a set of files is encrypted into a
//! set of named members that can only be turned back into the original files
//! with the same password.
//!
//! # Features
//!
//! - **PBKDF2-HMAC-SHA256**: 100,000 iterations, fresh 16-byte salt per archive
//! - **AES-256-GCM**: every file and the manifest under its own random nonce
//! - **Encrypted Manifest**: maps member names back to original paths
//! - **Partial Recovery**: a missing or tampered file never blocks the rest
//!
//! # Archive Layout
//!
//! ```text
//! salt.bin             16-byte salt
//! manifest.json.enc    nonce || AES-GCM(manifest JSON)
//! <path>.enc           AES-GCM(file contents), nonce kept in the manifest
//! ```
//!
//! # Example
//!
//! ```rust
//! use vaultpack::archive::{decrypt, encrypt, SourceFile};
//!
//! let archive = encrypt(&[SourceFile::new("a.txt", "hello")], "pw").unwrap();
//! let members = archive.into_archive_members();
//!
//! let salt = members.salt.as_deref().unwrap();
//! let manifest = members.manifest.as_deref().unwrap();
//! let outcome = decrypt(salt, manifest, &members.files, "pw").unwrap();
//!
//! assert_eq!(outcome.files[0].original_name, "a.txt");
//! assert_eq!(outcome.files[0].data, b"hello");
//! ```

pub mod archive;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use archive::{decrypt, encrypt, Decryptor, Encryptor};
pub use config::ArchiveConfig;
pub use error::{Error, Result};
