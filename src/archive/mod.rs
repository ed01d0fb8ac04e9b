//! The archive format: manifest, named members, and the encrypt/decrypt
//! pipelines that produce and consume them.

mod decryptor;
mod encryptor;
mod manifest;
mod members;
mod path;

pub use decryptor::{decrypt, DecryptOutcome, DecryptedFile, Decryptor, EntryIssue};
pub use encryptor::{encrypt, Encryptor};
pub use manifest::{Manifest, ManifestEntry};
pub use members::{ArchiveMembers, EncryptedArchive, EncryptedMember, SourceFile};
pub use path::ArchivePath;
