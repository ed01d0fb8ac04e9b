//! Named blobs that make up an archive.

use crate::config::{ENCRYPTED_SUFFIX, MANIFEST_MEMBER, SALT_LENGTH, SALT_MEMBER};
use crate::error::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// A file handed to the encryptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative path, `/` separated.
    pub path: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// One encrypted data member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMember {
    /// Member name, equal to a manifest entry's `encrypted_name`.
    pub name: String,
    /// AES-GCM ciphertext || tag.
    pub data: Vec<u8>,
}

/// Output of one encryption run.
#[derive(Debug, Clone)]
pub struct EncryptedArchive {
    /// Salt the key was derived with.
    pub salt: [u8; SALT_LENGTH],
    /// Manifest nonce || encrypted manifest.
    pub manifest: Vec<u8>,
    /// Encrypted data members in input order.
    pub files: Vec<EncryptedMember>,
}

impl EncryptedArchive {
    /// Total number of members including salt and manifest.
    pub fn member_count(&self) -> usize {
        self.files.len() + 2
    }

    /// Flatten into `(name, bytes)` pairs: salt, manifest, then data members.
    pub fn into_members(self) -> Vec<(String, Vec<u8>)> {
        let mut members = Vec::with_capacity(self.member_count());
        members.push((SALT_MEMBER.to_string(), self.salt.to_vec()));
        members.push((MANIFEST_MEMBER.to_string(), self.manifest));
        members.extend(self.files.into_iter().map(|m| (m.name, m.data)));
        members
    }

    /// Convert into the set of members a decryptor consumes.
    pub fn into_archive_members(self) -> ArchiveMembers {
        ArchiveMembers::from_members(self.into_members())
    }
}

/// Archive members gathered for decryption.
#[derive(Debug, Clone, Default)]
pub struct ArchiveMembers {
    /// Contents of `salt.bin`, if supplied.
    pub salt: Option<Vec<u8>>,
    /// Contents of `manifest.json.enc`, if supplied.
    pub manifest: Option<Vec<u8>>,
    /// Encrypted data members keyed by member name.
    pub files: HashMap<String, Vec<u8>>,
}

impl ArchiveMembers {
    /// Classify named blobs into salt, manifest, and data members.
    ///
    /// Names other than the two reserved members are kept only if they end in
    /// `.enc`; anything else is not part of an archive and is ignored.
    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut result = Self::default();

        for (name, data) in members {
            if name == SALT_MEMBER {
                result.salt = Some(data);
            } else if name == MANIFEST_MEMBER {
                result.manifest = Some(data);
            } else if name.ends_with(ENCRYPTED_SUFFIX) {
                result.files.insert(name, data);
            } else {
                debug!(member = %name, "ignoring non-archive member");
            }
        }

        result
    }

    /// Check that salt, manifest and at least one data member are present.
    ///
    /// Returns borrowed salt and manifest bytes on success.
    pub fn require_complete(&self) -> Result<(&[u8], &[u8])> {
        let mut missing = Vec::new();
        if self.salt.is_none() {
            missing.push(SALT_MEMBER);
        }
        if self.manifest.is_none() {
            missing.push(MANIFEST_MEMBER);
        }
        if self.files.is_empty() {
            missing.push("at least one .enc data file");
        }

        match (&self.salt, &self.manifest) {
            (Some(salt), Some(manifest)) if missing.is_empty() => {
                Ok((salt.as_slice(), manifest.as_slice()))
            }
            _ => Err(Error::InputIncomplete(format!("missing {}", missing.join(", ")))),
        }
    }
}
