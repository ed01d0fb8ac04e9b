//! Recovering plaintext files from archive members.

use crate::archive::manifest::{Manifest, ManifestEntry};
use crate::archive::members::ArchiveMembers;
use crate::config::{ArchiveConfig, MANIFEST_MEMBER, NONCE_LENGTH, TAG_LENGTH};
use crate::crypto::{Cipher, KeyDerivation};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A recovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFile {
    /// Relative path recorded in the manifest.
    pub original_name: String,
    /// Plaintext contents.
    pub data: Vec<u8>,
}

/// A manifest entry that could not be recovered.
///
/// Issues never abort a run; the remaining entries are still processed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryIssue {
    /// No member named `encrypted_name` was supplied.
    #[error("{original_name}: member {encrypted_name} not found")]
    Unresolved {
        original_name: String,
        encrypted_name: String,
    },

    /// The member failed authentication.
    #[error("{original_name}: member {encrypted_name} failed authentication")]
    DecryptionFailed {
        original_name: String,
        encrypted_name: String,
    },
}

impl EntryIssue {
    /// Original path of the affected entry.
    pub fn original_name(&self) -> &str {
        match self {
            EntryIssue::Unresolved { original_name, .. }
            | EntryIssue::DecryptionFailed { original_name, .. } => original_name,
        }
    }
}

/// Result of decrypting an archive.
#[derive(Debug, Clone, Default)]
pub struct DecryptOutcome {
    /// Recovered files in manifest order.
    pub files: Vec<DecryptedFile>,
    /// Entries that were skipped, in manifest order.
    pub issues: Vec<EntryIssue>,
    /// Supplied data members no manifest entry refers to, sorted.
    pub unreferenced: Vec<String>,
}

impl DecryptOutcome {
    /// Whether every manifest entry was recovered.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Decrypts archive members back into files.
#[derive(Debug, Clone, Default)]
pub struct Decryptor {
    config: ArchiveConfig,
}

impl Decryptor {
    /// Create a decryptor with the given configuration.
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Decrypt and parse the manifest only.
    pub fn read_manifest(&self, salt: &[u8], encrypted_manifest: &[u8], password: &str) -> Result<Manifest> {
        let (manifest, _) = open_manifest(salt, encrypted_manifest, password)?;
        Ok(manifest)
    }

    /// Decrypt every manifest entry found in `files`.
    ///
    /// Fails as a whole only if the manifest cannot be authenticated or
    /// parsed. Missing or tampered data members are reported per entry.
    pub fn decrypt(
        &self,
        salt: &[u8],
        encrypted_manifest: &[u8],
        files: &HashMap<String, Vec<u8>>,
        password: &str,
    ) -> Result<DecryptOutcome> {
        let (manifest, cipher) = open_manifest(salt, encrypted_manifest, password)?;

        let open_entry = |entry: &ManifestEntry| -> std::result::Result<DecryptedFile, EntryIssue> {
            let Some(blob) = files.get(&entry.encrypted_name) else {
                warn!(member = %entry.encrypted_name, "encrypted member not found, skipping");
                return Err(EntryIssue::Unresolved {
                    original_name: entry.original_name.clone(),
                    encrypted_name: entry.encrypted_name.clone(),
                });
            };

            match cipher.decrypt_with_nonce(&entry.iv, blob) {
                Ok(data) => {
                    debug!(file = %entry.original_name, size = data.len(), "decrypted file");
                    Ok(DecryptedFile {
                        original_name: entry.original_name.clone(),
                        data,
                    })
                }
                Err(_) => {
                    warn!(member = %entry.encrypted_name, "authentication failed, skipping");
                    Err(EntryIssue::DecryptionFailed {
                        original_name: entry.original_name.clone(),
                        encrypted_name: entry.encrypted_name.clone(),
                    })
                }
            }
        };

        let results: Vec<_> = if self.config.parallel {
            manifest.files.par_iter().map(open_entry).collect()
        } else {
            manifest.files.iter().map(open_entry).collect()
        };

        let mut outcome = DecryptOutcome::default();
        for result in results {
            match result {
                Ok(file) => outcome.files.push(file),
                Err(issue) => outcome.issues.push(issue),
            }
        }

        let referenced: HashSet<&str> = manifest
            .files
            .iter()
            .map(|e| e.encrypted_name.as_str())
            .collect();
        outcome.unreferenced = files
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect();
        outcome.unreferenced.sort();

        info!(
            recovered = outcome.files.len(),
            skipped = outcome.issues.len(),
            unreferenced = outcome.unreferenced.len(),
            "decrypted archive"
        );

        Ok(outcome)
    }

    /// Decrypt a classified member set.
    ///
    /// Refuses to start unless salt, manifest and at least one data member
    /// are present.
    pub fn decrypt_members(&self, members: &ArchiveMembers, password: &str) -> Result<DecryptOutcome> {
        let (salt, manifest) = members.require_complete()?;
        self.decrypt(salt, manifest, &members.files, password)
    }
}

/// Decrypt with the default configuration.
pub fn decrypt(
    salt: &[u8],
    encrypted_manifest: &[u8],
    files: &HashMap<String, Vec<u8>>,
    password: &str,
) -> Result<DecryptOutcome> {
    Decryptor::default().decrypt(salt, encrypted_manifest, files, password)
}

/// Derive the key and authenticate the manifest.
///
/// A salt or manifest of impossible length is treated like any other
/// corruption of a present member.
fn open_manifest(salt: &[u8], encrypted_manifest: &[u8], password: &str) -> Result<(Manifest, Cipher)> {
    let kdf = KeyDerivation::from_salt_slice(salt).map_err(|e| {
        warn!(error = %e, "unusable salt");
        Error::Decryption
    })?;
    if encrypted_manifest.len() < NONCE_LENGTH + TAG_LENGTH {
        warn!(
            size = encrypted_manifest.len(),
            minimum = NONCE_LENGTH + TAG_LENGTH,
            "{} too short",
            MANIFEST_MEMBER
        );
        return Err(Error::Decryption);
    }

    let key = kdf.derive_key(password)?;
    let cipher = Cipher::new(&key);

    let plaintext = cipher.open(encrypted_manifest)?;
    let manifest = Manifest::from_bytes(&plaintext)?;
    debug!(entries = manifest.len(), "manifest authenticated");

    Ok((manifest, cipher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::encryptor::encrypt;
    use crate::archive::members::SourceFile;

    fn members_map(archive: &crate::archive::EncryptedArchive) -> HashMap<String, Vec<u8>> {
        archive
            .files
            .iter()
            .map(|m| (m.name.clone(), m.data.clone()))
            .collect()
    }

    #[test]
    fn test_hello_roundtrip() {
        let archive = encrypt(&[SourceFile::new("a.txt", "hello")], "pw").unwrap();

        let outcome = decrypt(&archive.salt, &archive.manifest, &members_map(&archive), "pw").unwrap();

        assert!(outcome.is_complete());
        assert_eq!(
            outcome.files,
            vec![DecryptedFile {
                original_name: "a.txt".to_string(),
                data: b"hello".to_vec(),
            }]
        );
    }

    #[test]
    fn test_wrong_password_fails_at_manifest() {
        let archive = encrypt(&[SourceFile::new("a.txt", "hello")], "pw").unwrap();

        let result = decrypt(&archive.salt, &archive.manifest, &members_map(&archive), "wrong");
        assert!(matches!(result, Err(Error::Decryption)));
    }

    #[test]
    fn test_read_manifest() {
        let files = [SourceFile::new("x/1.txt", "one"), SourceFile::new("x/2.txt", "two")];
        let archive = encrypt(&files, "pw").unwrap();

        let manifest = Decryptor::default()
            .read_manifest(&archive.salt, &archive.manifest, "pw")
            .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.files[0].original_name, "x/1.txt");
        assert_eq!(manifest.files[1].encrypted_name, "x/2.txt.enc");
    }

    #[test]
    fn test_truncated_salt_or_manifest_fails_decryption() {
        let archive = encrypt(&[SourceFile::new("a.txt", "hello")], "pw").unwrap();
        let blobs = members_map(&archive);

        assert!(matches!(
            decrypt(&archive.salt[..8], &archive.manifest, &blobs, "pw"),
            Err(Error::Decryption)
        ));
        assert!(matches!(
            decrypt(&archive.salt, &archive.manifest[..20], &blobs, "pw"),
            Err(Error::Decryption)
        ));
        assert!(matches!(
            decrypt(&archive.salt, &archive.manifest[..NONCE_LENGTH + TAG_LENGTH - 1], &blobs, "pw"),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_iv_bound_to_entry_not_position() {
        let files = [SourceFile::new("a.txt", "alpha"), SourceFile::new("b.txt", "bravo")];
        let archive = encrypt(&files, "pw").unwrap();

        // Swap the blobs between the two names: each now fails under the
        // other entry's nonce instead of decrypting to the wrong file.
        let mut blobs = members_map(&archive);
        let a = blobs.remove("a.txt.enc").unwrap();
        let b = blobs.remove("b.txt.enc").unwrap();
        blobs.insert("a.txt.enc".to_string(), b);
        blobs.insert("b.txt.enc".to_string(), a);

        let outcome = decrypt(&archive.salt, &archive.manifest, &blobs, "pw").unwrap();
        assert!(outcome.files.is_empty());
        assert_eq!(outcome.issues.len(), 2);
        assert!(matches!(outcome.issues[0], EntryIssue::DecryptionFailed { .. }));
    }

    #[test]
    fn test_unreferenced_members_reported() {
        let archive = encrypt(&[SourceFile::new("a.txt", "hello")], "pw").unwrap();
        let mut blobs = members_map(&archive);
        blobs.insert("stray.enc".to_string(), vec![1, 2, 3]);

        let outcome = decrypt(&archive.salt, &archive.manifest, &blobs, "pw").unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert_eq!(outcome.unreferenced, vec!["stray.enc".to_string()]);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let files: Vec<SourceFile> = (0..8)
            .map(|i| SourceFile::new(format!("f{}.bin", i), vec![i as u8; 100 * i]))
            .collect();
        let archive = encrypt(&files, "pw").unwrap();
        let blobs = members_map(&archive);

        let parallel = Decryptor::default()
            .decrypt(&archive.salt, &archive.manifest, &blobs, "pw")
            .unwrap();
        let sequential = Decryptor::new(ArchiveConfig::sequential())
            .decrypt(&archive.salt, &archive.manifest, &blobs, "pw")
            .unwrap();

        assert_eq!(parallel.files, sequential.files);
        assert_eq!(parallel.files.len(), 8);
    }
}
