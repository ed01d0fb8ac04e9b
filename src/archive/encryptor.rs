//! Building encrypted archives from plaintext files.

use crate::archive::manifest::{Manifest, ManifestEntry};
use crate::archive::members::{EncryptedArchive, EncryptedMember, SourceFile};
use crate::archive::path::ArchivePath;
use crate::config::{ArchiveConfig, ENCRYPTED_SUFFIX, MANIFEST_MEMBER, SALT_MEMBER};
use crate::crypto::rng::random_nonce;
use crate::crypto::{Cipher, KeyDerivation};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Encrypts a set of files into archive members.
#[derive(Debug, Clone, Default)]
pub struct Encryptor {
    config: ArchiveConfig,
}

impl Encryptor {
    /// Create an encryptor with the given configuration.
    pub fn new(config: ArchiveConfig) -> Self {
        Self { config }
    }

    /// Encrypt `files` under a key derived from `password`.
    ///
    /// A fresh salt is generated per call and every file, as well as the
    /// manifest, gets its own random nonce. Paths are validated before any
    /// key derivation happens. Manifest entries follow input order.
    pub fn encrypt(&self, files: &[SourceFile], password: &str) -> Result<EncryptedArchive> {
        let plan = plan_members(files)?;

        let kdf = KeyDerivation::new();
        let key = kdf.derive_key(password)?;
        let cipher = Cipher::new(&key);

        let seal_file = |(file, planned): (&SourceFile, &(ArchivePath, String))| -> Result<(ManifestEntry, EncryptedMember)> {
            let (path, member) = planned;
            let iv = random_nonce();
            let data = cipher.encrypt_with_nonce(&iv, &file.data)?;
            debug!(file = %path, member = %member, size = file.data.len(), "encrypted file");

            Ok((
                ManifestEntry::new(path.to_string(), member.clone(), iv),
                EncryptedMember {
                    name: member.clone(),
                    data,
                },
            ))
        };

        let sealed: Vec<(ManifestEntry, EncryptedMember)> = if self.config.parallel {
            files
                .par_iter()
                .zip(&plan)
                .map(seal_file)
                .collect::<Result<_>>()?
        } else {
            files
                .iter()
                .zip(&plan)
                .map(seal_file)
                .collect::<Result<_>>()?
        };

        let (entries, members): (Vec<_>, Vec<_>) = sealed.into_iter().unzip();
        let manifest = Manifest { files: entries };
        let manifest_blob = cipher.seal(&manifest.to_bytes()?)?;

        info!(files = manifest.len(), "encrypted archive");

        Ok(EncryptedArchive {
            salt: *kdf.salt(),
            manifest: manifest_blob,
            files: members,
        })
    }
}

/// Encrypt `files` with the default configuration.
pub fn encrypt(files: &[SourceFile], password: &str) -> Result<EncryptedArchive> {
    Encryptor::default().encrypt(files, password)
}

/// Parse every input path and choose a member name for each file.
///
/// A file is stored as `<path>.enc` unless that is a reserved member name,
/// in which case it gets `<path>.<n>.enc` with the lowest `n` no other file
/// uses. Duplicate paths are rejected.
fn plan_members(files: &[SourceFile]) -> Result<Vec<(ArchivePath, String)>> {
    let mut seen = HashSet::with_capacity(files.len());
    let mut paths = Vec::with_capacity(files.len());

    for file in files {
        let path = ArchivePath::parse(&file.path)?;
        if !seen.insert(path.clone()) {
            return Err(Error::InvalidPath(format!("Duplicate path: {}", file.path)));
        }
        paths.push(path);
    }

    let mut taken: HashSet<String> = paths.iter().map(ArchivePath::encrypted_name).collect();
    taken.insert(SALT_MEMBER.to_string());
    taken.insert(MANIFEST_MEMBER.to_string());

    let plan = paths
        .into_iter()
        .map(|path| {
            let conventional = path.encrypted_name();
            if conventional != SALT_MEMBER && conventional != MANIFEST_MEMBER {
                return (path, conventional);
            }

            let mut n = 1u32;
            let member = loop {
                let candidate = format!("{}.{}{}", path, n, ENCRYPTED_SUFFIX);
                if !taken.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            debug!(file = %path, member = %member, "renamed member to avoid reserved name");
            taken.insert(member.clone());
            (path, member)
        })
        .collect();

    Ok(plan)
}
