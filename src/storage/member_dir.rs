//! Storing archive members as files in a directory.
//!
//! Each member becomes one file named after the member, so an archive
//! directory looks like:
//!
//! ```text
//! out/
//! ├── salt.bin
//! ├── manifest.json.enc
//! ├── a.txt.enc
//! └── docs/report.pdf.enc
//! ```

use crate::archive::{ArchiveMembers, ArchivePath, EncryptedArchive};
use crate::config::{ENCRYPTED_SUFFIX, MANIFEST_MEMBER, SALT_MEMBER};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Write every member of `archive` under `dir`, creating it if needed.
///
/// Returns the paths written, salt and manifest first.
pub fn write_members(dir: &Path, archive: EncryptedArchive) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let members = archive.into_members();
    let mut written = Vec::with_capacity(members.len());

    for (name, data) in members {
        let path = ArchivePath::parse(&name)?.to_path_under(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &data)?;
        debug!(member = %name, size = data.len(), "wrote member");
        written.push(path);
    }

    info!(members = written.len(), dir = %dir.display(), "archive written");
    Ok(written)
}

/// Load every member stored under `dir`.
///
/// Member names are the `/` separated paths relative to `dir`. Files that
/// are not archive members are ignored.
pub fn read_members(dir: &Path) -> Result<ArchiveMembers> {
    if !dir.is_dir() {
        return Err(Error::InputIncomplete(format!(
            "Archive directory not found: {}",
            dir.display()
        )));
    }

    let mut members = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;
        let name = match ArchivePath::from_relative(relative) {
            Ok(path) => path.to_string(),
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "skipping member with unusable name");
                continue;
            }
        };

        match std::fs::read(entry.path()) {
            Ok(data) => members.push((name, data)),
            Err(e) => warn!(member = %name, error = %e, "skipping unreadable member"),
        }
    }

    let members = ArchiveMembers::from_members(members);
    debug!(
        data_members = members.files.len(),
        has_salt = members.salt.is_some(),
        has_manifest = members.manifest.is_some(),
        "loaded archive members"
    );
    Ok(members)
}

/// Delete every archive member stored under `dir`.
///
/// Only `salt.bin`, `manifest.json.enc` and `*.enc` files are touched; other
/// files and the directories themselves are left in place. Returns the
/// number of members removed. A missing `dir` holds no members.
pub fn remove_members(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let is_member = (entry.depth() == 1 && (name == SALT_MEMBER || name == MANIFEST_MEMBER))
            || name.ends_with(ENCRYPTED_SUFFIX);
        if is_member {
            std::fs::remove_file(entry.path())?;
            debug!(path = %entry.path().display(), "removed stale member");
            removed += 1;
        }
    }

    if removed > 0 {
        info!(members = removed, dir = %dir.display(), "removed previous archive");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::EncryptedMember;
    use tempfile::TempDir;

    fn sample_archive() -> EncryptedArchive {
        EncryptedArchive {
            salt: [5u8; 16],
            manifest: vec![9; 40],
            files: vec![
                EncryptedMember {
                    name: "a.txt.enc".to_string(),
                    data: vec![1; 20],
                },
                EncryptedMember {
                    name: "docs/b.txt.enc".to_string(),
                    data: vec![2; 30],
                },
            ],
        }
    }

    #[test]
    fn test_write_layout() {
        let dir = TempDir::new().unwrap();

        let written = write_members(dir.path(), sample_archive()).unwrap();

        assert_eq!(written.len(), 4);
        assert_eq!(written[0], dir.path().join("salt.bin"));
        assert_eq!(std::fs::read(dir.path().join("salt.bin")).unwrap(), vec![5u8; 16]);
        assert!(dir.path().join("manifest.json.enc").is_file());
        assert!(dir.path().join("docs").join("b.txt.enc").is_file());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        write_members(dir.path(), sample_archive()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a member").unwrap();

        let members = read_members(dir.path()).unwrap();

        assert_eq!(members.salt, Some(vec![5u8; 16]));
        assert_eq!(members.manifest, Some(vec![9u8; 40]));
        assert_eq!(members.files.len(), 2);
        assert_eq!(members.files["docs/b.txt.enc"], vec![2u8; 30]);
    }

    #[test]
    fn test_remove_members_keeps_other_files() {
        let dir = TempDir::new().unwrap();
        write_members(dir.path(), sample_archive()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        let removed = remove_members(dir.path()).unwrap();

        assert_eq!(removed, 4);
        assert!(dir.path().join("notes.txt").is_file());
        assert!(dir.path().join("docs").is_dir());
        assert!(!dir.path().join("docs").join("b.txt.enc").exists());
        assert_eq!(remove_members(&dir.path().join("absent")).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_member_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write_members(dir.path(), sample_archive()).unwrap();
        let locked = dir.path().join("a.txt.enc");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        if std::fs::read(&locked).is_ok() {
            // Permission bits are not enforced for this user.
            return;
        }

        let members = read_members(dir.path()).unwrap();

        assert!(members.salt.is_some());
        assert!(!members.files.contains_key("a.txt.enc"));
        assert!(members.files.contains_key("docs/b.txt.enc"));
    }

    #[test]
    fn test_read_missing_dir() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            read_members(&dir.path().join("absent")),
            Err(Error::InputIncomplete(_))
        ));
    }
}
