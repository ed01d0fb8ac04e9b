//! Collecting plaintext input files from disk.

use crate::archive::{ArchivePath, SourceFile};
use crate::config::ArchiveConfig;
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Collect every regular file under `root` as a [`SourceFile`].
///
/// Paths are relative to `root` and `/` separated; entries are visited in
/// file name order so repeated runs produce the same manifest order. If
/// `root` is itself a file, it is returned under its own file name.
///
/// Files that cannot be read, or that exceed `config.max_file_size`, are
/// logged and left out.
pub fn collect_files(root: &Path, config: &ArchiveConfig) -> Result<Vec<SourceFile>> {
    config.validate().map_err(Error::InvalidConfig)?;

    if !root.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Input not found: {}", root.display()),
        )));
    }

    if root.is_file() {
        let name = root
            .file_name()
            .ok_or_else(|| Error::InvalidPath(root.display().to_string()))?;
        let path = ArchivePath::from_relative(Path::new(name))?;
        return Ok(read_source(root, &path, config).into_iter().collect());
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(config.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || config.include_hidden || !is_hidden(e));

    for entry in walker {
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
            .strip_prefix(root)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;
        let path = match ArchivePath::from_relative(relative) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %relative.display(), error = %e, "skipping file with unusable name");
                continue;
            }
        };

        files.extend(read_source(entry.path(), &path, config));
    }

    debug!(count = files.len(), root = %root.display(), "collected input files");
    Ok(files)
}

fn read_source(fs_path: &Path, path: &ArchivePath, config: &ArchiveConfig) -> Option<SourceFile> {
    if let Some(limit) = config.max_file_size {
        match std::fs::metadata(fs_path) {
            Ok(meta) if meta.len() > limit => {
                warn!(path = %path, size = meta.len(), limit, "skipping oversized file");
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(path = %path, error = %e, "skipping unreadable file");
                return None;
            }
        }
    }

    match std::fs::read(fs_path) {
        Ok(data) => Some(SourceFile::new(path.to_string(), data)),
        Err(e) => {
            warn!(path = %path, error = %e, "skipping unreadable file");
            None
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs/work")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("b.txt"), b"bee").unwrap();
        fs::write(dir.path().join("a.txt"), b"ay").unwrap();
        fs::write(dir.path().join("docs/work/notes.md"), b"notes").unwrap();
        fs::write(dir.path().join(".hidden"), b"secret").unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref").unwrap();
        dir
    }

    #[test]
    fn test_collect_sorted_relative() {
        let dir = create_tree();

        let files = collect_files(dir.path(), &ArchiveConfig::default()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, ["a.txt", "b.txt", "docs/work/notes.md"]);
        assert_eq!(files[2].data, b"notes");
    }

    #[test]
    fn test_collect_hidden() {
        let dir = create_tree();
        let config = ArchiveConfig {
            include_hidden: true,
            ..ArchiveConfig::default()
        };

        let files = collect_files(dir.path(), &config).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert!(paths.contains(&".hidden"));
        assert!(paths.contains(&".git/HEAD"));
        assert_eq!(paths.len(), 5);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = create_tree();

        let files = collect_files(&dir.path().join("b.txt"), &ArchiveConfig::default()).unwrap();

        assert_eq!(files, vec![SourceFile::new("b.txt", "bee")]);
    }

    #[test]
    fn test_skip_oversized() {
        let dir = create_tree();
        let config = ArchiveConfig {
            max_file_size: Some(3),
            ..ArchiveConfig::default()
        };

        let files = collect_files(dir.path(), &config).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = create_tree();
        let config = ArchiveConfig {
            max_file_size: Some(0),
            ..ArchiveConfig::default()
        };

        assert!(matches!(
            collect_files(dir.path(), &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(collect_files(&dir.path().join("nope"), &ArchiveConfig::default()).is_err());
    }
}
