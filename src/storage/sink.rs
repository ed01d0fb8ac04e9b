//! Writing recovered files to disk.

use crate::archive::{ArchivePath, DecryptedFile};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write recovered files under `out_dir`, recreating their directories.
///
/// Every `original_name` is re-validated so no file lands outside
/// `out_dir`. Existing files are overwritten.
pub fn write_files(out_dir: &Path, files: &[DecryptedFile]) -> Result<Vec<PathBuf>> {
    // Validate everything before touching the disk.
    let targets = files
        .iter()
        .map(|f| ArchivePath::parse(&f.original_name).map(|p| p.to_path_under(out_dir)))
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(out_dir)?;

    for (file, target) in files.iter().zip(&targets) {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, &file.data)?;
        debug!(path = %target.display(), size = file.data.len(), "wrote file");
    }

    Ok(targets)
}
