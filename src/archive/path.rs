//! Relative archive paths.

use crate::config::ENCRYPTED_SUFFIX;
use crate::error::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A validated relative path inside an archive.
///
/// Components are separated by `/` and never include `.`, `..`, or empty
/// names, so joining the path onto a directory cannot escape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchivePath {
    components: Vec<String>,
}

impl ArchivePath {
    /// Parse a forward-slash separated relative path.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvalidPath("Path must not be empty".to_string()));
        }
        if path.starts_with('/') {
            return Err(Error::InvalidPath(format!(
                "Path must be relative: {}",
                path
            )));
        }

        let components: Vec<String> = path.split('/').map(|s| s.to_string()).collect();

        for component in &components {
            if component.is_empty()
                || component == "."
                || component == ".."
                || component.contains('\0')
                || component.contains('\\')
            {
                return Err(Error::InvalidPath(format!(
                    "Invalid path component {:?} in {}",
                    component, path
                )));
            }
        }

        Ok(Self { components })
    }

    /// Build an archive path from a relative file system path.
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut components = Vec::new();

        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::InvalidPath(format!("Path is not valid UTF-8: {}", path.display()))
                    })?;
                    components.push(name.to_string());
                }
                _ => {
                    return Err(Error::InvalidPath(format!(
                        "Path must be relative and normalized: {}",
                        path.display()
                    )))
                }
            }
        }

        Self::parse(&components.join("/"))
    }

    /// Get path components.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Get the final component.
    pub fn name(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or_default()
    }

    /// Name of the archive member holding this file's ciphertext.
    pub fn encrypted_name(&self) -> String {
        format!("{}{}", self, ENCRYPTED_SUFFIX)
    }

    /// Resolve this path under `root`.
    pub fn to_path_under(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for component in &self.components {
            path.push(component);
        }
        path
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}
