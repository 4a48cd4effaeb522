//! Shared helpers for the integration tests.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

/// Read a fixture normalizing Windows line endings.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut content = fs::read_to_string(path)?;
    if cfg!(target_os = "windows") {
        content = content.replace("\r\n", "\n");
    }
    Ok(content)
}

/// Temporary host installation laid out on disc.
pub struct HostTree {
    dir: TempDir,
}

impl HostTree {
    /// Create an empty host root.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Create an empty host root inside `parent`.
    ///
    /// The root path is relative when `parent` is.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir_in(parent)?,
        })
    }

    /// Create a host root with a component configuration file.
    pub fn with_components(json: &str) -> Result<Self> {
        let tree = Self::new()?;
        tree.write("lib/components.json", json)?;
        Ok(tree)
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path for a root-relative path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a file creating parent directories as needed.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Read a root-relative file.
    pub fn read(&self, relative: &str) -> Result<String> {
        read_to_string(self.path(relative))
    }
}
