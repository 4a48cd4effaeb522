//! Syntactic classification of module source paths.
//!
//! A module source lives at `<component>/amd/src/<file>.js`; nothing here
//! touches the file system.
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Directory marking a module tree.
pub const SOURCE_MARKER: &str = "amd";
/// Directory below the marker holding untransformed sources.
pub const SOURCE_DIR: &str = "src";
/// Directory below the marker receiving the built modules.
pub const BUILD_DIR: &str = "build";
/// Extension of module sources.
pub const SOURCE_EXTENSION: &str = ".js";
/// Extension of built modules.
pub const BUILD_EXTENSION: &str = ".min.js";

/// Path split into segments with the position of the source marker.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ClassifiedPath {
    /// Path segments split at forward slashes.
    pub segments: Vec<String>,
    /// Index of the `amd` segment.
    pub marker: usize,
}

impl ClassifiedPath {
    /// Segments before the marker joined with `/`.
    pub fn component_path(&self) -> String {
        self.segments[..self.marker].join("/")
    }

    /// Segments below `amd/src` joined with `/`, extension stripped.
    pub fn file_path(&self) -> String {
        let mut parts: Vec<&str> = self.segments[self.marker + 2..]
            .iter()
            .map(|s| s.as_str())
            .collect();
        if let Some(last) = parts.last_mut() {
            let name: &str = *last;
            *last = name.strip_suffix(SOURCE_EXTENSION).unwrap_or(name);
        }
        parts.join("/")
    }

    /// Mirror of this path below `amd/build` with the minified extension.
    pub fn build_path(&self) -> String {
        let mut segments = self.segments.clone();
        segments[self.marker + 1] = BUILD_DIR.to_string();
        if let Some(last) = segments.last_mut() {
            let stem = last
                .strip_suffix(SOURCE_EXTENSION)
                .unwrap_or(last.as_str())
                .to_string();
            *last = format!("{}{}", stem, BUILD_EXTENSION);
        }
        segments.join("/")
    }
}

/// Convert backslashes to forward slashes.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Validate the shape of a module source path.
pub fn classify(path: &str) -> Result<ClassifiedPath> {
    let normalized = normalize(path);
    if !normalized.ends_with(SOURCE_EXTENSION) {
        return Err(Error::path_format(
            path,
            format!("expected a {} file", SOURCE_EXTENSION),
        ));
    }

    let segments: Vec<String> =
        normalized.split('/').map(|s| s.to_string()).collect();

    let marker = segments
        .iter()
        .position(|s| s == SOURCE_MARKER)
        .ok_or_else(|| {
            Error::path_format(path, format!("no {} directory", SOURCE_MARKER))
        })?;

    // The marker must be followed by the source directory.
    let marker = (marker..segments.len())
        .find(|i| {
            segments[*i] == SOURCE_MARKER
                && segments.get(i + 1).map(|s| s.as_str()) == Some(SOURCE_DIR)
        })
        .ok_or_else(|| {
            Error::path_format(
                path,
                format!("{} is not followed by {}", SOURCE_MARKER, SOURCE_DIR),
            )
        })?;

    let rest = &segments[marker + 2..];
    if rest.is_empty() || rest.iter().any(|s| s.is_empty()) {
        return Err(Error::path_format(path, "empty file segment"));
    }
    if rest[rest.len() - 1] == SOURCE_EXTENSION {
        return Err(Error::path_format(path, "empty file name"));
    }

    Ok(ClassifiedPath { segments, marker })
}

/// Express `file` relative to `root`.
///
/// Relative paths are taken to be root-relative already; absolute paths
/// must live below the root.
pub fn relative_to_root(file: &Path, root: &Path) -> Result<String> {
    let file_str = normalize(&file.to_string_lossy());
    if file.is_relative() {
        return Ok(file_str.trim_start_matches("./").to_string());
    }
    let root_str = normalize(&root.to_string_lossy());
    let root_str = root_str.trim_end_matches('/');
    match file_str.strip_prefix(root_str) {
        Some(rest) if rest.starts_with('/') => {
            Ok(rest.trim_start_matches('/').to_string())
        }
        _ => Err(Error::path_format(
            file_str.as_str(),
            format!("not below source root {}", root_str),
        )),
    }
}

/// Output location for a module source path.
pub fn build_path(file: &Path) -> Result<PathBuf> {
    let classified = classify(&file.to_string_lossy())?;
    Ok(PathBuf::from(classified.build_path()))
}
