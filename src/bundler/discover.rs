//! Find module sources below a host root.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;
use indexmap::IndexSet;
use walkdir::{DirEntry, WalkDir};

use crate::naming::components::COMPONENTS_FILE;
use crate::naming::{classify, path::normalize};

/// Globs ignored unless configured otherwise.
pub const DEFAULT_IGNORE: &[&str] = &["**/node_modules/**", "**/.git/**"];

/// Compile ignore globs.
pub fn compile_ignore<S: AsRef<str>>(globs: &[S]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| {
            Pattern::new(g.as_ref())
                .with_context(|| format!("Invalid ignore glob {}", g.as_ref()))
        })
        .collect()
}

/// Resolve `path` against `cwd` unless it is already absolute.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path.strip_prefix(".").unwrap_or(path))
    }
}

/// Walk `start` and its ancestors looking for the host root.
pub fn find_root<P: AsRef<Path>>(start: P) -> Option<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .find(|dir| dir.join(COMPONENTS_FILE).is_file())
        .map(|dir| dir.to_path_buf())
}

/// Collect the module sources to build.
///
/// With no inputs the whole root is searched. Directory inputs are
/// searched and file inputs are taken as given, even when they are not
/// shaped like module sources, so they are reported rather than dropped.
pub fn discover(
    root: &Path,
    inputs: &[PathBuf],
    ignore: &[Pattern],
) -> Result<Vec<PathBuf>> {
    let mut found: IndexSet<PathBuf> = IndexSet::new();

    if inputs.is_empty() {
        walk(root, root, ignore, &mut found)?;
    }
    for input in inputs {
        if input.is_dir() {
            walk(input, root, ignore, &mut found)?;
        } else {
            found.insert(input.clone());
        }
    }

    let mut files: Vec<PathBuf> = found.into_iter().collect();
    files.sort();
    log::debug!("Discovered {} module source(s)", files.len());
    Ok(files)
}

fn walk(
    dir: &Path,
    root: &Path,
    ignore: &[Pattern],
    found: &mut IndexSet<PathBuf>,
) -> Result<()> {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));
    for entry in walker {
        let entry = entry
            .with_context(|| format!("Failed to read {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative = normalize(&relative.to_string_lossy());
        if classify(&relative).is_err() {
            continue;
        }
        if ignore.iter().any(|p| p.matches(&relative)) {
            log::debug!("Ignoring {}", relative);
            continue;
        }
        found.insert(path.to_path_buf());
    }
    Ok(())
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}
