//! Resolve the `component/file` identifier for a module source file.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

pub mod components;
pub mod path;

pub use components::{ComponentCache, ComponentMap};
pub use path::{build_path, classify, ClassifiedPath};

/// Identifier embedded in a transformed module, eg: `mod_forum/discussion`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ModuleIdentifier {
    component: String,
    file: String,
}

impl ModuleIdentifier {
    /// Create an identifier from its two halves.
    pub fn new<C: Into<String>, F: Into<String>>(
        component: C,
        file: F,
    ) -> Result<Self> {
        let component = component.into();
        let file = file.into();
        if component.is_empty()
            || file.is_empty()
            || component.contains('/')
            || file.starts_with('/')
        {
            return Err(Error::UnresolvedComponent {
                path: file,
                component,
            });
        }
        Ok(Self { component, file })
    }

    /// The owning component.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// The file name below the source directory without extension.
    pub fn file(&self) -> &str {
        &self.file
    }
}

impl fmt::Display for ModuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.component, self.file)
    }
}

/// Names module files below a source root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    components: Arc<ComponentMap>,
}

impl Resolver {
    /// Create a resolver sharing a loaded component map.
    pub fn new<P: AsRef<Path>>(root: P, components: Arc<ComponentMap>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            components,
        }
    }

    /// The source root files are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the identifier for a module source file.
    pub fn resolve<P: AsRef<Path>>(&self, file: P) -> Result<ModuleIdentifier> {
        resolve(file.as_ref(), &self.root, &self.components)
    }
}

/// Compute the identifier for `file` below `root` using `components`.
pub fn resolve(
    file: &Path,
    root: &Path,
    components: &ComponentMap,
) -> Result<ModuleIdentifier> {
    let relative = path::relative_to_root(file, root)?;
    let classified = classify(&relative)?;
    let component_path = classified.component_path();
    let component = components.resolve(&component_path)?;
    let identifier = ModuleIdentifier::new(component, classified.file_path())?;
    log::debug!("{} -> {}", relative, identifier);
    Ok(identifier)
}
