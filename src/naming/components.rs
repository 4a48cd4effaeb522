//! Registry of logical component names.
//!
//! Component names come from `lib/components.json` below the host root.
//! Subsystem directories match exactly, plugin type roots match by prefix
//! and anything else falls back to a name derived from the path.
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Location of the component configuration relative to the root.
pub const COMPONENTS_FILE: &str = "lib/components.json";

/// Name of the core component.
pub const CORE: &str = "core";

/// Directories that always belong to the core component.
pub const CORE_PATHS: &[&str] = &["lib", "public/lib"];

static FRANKENSTYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9_]*[a-z0-9])?$").unwrap()
});

/// Layout of the component configuration file.
///
/// Subsystems with a `null` directory have no code of their own and
/// are skipped.
#[derive(Deserialize, Default, Debug)]
struct ComponentsFile {
    #[serde(default)]
    subsystems: IndexMap<String, Option<String>>,
    #[serde(default)]
    plugintypes: IndexMap<String, Option<String>>,
}

/// Read-only mapping from directories to component names.
#[derive(Debug, Clone)]
pub struct ComponentMap {
    /// Directory to component name, exact match.
    subsystems: IndexMap<String, String>,
    /// Plugin type root directory and type prefix, longest root first.
    plugin_types: Vec<(String, String)>,
}

impl Default for ComponentMap {
    fn default() -> Self {
        let mut subsystems = IndexMap::new();
        for path in CORE_PATHS {
            subsystems.insert(path.to_string(), CORE.to_string());
        }
        Self {
            subsystems,
            plugin_types: Vec::new(),
        }
    }
}

impl ComponentMap {
    /// Build a map from subsystem and plugin type entries.
    ///
    /// Subsystems are given as `name -> directory` and plugin types as
    /// `type -> root directory`, the same orientation as the
    /// configuration file.
    pub fn new<S, P, K, V>(subsystems: S, plugin_types: P) -> Self
    where
        S: IntoIterator<Item = (K, V)>,
        P: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map: ComponentMap = Default::default();
        for (name, dir) in subsystems {
            map.subsystems.insert(
                normalize_key(dir.as_ref()),
                format!("{}_{}", CORE, name.as_ref()),
            );
        }
        for path in CORE_PATHS {
            map.subsystems.insert(path.to_string(), CORE.to_string());
        }
        for (plugin_type, root) in plugin_types {
            map.plugin_types.push((
                normalize_key(root.as_ref()),
                plugin_type.as_ref().to_string(),
            ));
        }
        // Nested plugin types must win over their parent directory.
        map.plugin_types
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        map
    }

    /// Load the component configuration below `root`.
    ///
    /// A missing file yields a registry holding only the core entries.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::load_file(root.as_ref().join(COMPONENTS_FILE))
    }

    /// Load a component configuration file from an explicit location.
    pub fn load_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let content = match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "No component registry at {}, using path-derived names",
                    file.display()
                );
                return Ok(Default::default());
            }
            Err(e) => {
                return Err(Error::RegistryLoad {
                    path: file.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        Self::parse(&content, file)
    }

    /// Parse the JSON content of a component configuration file.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let parsed: ComponentsFile =
            serde_json::from_str(content).map_err(|e| Error::RegistryLoad {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        let subsystems = parsed
            .subsystems
            .into_iter()
            .filter_map(|(name, dir)| dir.map(|dir| (name, dir)));
        let plugin_types = parsed
            .plugintypes
            .into_iter()
            .filter_map(|(name, dir)| dir.map(|dir| (name, dir)));

        let map = Self::new(subsystems, plugin_types);
        log::debug!(
            "Loaded {} subsystem(s) and {} plugin type(s) from {}",
            map.subsystems.len(),
            map.plugin_types.len(),
            origin.display()
        );
        Ok(map)
    }

    /// Determine whether the map holds nothing beyond the core entries.
    pub fn is_empty(&self) -> bool {
        self.plugin_types.is_empty()
            && self.subsystems.keys().all(|k| CORE_PATHS.contains(&k.as_str()))
    }

    /// Resolve the component owning a directory relative to the root.
    pub fn resolve(&self, component_path: &str) -> Result<String> {
        if let Some(name) = self.subsystems.get(component_path) {
            return Ok(name.clone());
        }

        for (root, plugin_type) in self.plugin_types.iter() {
            let remainder = component_path
                .strip_prefix(root.as_str())
                .and_then(|rest| rest.strip_prefix('/'));
            if let Some(remainder) = remainder {
                if remainder.is_empty() || remainder.contains('/') {
                    return Err(Error::InvalidPluginPath {
                        path: component_path.to_string(),
                        plugin_type: plugin_type.clone(),
                    });
                }
                return Ok(format!("{}_{}", plugin_type, remainder));
            }
        }

        fallback_component(component_path)
    }
}

/// Derive a component name from the directory alone.
pub fn fallback_component(component_path: &str) -> Result<String> {
    let name = component_path.replace('/', "_");
    let name = name.trim_matches('_');
    let name = match name {
        "" | "lib" => CORE.to_string(),
        _ => name.to_string(),
    };
    if name.contains('/') {
        return Err(Error::UnresolvedComponent {
            path: component_path.to_string(),
            component: name,
        });
    }
    if !is_frankenstyle(&name) {
        log::warn!(
            "Component {} derived from {} is not a conventional name",
            name,
            component_path
        );
    }
    Ok(name)
}

/// Determine if a component name is `core` or `type_name` shaped.
pub fn is_frankenstyle(name: &str) -> bool {
    FRANKENSTYLE.is_match(name)
}

fn normalize_key(path: &str) -> String {
    path.replace('\\', "/").trim_end_matches('/').to_string()
}

/// Holds the registry loaded for a run so it is only read once.
#[derive(Debug, Default)]
pub struct ComponentCache {
    loaded: Mutex<Option<(PathBuf, Arc<ComponentMap>)>>,
}

impl ComponentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Default::default()
    }

    /// Get the registry for `file`, loading it on first use.
    pub fn get_or_load<P: AsRef<Path>>(
        &self,
        file: P,
    ) -> Result<Arc<ComponentMap>> {
        let file = file.as_ref();
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((path, map)) = loaded.as_ref() {
            if path == file {
                return Ok(Arc::clone(map));
            }
        }
        let map = Arc::new(ComponentMap::load_file(file)?);
        *loaded = Some((file.to_path_buf(), Arc::clone(&map)));
        Ok(map)
    }

    /// Forget the loaded registry.
    pub fn clear(&self) {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *loaded = None;
    }

    /// Determine if a registry is currently held.
    pub fn is_loaded(&self) -> bool {
        self.loaded
            .lock()
            .map(|loaded| loaded.is_some())
            .unwrap_or(false)
    }
}
