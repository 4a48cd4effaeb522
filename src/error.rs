//! Error types for path classification, naming and transformation.
use std::path::PathBuf;

use thiserror::Error;

/// Result type for the transformation engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while naming or transforming a module.
#[derive(Error, Debug)]
pub enum Error {
    /// The file path does not have the `<component>/amd/src/<file>.js` shape.
    #[error("Invalid module path {path}: {reason}")]
    PathFormat { path: String, reason: String },

    /// The component configuration exists but could not be read or parsed.
    #[error("Failed to load component registry {}: {message}", .path.display())]
    RegistryLoad { path: PathBuf, message: String },

    /// A plugin type matched but the plugin name is missing or malformed.
    #[error("Invalid plugin path {path} for plugin type {plugin_type}")]
    InvalidPluginPath { path: String, plugin_type: String },

    /// No well-formed component name could be derived for the path.
    #[error("Unable to resolve component for {path} (got {component})")]
    UnresolvedComponent { path: String, component: String },

    /// The dependency array of an existing loader module could not be read.
    #[error("Unable to parse dependency list {text}")]
    DependencyParse { text: String },

    /// The source uses syntax the transform cannot lower.
    #[error("Unsupported syntax in {identifier}: {detail}")]
    UnsupportedSyntax { identifier: String, detail: String },

    /// The transformed output could not be parsed for minification.
    #[error("Failed to minify {identifier}: {message}")]
    Minify { identifier: String, message: String },
}

impl Error {
    pub(crate) fn path_format<P: Into<String>, R: Into<String>>(
        path: P,
        reason: R,
    ) -> Self {
        Error::PathFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error prevents every file in a run from being named.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::RegistryLoad { .. })
    }
}
