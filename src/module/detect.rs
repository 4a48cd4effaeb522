//! Classify source text as a loader call or an ES module.
//!
//! Recognition is structural: each shape is a regular expression anchored
//! to the end of the text, so `define(` appearing inside a trailing string
//! or comment can produce a false positive.
use std::sync::LazyLock;

use regex::Regex;

static DEPENDENCIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\bdefine\s*\(\s*(\[[^\]]*\])\s*,\s*function\s*[\w$]*\s*\(([^)]*)\)\s*\{(.*)\}\s*\)\s*;?\s*\z"#,
    )
    .unwrap()
});

static NAMED_DEPENDENCIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\bdefine\s*\(\s*(?:"[^"]*"|'[^']*')\s*,\s*(\[[^\]]*\])\s*,\s*function\s*[\w$]*\s*\(([^)]*)\)\s*\{(.*)\}\s*\)\s*;?\s*\z"#,
    )
    .unwrap()
});

static BARE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\bdefine\s*\(\s*function\s*[\w$]*\s*\(([^)]*)\)\s*\{(.*)\}\s*\)\s*;?\s*\z"#,
    )
    .unwrap()
});

/// Loader call shapes in the order they are tried.
///
/// A string name is only meaningful alongside a dependency array so the
/// named shape is tried before giving up on an explicit array.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LoaderShape {
    /// `define([deps], function(params) { body })`
    Dependencies,
    /// `define("name", [deps], function(params) { body })`
    NamedDependencies,
    /// `define(function(params) { body })`
    BareFunction,
}

impl LoaderShape {
    /// Precedence of the recognizers, first match wins.
    pub const PRECEDENCE: [LoaderShape; 3] = [
        LoaderShape::Dependencies,
        LoaderShape::NamedDependencies,
        LoaderShape::BareFunction,
    ];

    /// Try to recognize this shape at the end of `source`.
    pub fn recognize<'a>(&self, source: &'a str) -> Option<LoaderModule<'a>> {
        match self {
            LoaderShape::Dependencies | LoaderShape::NamedDependencies => {
                let pattern = if *self == LoaderShape::Dependencies {
                    &*DEPENDENCIES
                } else {
                    &*NAMED_DEPENDENCIES
                };
                let caps = pattern.captures(source)?;
                Some(LoaderModule {
                    shape: *self,
                    dependencies: Some(caps.get(1)?.as_str()),
                    params: caps.get(2)?.as_str(),
                    body: caps.get(3)?.as_str(),
                })
            }
            LoaderShape::BareFunction => {
                let caps = BARE_FUNCTION.captures(source)?;
                Some(LoaderModule {
                    shape: *self,
                    dependencies: None,
                    params: caps.get(1)?.as_str(),
                    body: caps.get(2)?.as_str(),
                })
            }
        }
    }
}

/// Parts of a recognized loader call, borrowed from the source text.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoaderModule<'a> {
    /// Which recognizer matched.
    pub shape: LoaderShape,
    /// Text of the dependency array literal, `None` when absent.
    pub dependencies: Option<&'a str>,
    /// Parameter list text without the parentheses.
    pub params: &'a str,
    /// Function body text without the braces.
    pub body: &'a str,
}

/// Outcome of format detection.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DetectedModule<'a> {
    /// Source already in loader format.
    Loader(LoaderModule<'a>),
    /// Source to be treated as an ES module.
    EsModule(&'a str),
}

impl<'a> DetectedModule<'a> {
    /// Determine if the source was recognized as a loader call.
    pub fn is_loader(&self) -> bool {
        matches!(self, DetectedModule::Loader(_))
    }
}

/// Recognize the first loader call shape matching the end of `source`.
pub fn recognize(source: &str) -> Option<LoaderModule<'_>> {
    LoaderShape::PRECEDENCE
        .iter()
        .find_map(|shape| shape.recognize(source))
}

/// Classify `source`, falling back to an ES module when nothing matches.
pub fn detect(source: &str) -> DetectedModule<'_> {
    match recognize(source) {
        Some(module) => {
            log::debug!("Recognized loader call {:?}", module.shape);
            DetectedModule::Loader(module)
        }
        None => DetectedModule::EsModule(source),
    }
}
