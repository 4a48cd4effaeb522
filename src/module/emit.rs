//! Render the canonical loader call for a module.
//!
//! Existing loader calls keep their parameters and body verbatim and gain
//! an identifier; ES modules are lowered first. Both paths end in
//! `define("<id>", [deps], function(params) { body });`.
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::dependencies::{Dependencies, ImportBinding};
use super::detect::{detect, DetectedModule, LoaderModule};
use super::exports::{self, ensure_default_return, EXPORTS};
use crate::error::{Error, Result};
use crate::naming::ModuleIdentifier;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").unwrap());

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).unwrap());

static IIFE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\A\s*\(\s*(?:function\s*\(\s*\)|\(\s*\)\s*=>)\s*\{(.*)\}\s*(?:\)\s*\(\s*\)|\(\s*\)\s*\))\s*;?\s*\z"#,
    )
    .unwrap()
});

/// Comment placed at the top of bodies lowered from an ES module.
pub const ES_MODULE_MARKER: &str = "// Converted from an ES module.";

/// Formatting options for emitted modules.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Spaces of indentation applied to each line of a lowered body.
    pub indent: usize,
    /// Add a comment noting the body was lowered from an ES module.
    pub mark_es_modules: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            mark_es_modules: false,
        }
    }
}

/// Emitted module text and the identifier embedded in it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransformResult {
    pub code: String,
    pub identifier: ModuleIdentifier,
}

/// Transform module source into a named loader call.
pub fn transform(
    source: &str,
    identifier: &ModuleIdentifier,
    options: &TransformOptions,
) -> Result<TransformResult> {
    let code = match detect(source) {
        DetectedModule::Loader(module) => emit_loader(&module, identifier),
        DetectedModule::EsModule(source) => {
            emit_es_module(source, identifier, options)?
        }
    };
    Ok(TransformResult {
        code,
        identifier: identifier.clone(),
    })
}

/// Render a loader call from its parts.
pub fn render(
    identifier: &str,
    dependencies: &[String],
    params: &str,
    body: &str,
) -> String {
    format!(
        "define({}, {}, function({}) {{{}}});",
        Value::from(identifier),
        Value::from(dependencies.to_vec()),
        params,
        body
    )
}

/// Parse the text of a dependency array literal.
///
/// The text is first normalised to JSON, failing that every quoted token
/// is taken as a dependency.
pub fn parse_dependency_list(text: &str) -> Result<Vec<String>> {
    let normalized = text.replace('\'', "\"");
    let normalized = TRAILING_COMMA.replace_all(&normalized, "]");
    let normalized = WHITESPACE.replace_all(&normalized, " ");
    if let Ok(list) = serde_json::from_str::<Vec<String>>(&normalized) {
        return Ok(list);
    }

    let tokens: Vec<String> = QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect();
    if tokens.is_empty() {
        return Err(Error::DependencyParse {
            text: text.to_string(),
        });
    }
    Ok(tokens)
}

fn emit_loader(module: &LoaderModule<'_>, identifier: &ModuleIdentifier) -> String {
    let dependencies = match module.dependencies {
        Some(text) => parse_dependency_list(text).unwrap_or_else(|e| {
            log::warn!("{}: {}, using no dependencies", identifier, e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    let body = ensure_default_return(module.body);
    render(
        &identifier.to_string(),
        &dependencies,
        module.params,
        &body,
    )
}

fn emit_es_module(
    source: &str,
    identifier: &ModuleIdentifier,
    options: &TransformOptions,
) -> Result<String> {
    let id = identifier.to_string();
    let dependencies = Dependencies::extract(source);

    let mut stripped = String::with_capacity(source.len());
    let mut offset = 0;
    for stmt in dependencies.imports() {
        if stmt.range.start >= offset {
            stripped.push_str(&source[offset..stmt.range.start]);
            offset = stmt.range.end;
        }
    }
    stripped.push_str(&source[offset..]);

    let lowered = exports::lower(&stripped, &id)?;
    let body = dependencies.replace_requires(&lowered.body);
    let body = unwrap_iife(&body);

    let mut lines: Vec<String> = Vec::new();
    if options.mark_es_modules {
        lines.push(ES_MODULE_MARKER.to_string());
    }
    if lowered.has_exports() {
        lines.push(format!("var {} = {{}};", EXPORTS));
    }
    for stmt in dependencies.imports() {
        let param = match dependencies.param(&stmt.specifier) {
            Some(param) => param,
            None => continue,
        };
        for binding in stmt.bindings.iter() {
            lines.push(match binding {
                ImportBinding::Default(local)
                | ImportBinding::Namespace(local) => {
                    format!("var {} = {};", local, param)
                }
                ImportBinding::Named { imported, local } => {
                    if imported == "default" {
                        format!("var {} = {};", local, param)
                    } else {
                        format!("var {} = {}.{};", local, param, imported)
                    }
                }
            });
        }
    }
    lines.extend(trim_blank_lines(body).lines().map(|l| l.to_string()));
    for (local, exported) in lowered.named.iter() {
        lines.push(format!("{}.{} = {};", EXPORTS, exported, local));
    }
    if !lowered.has_default && !lowered.named.is_empty() {
        lines.push(format!("return {};", EXPORTS));
    }

    let indent = " ".repeat(options.indent);
    let text = lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = if text.is_empty() {
        String::from("\n")
    } else {
        format!("\n{}\n", text)
    };
    let body = ensure_default_return(&body);

    let specifiers: Vec<String> =
        dependencies.specifiers().map(|s| s.to_string()).collect();
    Ok(render(
        &id,
        &specifiers,
        &dependencies.params().join(", "),
        &body,
    ))
}

/// Remove one immediately invoked function wrapping the whole body.
fn unwrap_iife(body: &str) -> &str {
    match IIFE.captures(body).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => body,
    }
}

fn trim_blank_lines(text: &str) -> &str {
    let start = text
        .find(|c: char| !c.is_whitespace())
        .map(|i| text[..i].rfind('\n').map(|n| n + 1).unwrap_or(0))
        .unwrap_or(text.len());
    let end = text.trim_end().len();
    if start >= end {
        ""
    } else {
        &text[start..end]
    }
}
