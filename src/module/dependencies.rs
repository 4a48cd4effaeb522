//! Collect the dependencies of an ES module.
//!
//! Both `import ... from "x"` declarations and `require("x")` calls are
//! scanned; the dependency list keeps first-occurrence order and each
//! specifier is bound to the positional parameter `depN`.
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::{Captures, Match, Regex};

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[ \t]*\bimport\b\s*(?:([\w$]+)\s*(?:,\s*)?)?(?:\{([^}]*)\}\s*)?(?:\*\s*as\s+([\w$]+)\s*)?from\s*(?:"([^"]*)"|'([^']*)')[ \t]*;?(?:[ \t]*\r?\n)?"#,
    )
    .unwrap()
});

static IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[ \t]*\bimport\s*(?:"([^"]*)"|'([^']*)')[ \t]*;?(?:[ \t]*\r?\n)?"#,
    )
    .unwrap()
});

static REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\s*\(\s*(?:"([^"]*)"|'([^']*)')\s*\)"#).unwrap()
});

/// Name of the parameter bound to the dependency at `index`.
pub fn param_name(index: usize) -> String {
    format!("dep{}", index)
}

/// A binding introduced by an import declaration.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ImportBinding {
    /// `import Foo from "x"`
    Default(String),
    /// `import * as foo from "x"`
    Namespace(String),
    /// `import { foo as bar } from "x"`
    Named { imported: String, local: String },
}

/// An import declaration found in the source.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImportStatement {
    /// Byte range of the statement including its line ending.
    pub range: Range<usize>,
    /// The module specifier.
    pub specifier: String,
    /// Bindings declared by the statement, empty for side effect imports.
    pub bindings: Vec<ImportBinding>,
}

/// Ordered, de-duplicated dependencies of a module.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    specifiers: IndexSet<String>,
    imports: Vec<ImportStatement>,
}

impl Dependencies {
    /// Scan `source` for import declarations and require calls.
    pub fn extract(source: &str) -> Self {
        let mut found: Vec<(usize, String)> = Vec::new();
        let mut imports = Vec::new();

        for caps in IMPORT_FROM.captures_iter(source) {
            let whole = match caps.get(0) {
                Some(m) if starts_statement(source, m.start()) => m,
                _ => continue,
            };
            let specifier = quoted(&caps, 4, 5).to_string();
            let mut bindings = Vec::new();
            if let Some(name) = caps.get(1) {
                bindings.push(ImportBinding::Default(name.as_str().into()));
            }
            if let Some(named) = caps.get(2) {
                bindings.extend(named_bindings(named.as_str()));
            }
            if let Some(name) = caps.get(3) {
                bindings.push(ImportBinding::Namespace(name.as_str().into()));
            }
            found.push((whole.start(), specifier.clone()));
            imports.push(ImportStatement {
                range: statement_range(source, &whole),
                specifier,
                bindings,
            });
        }

        for caps in IMPORT_BARE.captures_iter(source) {
            let whole = match caps.get(0) {
                Some(m) if starts_statement(source, m.start()) => m,
                _ => continue,
            };
            let specifier = quoted(&caps, 1, 2).to_string();
            found.push((whole.start(), specifier.clone()));
            imports.push(ImportStatement {
                range: statement_range(source, &whole),
                specifier,
                bindings: Vec::new(),
            });
        }

        for caps in REQUIRE.captures_iter(source) {
            if let Some(whole) = caps.get(0) {
                found.push((whole.start(), quoted(&caps, 1, 2).to_string()));
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        imports.sort_by_key(|stmt| stmt.range.start);

        let specifiers = found.into_iter().map(|(_, spec)| spec).collect();
        Self {
            specifiers,
            imports,
        }
    }

    /// Dependency specifiers in parameter order.
    pub fn specifiers(&self) -> impl Iterator<Item = &str> {
        self.specifiers.iter().map(|s| s.as_str())
    }

    /// Number of distinct dependencies.
    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    /// Determine if the module has no dependencies.
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Import declarations in source order.
    pub fn imports(&self) -> &[ImportStatement] {
        &self.imports
    }

    /// Parameter bound to `specifier`.
    pub fn param(&self, specifier: &str) -> Option<String> {
        self.specifiers.get_index_of(specifier).map(param_name)
    }

    /// Parameter names in dependency order.
    pub fn params(&self) -> Vec<String> {
        (0..self.specifiers.len()).map(param_name).collect()
    }

    /// Replace every `require("x")` call with the parameter bound to `x`.
    pub fn replace_requires<'a>(&self, text: &'a str) -> Cow<'a, str> {
        REQUIRE.replace_all(text, |caps: &Captures| {
            let spec = quoted(caps, 1, 2);
            match self.param(spec) {
                Some(param) => param,
                None => caps[0].to_string(),
            }
        })
    }
}

/// Determine if `offset` begins a statement: the start of a line or
/// after a `;` or `}` on the same line.
fn starts_statement(source: &str, offset: usize) -> bool {
    let before = source[..offset].trim_end_matches(&[' ', '\t'][..]);
    starts_line(before) || before.ends_with(';') || before.ends_with('}')
}

fn starts_line(before: &str) -> bool {
    before.is_empty() || before.ends_with('\n')
}

/// Range removed for an import, keeping the line ending when the import
/// shares its line with an earlier statement.
fn statement_range(source: &str, whole: &Match<'_>) -> Range<usize> {
    let mut range = whole.range();
    let before = source[..range.start].trim_end_matches(&[' ', '\t'][..]);
    if !starts_line(before) {
        let text = whole.as_str();
        let kept = text.trim_end_matches(&['\r', '\n'][..]).len();
        range.end = range.start + kept;
    }
    range
}

fn quoted<'t>(caps: &Captures<'t>, double: usize, single: usize) -> &'t str {
    caps.get(double)
        .or_else(|| caps.get(single))
        .map(|m| m.as_str())
        .unwrap_or("")
}

fn named_bindings(list: &str) -> Vec<ImportBinding> {
    list.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| {
            let parts: Vec<&str> = item.split_whitespace().collect();
            match parts.as_slice() {
                [imported, "as", local] => ImportBinding::Named {
                    imported: imported.to_string(),
                    local: local.to_string(),
                },
                _ => ImportBinding::Named {
                    imported: item.to_string(),
                    local: item.to_string(),
                },
            }
        })
        .collect()
}
