//! Export lowering and the default export return fix-up.
//!
//! The host loader expects a module callback to return its primary value,
//! so a module with a default export returns that value alone. Any named
//! exports living alongside a default export are dropped from the module
//! value.
use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};

/// Local object collecting the exports of a lowered ES module.
pub const EXPORTS: &str = "_exports";

static REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*export\s*(?:\*(?:\s*as\s+[\w$]+)?|\{[^}]*\})\s*from\b"#,
    )
    .unwrap()
});

static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s*\{([^}]*)\}[ \t]*;?[ \t]*(?:\r?\n)?"#)
        .unwrap()
});

static EXPORT_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([ \t]*)export\s+default\s+"#).unwrap()
});

static EXPORT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)export\s+((?:async\s+)?function\s*\*?\s*([\w$]+)|class\s+([\w$]+)|(?:const|let|var)\s+([\w$]+))"#,
    )
    .unwrap()
});

static DEFAULT_ASSIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b(_?exports)(?:\.default|\[\s*["']default["']\s*\])\s*=(?:[^=]|\z)"#,
    )
    .unwrap()
});

static DEFAULT_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"Object\s*\.\s*defineProperty\s*\(\s*(_?exports)\s*,\s*["']default["']"#,
    )
    .unwrap()
});

static DEFAULT_RETURN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\breturn\s+_?exports(?:\.default|\[\s*["']default["']\s*\])"#,
    )
    .unwrap()
});

/// Body of an ES module with its export syntax removed.
#[derive(Debug, Clone, Default)]
pub struct LoweredExports {
    /// Body text without export keywords.
    pub body: String,
    /// Whether a default export was assigned to the exports object,
    /// either in place or as `export { x as default }`.
    pub has_default: bool,
    /// Named exports as `(local, exported)` pairs in source order.
    pub named: Vec<(String, String)>,
}

impl LoweredExports {
    /// Determine if the module exports anything.
    pub fn has_exports(&self) -> bool {
        self.has_default || !self.named.is_empty()
    }
}

/// Strip export syntax from an ES module body.
pub fn lower(body: &str, identifier: &str) -> Result<LoweredExports> {
    if let Some(found) = REEXPORT.find(body) {
        return Err(Error::UnsupportedSyntax {
            identifier: identifier.to_string(),
            detail: format!("re-export `{}`", found.as_str().trim()),
        });
    }

    let mut named = Vec::new();

    let body = EXPORT_LIST.replace_all(body, |caps: &Captures| {
        named.extend(export_list(&caps[1]));
        String::new()
    });

    let mut has_default = EXPORT_DEFAULT.is_match(&body);
    let replacement = format!("${{1}}{}.default = ", EXPORTS);
    let body = EXPORT_DEFAULT.replace_all(&body, replacement.as_str());

    let body = EXPORT_DECL.replace_all(&body, |caps: &Captures| {
        let name = caps
            .get(3)
            .or_else(|| caps.get(4))
            .or_else(|| caps.get(5))
            .map(|m| m.as_str().to_string());
        if let Some(name) = name {
            named.push((name.clone(), name));
        }
        format!("{}{}", &caps[1], &caps[2])
    });

    has_default |= named.iter().any(|(_, exported)| exported == "default");

    Ok(LoweredExports {
        body: body.into_owned(),
        has_default,
        named,
    })
}

fn export_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| {
            let parts: Vec<&str> = item.split_whitespace().collect();
            match parts.as_slice() {
                [local, "as", exported] => {
                    (local.to_string(), exported.to_string())
                }
                _ => (item.to_string(), item.to_string()),
            }
        })
        .collect()
}

/// Find the default export slot assigned in `body`, eg: `_exports.default`.
pub fn default_export_slot(body: &str) -> Option<String> {
    DEFAULT_ASSIGN
        .captures(body)
        .or_else(|| DEFAULT_PROPERTY.captures(body))
        .map(|caps| format!("{}.default", &caps[1]))
}

/// Make a body assigning a default export return that value.
///
/// Bodies without a default export, or that already return it, are
/// returned unchanged.
pub fn ensure_default_return(body: &str) -> Cow<'_, str> {
    let slot = match default_export_slot(body) {
        Some(slot) => slot,
        None => return Cow::Borrowed(body),
    };
    if DEFAULT_RETURN.is_match(body) {
        return Cow::Borrowed(body);
    }
    log::debug!("Returning default export {}", slot);
    Cow::Owned(append_statement(body, &format!("return {};", slot)))
}

/// Append a statement as the last one of a function body.
pub(crate) fn append_statement(body: &str, statement: &str) -> String {
    let trimmed = body.trim_end();
    if !trimmed.contains('\n') {
        return format!("{} {} ", trimmed, statement);
    }
    let indent: String = trimmed
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| {
            line.chars().take_while(|c| c.is_whitespace()).collect()
        })
        .unwrap_or_default();
    format!("{}\n{}{}\n", trimmed, indent, statement)
}
