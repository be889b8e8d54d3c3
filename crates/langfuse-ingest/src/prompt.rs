//! System-prompt templates fetched from Langfuse.
//!
//! Langfuse stores placeholders jinja-style with free spacing
//! (`{{ name }}`, `{{name }}`). Templates are normalized to the compact form
//! `{{name}}` on construction and rendered against a map of values.

use crate::error::PromptError;
use regex::Regex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Rewrites every `{{ var }}` spacing variant to `{{var}}`.
///
/// Only identifiers made of ASCII letters, digits and `_` are recognized;
/// other brace content is left untouched.
pub fn normalize_placeholders(template: &str) -> String {
    PLACEHOLDER.replace_all(template, "{{${1}}}").into_owned()
}

/// A normalized system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    version: Option<i64>,
    text: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, version: Option<i64>, raw: &str) -> Self {
        Self {
            name: name.into(),
            version,
            text: normalize_placeholders(raw),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Normalized template text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.text) {
            if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }

    /// Substitutes every placeholder. Extra entries in `values` are ignored.
    pub fn render<K, V>(&self, values: &HashMap<K, V>) -> Result<String, PromptError>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<str>,
    {
        let mut out = String::with_capacity(self.text.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&self.text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = values
                .get(name.as_str())
                .ok_or_else(|| PromptError::MissingVariable(name.as_str().to_string()))?;

            out.push_str(&self.text[last..whole.start()]);
            out.push_str(value.as_ref());
            last = whole.end();
        }

        out.push_str(&self.text[last..]);
        Ok(out)
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
