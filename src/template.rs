//! Template interpolation for source definitions
//!
//! Paths, query parameters, and headers may contain `{{ variable }}`
//! placeholders. Two roots are available:
//! - `config`: user-supplied settings (e.g., `{{ config.token }}`)
//! - `partition`: values taken from a parent record (e.g., `{{ partition.project_slug }}`)

use crate::error::{Error, Result};
use crate::types::JsonValue;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}")
        .expect("template pattern is valid")
});

/// Values available to templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    /// User-supplied settings
    pub config: JsonValue,
    /// Values of the parent record being expanded
    pub partition: JsonValue,
}

impl TemplateContext {
    /// Context with only user settings
    pub fn with_config(config: JsonValue) -> Self {
        Self {
            config,
            partition: JsonValue::Null,
        }
    }

    /// Same settings, different partition
    #[must_use]
    pub fn with_partition(&self, partition: JsonValue) -> Self {
        Self {
            config: self.config.clone(),
            partition,
        }
    }

    /// Look up a dotted variable such as `config.credentials.token`
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let mut parts = path.split('.');
        let root = match parts.next()? {
            "config" => &self.config,
            "partition" => &self.partition,
            _ => return None,
        };
        parts.try_fold(root, |value, key| value.as_object()?.get(key))
    }
}

/// Render `template`; any undefined variable is an error naming all of them
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();
    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &Captures<'_>| {
        match ctx.get(&cap[1]) {
            Some(value) => value_to_string(value),
            None => {
                missing.push(cap[1].to_string());
                String::new()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Render every value of a map
pub fn render_map(
    map: &BTreeMap<String, String>,
    ctx: &TemplateContext,
) -> Result<BTreeMap<String, String>> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), render(value, ctx)?)))
        .collect()
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Variable names referenced by a template, in order
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

fn value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}
