//! Blueprint regeneration collaborator.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::lineage::{read_json_object, REGISTRY_FILE};

/// Input for rendering one blueprint-owned file.
#[derive(Debug, Clone, Copy)]
pub struct RegenRequest<'a> {
    /// Scaffold root.
    pub root: &'a Path,
    /// Normalized relative path of the file to render.
    pub path: &'a str,
    /// Blueprint descriptor from the plan.
    pub blueprint: Option<&'a Value>,
    /// Scaffold variables from the registry.
    pub variables: &'a Map<String, Value>,
}

/// Renders the contents of blueprint-owned files.
///
/// Implementations only produce bytes; the apply engine decides whether
/// and where they may be written.
pub trait Regenerator {
    /// Renders the file named by `request`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason if the file cannot be rendered.
    fn render(&self, request: &RegenRequest<'_>) -> Result<Vec<u8>, String>;
}

impl<F> Regenerator for F
where
    F: Fn(&RegenRequest<'_>) -> Result<Vec<u8>, String>,
{
    fn render(&self, request: &RegenRequest<'_>) -> Result<Vec<u8>, String> {
        self(request)
    }
}

/// Reads the scaffold variables (`variables` in the registry file).
pub fn registry_variables(root: &Path) -> Map<String, Value> {
    match read_json_object(&root.join(REGISTRY_FILE)).remove("variables") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Renders `{{ name }}` placeholders from `variables`.
///
/// Unknown names are an error rather than an empty substitution.
pub fn render_placeholders(template: &str, variables: &Map<String, Value>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| "unterminated placeholder".to_string())?;
        let name = after[..close].trim();
        let value = variables
            .get(name)
            .ok_or_else(|| format!("undefined variable '{name}'"))?;
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Renders files from a directory of templates mirroring the scaffold.
///
/// The template for `src/app.py` is `<templates>/src/app.py`.
#[derive(Debug, Clone)]
pub struct TemplateDirRegenerator {
    templates: PathBuf,
}

impl TemplateDirRegenerator {
    /// Creates a regenerator reading from `templates`.
    pub fn new(templates: impl Into<PathBuf>) -> Self {
        Self {
            templates: templates.into(),
        }
    }
}

impl Regenerator for TemplateDirRegenerator {
    fn render(&self, request: &RegenRequest<'_>) -> Result<Vec<u8>, String> {
        let source = request
            .path
            .split('/')
            .fold(self.templates.clone(), |acc, part| acc.join(part));
        let template = fs::read_to_string(&source)
            .map_err(|e| format!("template {} unavailable: {e}", source.display()))?;
        render_placeholders(&template, request.variables).map(String::into_bytes)
    }
}
