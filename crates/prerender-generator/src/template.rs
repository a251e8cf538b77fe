//! Document template system.
//!
//! Provides a lightweight template system using string interpolation rather than
//! heavy template engines like Tera or Handlebars. Templates are parsed once into
//! a [`Template`] and kept in a process-wide [`TemplateCache`] keyed by their
//! source, so rendering thousands of pages against the same template only pays
//! the parsing cost once.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Check if a variable exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable { name: String, optional: bool },
}

/// A parsed template.
///
/// Variables are specified as `{{ variable_name }}` in the template string, and
/// `{{ variable_name? }}` marks a variable that renders as nothing when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    literal_len: usize,
}

impl Template {
    /// Parse a template source.
    pub fn compile(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal_len = 0;
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            let end = rest[start..]
                .find("}}")
                .ok_or_else(|| TemplateError::InvalidSyntax("unclosed {{ delimiter".to_string()))?;
            let end = start + end;

            if start > 0 {
                literal_len += start;
                segments.push(Segment::Literal(rest[..start].to_string()));
            }

            let var_name = rest[start + 2..end].trim();

            // Check for optional variable syntax: {{ variable? }}
            let (var_name, optional) = if let Some(stripped) = var_name.strip_suffix('?') {
                (stripped.trim_end(), true)
            } else {
                (var_name, false)
            };

            if var_name.is_empty() {
                return Err(TemplateError::InvalidSyntax(
                    "empty variable name".to_string(),
                ));
            }

            segments.push(Segment::Variable {
                name: var_name.to_string(),
                optional,
            });
            rest = &rest[end + 2..];
        }

        if !rest.is_empty() {
            literal_len += rest.len();
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            segments,
            literal_len,
        })
    }

    /// Names of the variables referenced by this template, in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Render the template with the given context.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = String::with_capacity(self.literal_len);

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Variable { name, optional } => match context.get(name) {
                    Some(value) => result.push_str(value),
                    None if *optional => {}
                    None => return Err(TemplateError::MissingVariable(name.clone())),
                },
            }
        }

        Ok(result)
    }
}

/// Compiled templates keyed by their exact source.
///
/// Entries are only ever added. The map entry for a source stays locked while
/// it compiles, so concurrent first uses of one source compile it once.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: DashMap<String, Arc<Template>>,
    compilations: AtomicUsize,
}

impl TemplateCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the compiled form of `source`, parsing it on first use.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Template>> {
        self.get_or_compile_with(source, Template::compile)
    }

    /// Like [`TemplateCache::get_or_compile`], with a custom compile step.
    pub fn get_or_compile_with<F>(&self, source: &str, compile: F) -> Result<Arc<Template>>
    where
        F: FnOnce(&str) -> Result<Template>,
    {
        if let Some(template) = self.templates.get(source) {
            return Ok(Arc::clone(template.value()));
        }

        match self.templates.entry(source.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let template = Arc::new(compile(source)?);
                self.compilations.fetch_add(1, Ordering::Relaxed);
                debug!(bytes = source.len(), "compiled document template");
                entry.insert(Arc::clone(&template));
                Ok(template)
            }
        }
    }

    /// Number of distinct sources cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Number of successful compilations performed by this cache.
    #[must_use]
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }
}

static TEMPLATES: Lazy<TemplateCache> = Lazy::new(TemplateCache::new);

/// Process-wide compiled template for `source`.
pub fn compiled(source: &str) -> Result<Arc<Template>> {
    TEMPLATES.get_or_compile(source)
}

/// Default SSR document template.
pub const DEFAULT_SSR_TEMPLATE: &str = r#"<!DOCTYPE html>
<html {{ html_attributes }}>
<head>
    <meta charset="UTF-8">
    <meta name="generator" content="prerender v{{ version }}">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {{ no_index? }}
    {{ meta_attributes }}
    {{ head_tags }}
    {{ stylesheets }}
    {{ scripts }}
</head>
<body {{ body_attributes }}>
    {{ pre_body_tags }}
    <div id="__prerender">{{ app_html }}</div>
    {{ post_body_tags }}
</body>
</html>
"#;
