//! HTML minification.
//!
//! A conservative streaming rewrite of assembled documents. Comments are kept,
//! redundant and empty attributes are dropped, whitespace in text is collapsed
//! outside `<pre>`, `<textarea>`, `<script>` and `<style>`, and inline
//! JavaScript loses its indentation and blank lines. Lines inside string and
//! template literals are kept as written.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use lol_html::{
    EndTagHandler, RewriteStrSettings, doc_text, element,
    html_content::{ContentType, Element, TextType},
    rewrite_str,
};
use thiserror::Error;

/// Minification failure, wrapping what went wrong in the rewriter.
#[derive(Debug, Error)]
#[error("HTML minification failed")]
pub struct MinificationError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl MinificationError {
    /// Wrap an underlying failure.
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Result type for minification.
pub type Result<T> = std::result::Result<T, MinificationError>;

/// Script `type` values that mean plain JavaScript and can be omitted.
const DEFAULT_SCRIPT_TYPES: [&str; 5] = [
    "text/javascript",
    "application/javascript",
    "text/ecmascript",
    "application/ecmascript",
    "application/x-javascript",
];

/// Attributes with no effect when their value is empty.
const DROPPABLE_WHEN_EMPTY: [&str; 6] = ["class", "id", "style", "title", "lang", "dir"];

/// Minifier applied to every assembled document before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Minifier {
    enabled: bool,
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Minifier {
    /// An enabled minifier.
    #[must_use]
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// A minifier that passes documents through untouched.
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Enable or disable minification.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether documents are actually rewritten.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Minify a document, or return it unchanged when disabled.
    pub fn minify(&self, html: &str) -> Result<String> {
        if !self.enabled {
            return Ok(html.to_string());
        }
        minify_html(html)
    }
}

fn minify_html(html: &str) -> Result<String> {
    let pre_depth = Rc::new(Cell::new(0_usize));
    let inline_js = Rc::new(Cell::new(false));
    let pending = Rc::new(RefCell::new(String::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("pre", {
                    let pre_depth = Rc::clone(&pre_depth);
                    move |el| {
                        pre_depth.set(pre_depth.get() + 1);
                        if let Some(handlers) = el.end_tag_handlers() {
                            let pre_depth = Rc::clone(&pre_depth);
                            let handler: EndTagHandler<'static> = Box::new(move |_end| {
                                pre_depth.set(pre_depth.get().saturating_sub(1));
                                Ok(())
                            });
                            handlers.push(handler);
                        }
                        Ok(())
                    }
                }),
                element!("script", {
                    let inline_js = Rc::clone(&inline_js);
                    move |el| {
                        let script_type = el.get_attribute("type");
                        inline_js.set(is_javascript(script_type.as_deref()));

                        if script_type.as_deref().is_some_and(is_default_script_type) {
                            el.remove_attribute("type");
                        }
                        if el
                            .get_attribute("language")
                            .is_some_and(|lang| lang.trim().eq_ignore_ascii_case("javascript"))
                        {
                            el.remove_attribute("language");
                        }
                        if !el.has_attribute("src") {
                            el.remove_attribute("charset");
                        }
                        Ok(())
                    }
                }),
                element!("style, link", |el| {
                    remove_attribute_if(el, "type", |v| v.eq_ignore_ascii_case("text/css"));
                    Ok(())
                }),
                element!("form", |el| {
                    remove_attribute_if(el, "method", |v| v.eq_ignore_ascii_case("get"));
                    Ok(())
                }),
                element!("input", |el| {
                    remove_attribute_if(el, "type", |v| v.eq_ignore_ascii_case("text"));
                    Ok(())
                }),
                element!("area", |el| {
                    remove_attribute_if(el, "shape", |v| v.eq_ignore_ascii_case("rect"));
                    Ok(())
                }),
                element!("*", |el| {
                    remove_empty_attributes(el);
                    Ok(())
                }),
            ],
            document_content_handlers: vec![doc_text!({
                let pre_depth = Rc::clone(&pre_depth);
                let inline_js = Rc::clone(&inline_js);
                let pending = Rc::clone(&pending);
                move |chunk| {
                    // Text nodes may arrive split; only rewrite once the node is whole.
                    if !chunk.last_in_text_node() {
                        pending.borrow_mut().push_str(chunk.as_str());
                        chunk.remove();
                        return Ok(());
                    }

                    let mut text = std::mem::take(&mut *pending.borrow_mut());
                    text.push_str(chunk.as_str());

                    let minified = match chunk.text_type() {
                        TextType::Data if pre_depth.get() == 0 => collapse_whitespace(&text),
                        TextType::ScriptData if inline_js.get() => minify_script(&text),
                        _ => text,
                    };
                    chunk.replace(&minified, ContentType::Html);
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(MinificationError::new)
}

fn is_default_script_type(value: &str) -> bool {
    let value = value.trim();
    DEFAULT_SCRIPT_TYPES
        .iter()
        .any(|default| value.eq_ignore_ascii_case(default))
}

fn is_javascript(script_type: Option<&str>) -> bool {
    match script_type.map(str::trim) {
        None | Some("") => true,
        Some(value) => is_default_script_type(value) || value.eq_ignore_ascii_case("module"),
    }
}

fn remove_attribute_if(el: &mut Element<'_, '_>, name: &str, redundant: impl Fn(&str) -> bool) {
    if el
        .get_attribute(name)
        .is_some_and(|value| redundant(value.trim()))
    {
        el.remove_attribute(name);
    }
}

fn remove_empty_attributes(el: &mut Element<'_, '_>) {
    let empty: Vec<String> = el
        .attributes()
        .iter()
        .filter(|attr| attr.value().trim().is_empty())
        .map(|attr| attr.name())
        .filter(|name| DROPPABLE_WHEN_EMPTY.contains(&name.as_str()) || name.starts_with("on"))
        .collect();

    for name in empty {
        el.remove_attribute(&name);
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_whitespace = false;

    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_whitespace {
                collapsed.push(' ');
            }
            in_whitespace = true;
        } else {
            collapsed.push(c);
            in_whitespace = false;
        }
    }

    collapsed
}

fn minify_script(source: &str) -> String {
    let mut scanner = ScriptScanner::default();
    let mut lines = Vec::new();

    for line in source.split('\n') {
        let starts_in_literal = scanner.in_literal();
        scanner.scan_line(line);
        let ends_in_literal = scanner.in_literal();

        let line = if starts_in_literal { line } else { line.trim_start() };
        let line = if ends_in_literal { line } else { line.trim_end() };
        if line.is_empty() && !starts_in_literal && !ends_in_literal {
            continue;
        }
        lines.push(line);
    }

    lines.join("\n")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ScriptState {
    #[default]
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
    Template,
}

/// Follows string, template and comment boundaries across the lines of a
/// script.
#[derive(Debug, Default)]
struct ScriptScanner {
    state: ScriptState,
    /// Brace depth of each open `${` substitution, innermost last.
    substitutions: Vec<usize>,
}

impl ScriptScanner {
    fn in_literal(&self) -> bool {
        matches!(self.state, ScriptState::Quoted(_) | ScriptState::Template)
    }

    fn scan_line(&mut self, line: &str) {
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match self.state {
                ScriptState::Code => match c {
                    '\'' | '"' => self.state = ScriptState::Quoted(c),
                    '`' => self.state = ScriptState::Template,
                    '/' if chars.peek() == Some(&'/') => {
                        chars.next();
                        self.state = ScriptState::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        self.state = ScriptState::BlockComment;
                    }
                    '{' => {
                        if let Some(depth) = self.substitutions.last_mut() {
                            *depth += 1;
                        }
                    }
                    '}' => {
                        if let Some(depth) = self.substitutions.last_mut() {
                            if *depth == 0 {
                                self.substitutions.pop();
                                self.state = ScriptState::Template;
                            } else {
                                *depth -= 1;
                            }
                        }
                    }
                    _ => {}
                },
                ScriptState::LineComment => break,
                ScriptState::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        self.state = ScriptState::Code;
                    }
                }
                ScriptState::Quoted(quote) => {
                    if c == '\\' {
                        // A trailing backslash continues the string on the next line.
                        if chars.next().is_none() {
                            return;
                        }
                    } else if c == quote {
                        self.state = ScriptState::Code;
                    }
                }
                ScriptState::Template => match c {
                    '\\' => {
                        chars.next();
                    }
                    '`' => self.state = ScriptState::Code,
                    '$' if chars.peek() == Some(&'{') => {
                        chars.next();
                        self.substitutions.push(0);
                        self.state = ScriptState::Code;
                    }
                    _ => {}
                },
            }
        }

        // Line comments and unterminated quotes end with the line.
        if matches!(self.state, ScriptState::LineComment | ScriptState::Quoted(_)) {
            self.state = ScriptState::Code;
        }
    }
}
