//! HTML document assembly.
//!
//! Combines the markup a renderer produced with its collected head metadata,
//! the page's assets and the static site fragments into one complete document.

use std::collections::BTreeMap;

use prerender_core::{HeadMetadata, HeadTag, RenderResult};
use thiserror::Error;
use tracing::trace;

use crate::{
    assets::resolve_bundles,
    params::RenderParams,
    template::{self, TemplateContext, TemplateError},
};

/// HTML generation errors.
#[derive(Debug, Error)]
pub enum HtmlError {
    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
}

/// Result type for HTML generation.
pub type Result<T> = std::result::Result<T, HtmlError>;

const NO_INDEX_META: &str = r#"<meta name="robots" content="noindex, nofollow">"#;

/// Everything the document template is filled with for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateData<'a> {
    pub app_html: &'a str,
    pub base_url: &'a str,
    pub html_attributes: String,
    pub body_attributes: String,
    /// Serialised title, meta, link and script tags, empty groups removed.
    pub meta_attributes: Vec<String>,
    pub head_tags: &'a str,
    pub pre_body_tags: &'a str,
    pub post_body_tags: &'a str,
    /// Stylesheet files, relative to the base URL.
    pub stylesheets: Vec<String>,
    /// Script files, relative to the base URL.
    pub scripts: Vec<String>,
    pub no_index: bool,
    pub version: &'a str,
}

impl<'a> TemplateData<'a> {
    /// Gather template data for a rendered page.
    #[must_use]
    pub fn new(params: &'a RenderParams, result: &'a RenderResult) -> Self {
        let collected = &result.collected;
        let bundles = resolve_bundles(&params.manifest, &collected.modules);

        Self {
            app_html: &result.html,
            base_url: &params.base_url,
            html_attributes: attributes_html(&collected.head.html_attributes),
            body_attributes: attributes_html(&collected.head.body_attributes),
            meta_attributes: meta_attributes(&collected.head),
            head_tags: &params.head_tags,
            pre_body_tags: &params.pre_body_tags,
            post_body_tags: &params.post_body_tags,
            stylesheets: bundles.stylesheets,
            scripts: bundles.scripts,
            no_index: params.no_index,
            version: &params.version,
        }
    }

    /// Template variables for this page.
    #[must_use]
    pub fn to_context(&self) -> TemplateContext {
        let stylesheets = self
            .stylesheets
            .iter()
            .map(|file| {
                format!(
                    r#"<link rel="stylesheet" href="{}">"#,
                    escape_attribute(&format!("{}{file}", self.base_url))
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let scripts = self
            .scripts
            .iter()
            .map(|file| {
                format!(
                    r#"<script src="{}" defer></script>"#,
                    escape_attribute(&format!("{}{file}", self.base_url))
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        TemplateContext::new()
            .with_var("app_html", self.app_html)
            .with_var("base_url", self.base_url)
            .with_var("html_attributes", &self.html_attributes)
            .with_var("body_attributes", &self.body_attributes)
            .with_var("meta_attributes", self.meta_attributes.join("\n"))
            .with_var("head_tags", self.head_tags)
            .with_var("pre_body_tags", self.pre_body_tags)
            .with_var("post_body_tags", self.post_body_tags)
            .with_var("stylesheets", stylesheets)
            .with_var("scripts", scripts)
            .with_var("no_index", if self.no_index { NO_INDEX_META } else { "" })
            .with_var("version", self.version)
    }
}

/// Assemble the complete HTML document of a rendered page.
///
/// The template is compiled once per distinct source for the whole process.
pub fn assemble(params: &RenderParams, result: &RenderResult) -> Result<String> {
    let data = TemplateData::new(params, result);
    trace!(
        scripts = data.scripts.len(),
        stylesheets = data.stylesheets.len(),
        "assembling document"
    );

    let template = template::compiled(&params.template)?;
    Ok(template.render(&data.to_context())?)
}

/// Serialise head metadata into markup, one string per non-empty group.
#[must_use]
pub fn meta_attributes(head: &HeadMetadata) -> Vec<String> {
    let title = head
        .title
        .as_deref()
        .map(|title| format!("<title>{}</title>", escape_text(title)))
        .unwrap_or_default();

    [
        title,
        tags_html("meta", &head.meta),
        tags_html("link", &head.link),
        tags_html("script", &head.script),
    ]
    .into_iter()
    .filter(|group| !group.is_empty())
    .collect()
}

/// Serialise element attributes as `name="value"` pairs separated by spaces.
#[must_use]
pub fn attributes_html(attributes: &BTreeMap<String, String>) -> String {
    attributes
        .iter()
        .filter(|(name, _)| is_valid_attribute_name(name))
        .map(|(name, value)| {
            if value.is_empty() {
                name.clone()
            } else {
                format!(r#"{name}="{}""#, escape_attribute(value))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn tags_html(element: &str, tags: &[HeadTag]) -> String {
    tags.iter()
        .map(|tag| tag_html(element, tag))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tag_html(element: &str, tag: &HeadTag) -> String {
    let attributes = attributes_html(&tag.attributes);
    let open = if attributes.is_empty() {
        format!("<{element}>")
    } else {
        format!("<{element} {attributes}>")
    };

    if element == "script" {
        format!("{open}{}</script>", tag.content.as_deref().unwrap_or_default())
    } else {
        open
    }
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=' | '<'))
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use prerender_core::{CollectedMetadata, Manifest};

    use super::*;

    fn test_params() -> RenderParams {
        RenderParams::new("build")
            .with_base_url("/docs/")
            .with_manifest(
                Manifest::new()
                    .with_entrypoint("main")
                    .with_module("main", ["assets/js/main.js", "assets/css/styles.css"])
                    .with_module("@site/intro.md", ["assets/js/intro.js"]),
            )
    }

    fn test_result() -> RenderResult {
        let mut collected = CollectedMetadata {
            modules: vec!["@site/intro.md".to_string(), "unknown".to_string()],
            ..CollectedMetadata::default()
        };
        collected.head.html_attributes.insert("lang".to_string(), "en".to_string());
        collected.head.body_attributes.insert("class".to_string(), "docs-page".to_string());
        collected.head.title = Some("Intro & Setup".to_string());
        collected.head.meta.push(HeadTag::new([
            ("name", "description"),
            ("content", "Say \"hi\""),
        ]));

        RenderResult::new("<main><h1>Intro</h1></main>").with_collected(collected)
    }

    #[test]
    fn test_assemble_default_template() {
        let html = assemble(&test_params(), &test_result()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains(r#"<body class="docs-page">"#));
        assert!(html.contains("<title>Intro &amp; Setup</title>"));
        assert!(html.contains(r#"<meta content="Say &quot;hi&quot;" name="description">"#));
        assert!(html.contains(r#"<link rel="stylesheet" href="/docs/assets/css/styles.css">"#));
        assert!(html.contains(r#"<script src="/docs/assets/js/main.js" defer></script>"#));
        assert!(html.contains(r#"<script src="/docs/assets/js/intro.js" defer></script>"#));
        assert!(html.contains(r#"<div id="__prerender"><main><h1>Intro</h1></main></div>"#));
        assert!(!html.contains("noindex"));
    }

    #[test]
    fn test_scripts_keep_resolution_order() {
        let html = assemble(&test_params(), &test_result()).unwrap();
        let main = html.find("assets/js/main.js").unwrap();
        let intro = html.find("assets/js/intro.js").unwrap();
        assert!(main < intro);
    }

    #[test]
    fn test_no_index_and_static_fragments() {
        let mut params = test_params();
        params.no_index = true;
        params.head_tags = r#"<link rel="icon" href="/favicon.ico">"#.to_string();
        params.pre_body_tags = "<noscript>enable js</noscript>".to_string();
        params.post_body_tags = "<script>window.ready=true</script>".to_string();
        params.version = "9.9.9".to_string();

        let html = assemble(&params, &test_result()).unwrap();

        assert!(html.contains(NO_INDEX_META));
        assert!(html.contains(r#"<link rel="icon" href="/favicon.ico">"#));
        assert!(html.contains("<noscript>enable js</noscript>"));
        assert!(html.contains("<script>window.ready=true</script>"));
        assert!(html.contains(r#"content="prerender v9.9.9""#));
    }

    #[test]
    fn test_custom_template() {
        let params = test_params().with_template("<html>{{ app_html }}|{{ scripts }}</html>");
        let html = assemble(&params, &RenderResult::new("<p>x</p>")).unwrap();

        assert_eq!(
            html,
            r#"<html><p>x</p>|<script src="/docs/assets/js/main.js" defer></script></html>"#
        );
    }

    #[test]
    fn test_template_errors_surface() {
        let params = test_params().with_template("<html>{{ page_title }}</html>");
        let err = assemble(&params, &RenderResult::new("")).unwrap_err();
        assert!(err.to_string().contains("page_title"));

        let params = test_params().with_template("<html>{{ app_html");
        assert!(matches!(
            assemble(&params, &RenderResult::new("")),
            Err(HtmlError::Template(TemplateError::InvalidSyntax(_)))
        ));
    }

    #[test]
    fn test_meta_attributes_filter_empty_groups() {
        let mut head = HeadMetadata::default();
        assert!(meta_attributes(&head).is_empty());

        head.link.push(HeadTag::new([("rel", "canonical"), ("href", "https://x.dev/a")]));
        head.script.push(
            HeadTag::new([("type", "application/ld+json")]).with_content(r#"{"@type":"Thing"}"#),
        );

        let groups = meta_attributes(&head);
        assert_eq!(
            groups,
            vec![
                r#"<link href="https://x.dev/a" rel="canonical">"#.to_string(),
                r#"<script type="application/ld+json">{"@type":"Thing"}</script>"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_attributes_html() {
        let mut attributes = BTreeMap::new();
        attributes.insert("data-theme".to_string(), "dark".to_string());
        attributes.insert("hidden".to_string(), String::new());
        attributes.insert("bad name".to_string(), "x".to_string());

        assert_eq!(attributes_html(&attributes), r#"data-theme="dark" hidden"#);
        assert_eq!(attributes_html(&BTreeMap::new()), "");
    }
}
