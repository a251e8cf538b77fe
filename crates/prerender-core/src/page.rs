//! Per-page render output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What a renderer produces for one page path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderResult {
    /// Rendered application markup, inserted into the document body.
    pub html: String,

    /// Data collected while rendering.
    #[serde(default)]
    pub collected: CollectedMetadata,
}

impl RenderResult {
    /// Create a result with the given markup and no collected data.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            collected: CollectedMetadata::default(),
        }
    }

    /// Attach collected metadata.
    #[must_use]
    pub fn with_collected(mut self, collected: CollectedMetadata) -> Self {
        self.collected = collected;
        self
    }
}

/// Side data gathered while rendering a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectedMetadata {
    /// Head elements and root attributes requested by the page.
    #[serde(default)]
    pub head: HeadMetadata,

    /// Identifiers of the modules the page used; resolved against the manifest.
    #[serde(default)]
    pub modules: Vec<String>,

    /// Element ids present on the page.
    #[serde(default)]
    pub anchors: Vec<String>,

    /// Links found on the page.
    #[serde(default)]
    pub links: Vec<String>,

    /// Anything else the renderer chose to surface.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Head metadata collected for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadMetadata {
    /// Attributes of the `<html>` element.
    #[serde(default)]
    pub html_attributes: BTreeMap<String, String>,

    /// Attributes of the `<body>` element.
    #[serde(default)]
    pub body_attributes: BTreeMap<String, String>,

    /// Document title.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub meta: Vec<HeadTag>,

    #[serde(default)]
    pub link: Vec<HeadTag>,

    #[serde(default)]
    pub script: Vec<HeadTag>,
}

/// A single `<meta>`, `<link>` or `<script>` element.
///
/// An attribute with an empty value is written as a bare boolean attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTag {
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Inner content, only meaningful for `<script>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl HeadTag {
    /// Create a tag from attribute pairs.
    #[must_use]
    pub fn new<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            content: None,
        }
    }

    /// Set the inner content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_result_from_minimal_json() {
        let result: RenderResult = serde_json::from_str(r#"{"html": "<p>hi</p>"}"#).unwrap();
        assert_eq!(result.html, "<p>hi</p>");
        assert_eq!(result.collected, CollectedMetadata::default());
    }

    #[test]
    fn test_render_result_from_full_json() {
        let json = r#"{
  "html": "<main>Intro</main>",
  "collected": {
    "head": {
      "html_attributes": {"lang": "en"},
      "title": "Intro",
      "meta": [{"attributes": {"name": "description", "content": "Getting started"}}],
      "script": [{"attributes": {"type": "application/ld+json"}, "content": "{}"}]
    },
    "modules": ["@site/docs/intro.md"],
    "anchors": ["install"],
    "links": ["/docs/next"],
    "extra": {"word_count": 120}
  }
}"#;
        let result: RenderResult = serde_json::from_str(json).unwrap();
        let collected = &result.collected;

        assert_eq!(collected.head.html_attributes["lang"], "en");
        assert_eq!(collected.head.title.as_deref(), Some("Intro"));
        assert_eq!(collected.head.meta[0].attributes["content"], "Getting started");
        assert_eq!(collected.head.script[0].content.as_deref(), Some("{}"));
        assert_eq!(collected.modules, vec!["@site/docs/intro.md"]);
        assert_eq!(collected.anchors, vec!["install"]);
        assert_eq!(collected.links, vec!["/docs/next"]);
        assert_eq!(collected.extra["word_count"], 120);
    }

    #[test]
    fn test_head_tag_builder() {
        let tag = HeadTag::new([("src", "/x.js"), ("async", "")]).with_content("");
        assert_eq!(tag.attributes.len(), 2);
        assert_eq!(tag.content.as_deref(), Some(""));
    }
}
