//! Parameters shared by every page of a generation run.

use std::path::PathBuf;

use prerender_core::{Config, Manifest};

use crate::template::DEFAULT_SSR_TEMPLATE;

/// Version tag used when the configuration does not set one.
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Read-only inputs of one generation run.
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// Base URL, always ending with `/`.
    pub base_url: String,

    /// Trailing-slash policy; `None` is the legacy layout.
    pub trailing_slash: Option<bool>,

    /// Directory pages are written to.
    pub output_dir: PathBuf,

    /// Markup injected at the end of `<head>`.
    pub head_tags: String,

    /// Markup injected right after `<body>`.
    pub pre_body_tags: String,

    /// Markup injected right before `</body>`.
    pub post_body_tags: String,

    /// Client asset manifest.
    pub manifest: Manifest,

    /// SSR document template source.
    pub template: String,

    /// Version tag exposed to the template.
    pub version: String,

    /// Ask search engines not to index the pages.
    pub no_index: bool,
}

impl RenderParams {
    /// Parameters with defaults for everything but the output directory.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: "/".to_string(),
            trailing_slash: None,
            output_dir: output_dir.into(),
            head_tags: String::new(),
            pre_body_tags: String::new(),
            post_body_tags: String::new(),
            manifest: Manifest::default(),
            template: DEFAULT_SSR_TEMPLATE.to_string(),
            version: GENERATOR_VERSION.to_string(),
            no_index: false,
        }
    }

    /// Build parameters from a loaded configuration.
    ///
    /// `template` is the SSR template source; the built-in template is used
    /// when it is `None`.
    #[must_use]
    pub fn from_config(config: &Config, manifest: Manifest, template: Option<String>) -> Self {
        Self {
            base_url: config.base_url(),
            trailing_slash: config.site.trailing_slash,
            output_dir: PathBuf::from(&config.build.output_dir),
            head_tags: config.build.head_tags.clone(),
            pre_body_tags: config.build.pre_body_tags.clone(),
            post_body_tags: config.build.post_body_tags.clone(),
            manifest,
            template: template.unwrap_or_else(|| DEFAULT_SSR_TEMPLATE.to_string()),
            version: config
                .site
                .version
                .clone()
                .unwrap_or_else(|| GENERATOR_VERSION.to_string()),
            no_index: config.site.no_index,
        }
    }

    /// Set the base URL, adding the trailing slash if missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = format!("{}/", base_url.trim_end_matches('/'));
        self
    }

    /// Set the trailing-slash policy.
    #[must_use]
    pub fn with_trailing_slash(mut self, trailing_slash: Option<bool>) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    /// Set the asset manifest.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Set the template source.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.site.base_url = "/docs".to_string();
        config.site.trailing_slash = Some(true);
        config.site.no_index = true;
        config.build.output_dir = "dist".to_string();
        config.build.head_tags = "<link rel=\"icon\" href=\"/favicon.ico\">".to_string();

        let manifest = Manifest::new().with_entrypoint("main");
        let params = RenderParams::from_config(&config, manifest, None);

        assert_eq!(params.base_url, "/docs/");
        assert_eq!(params.trailing_slash, Some(true));
        assert!(params.no_index);
        assert_eq!(params.output_dir, PathBuf::from("dist"));
        assert_eq!(params.template, DEFAULT_SSR_TEMPLATE);
        assert_eq!(params.version, GENERATOR_VERSION);
        assert_eq!(params.manifest.entrypoints, vec!["main"]);
        assert!(params.head_tags.contains("favicon"));
    }

    #[test]
    fn test_from_config_custom_template_and_version() {
        let mut config = Config::default();
        config.site.version = Some("2.0.0".to_string());

        let params =
            RenderParams::from_config(&config, Manifest::new(), Some("{{ app_html }}".to_string()));

        assert_eq!(params.template, "{{ app_html }}");
        assert_eq!(params.version, "2.0.0");
    }

    #[test]
    fn test_with_base_url() {
        let params = RenderParams::new("out").with_base_url("/blog");
        assert_eq!(params.base_url, "/blog/");

        let params = RenderParams::new("out").with_base_url("/");
        assert_eq!(params.base_url, "/");
    }
}
