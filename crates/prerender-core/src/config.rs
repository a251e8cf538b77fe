//! Generation configuration management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    manifest::Manifest,
};

/// Number of pages rendered in parallel when nothing overrides it.
pub const DEFAULT_SSR_CONCURRENCY: usize = 32;

/// Prefix of the environment variables read by [`RuntimeOverrides`] and
/// [`Config::load_with_env`].
pub const ENV_PREFIX: &str = "PRERENDER";

/// Main configuration structure for prerender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL every page path lives under (e.g., "/docs/").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Trailing-slash policy. `None` keeps the legacy `<path>/index.html` layout.
    #[serde(default)]
    pub trailing_slash: Option<bool>,

    /// Ask search engines not to index the generated pages.
    #[serde(default)]
    pub no_index: bool,

    /// Version tag exposed to the document template.
    #[serde(default)]
    pub version: Option<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Output directory for generated pages.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path to the SSR document template. The built-in template is used when unset.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Path to the client asset manifest (JSON).
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Markup injected at the end of `<head>`.
    #[serde(default)]
    pub head_tags: String,

    /// Markup injected right after `<body>`.
    #[serde(default)]
    pub pre_body_tags: String,

    /// Markup injected right before `</body>`.
    #[serde(default)]
    pub post_body_tags: String,

    /// Maximum number of pages rendered at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Whether to minify HTML output.
    #[serde(default = "default_true")]
    pub minify: bool,
}

// Default value functions
fn default_base_url() -> String {
    "/".to_string()
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_SSR_CONCURRENCY
}

fn default_true() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            trailing_slash: None,
            no_index: false,
            version: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            template: None,
            manifest: None,
            head_tags: String::new(),
            pre_body_tags: String::new(),
            post_body_tags: String::new(),
            concurrency: default_concurrency(),
            minify: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, layering
    /// `PRERENDER__SECTION__KEY` environment variables over the file.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.base_url.is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if !self.site.base_url.starts_with('/') {
            return Err(CoreError::config("site.base_url must start with '/'"));
        }

        if !self.site.base_url.ends_with('/') {
            tracing::warn!(
                base_url = %self.site.base_url,
                "site.base_url should end with a slash, one will be added"
            );
        }

        if self.build.output_dir.is_empty() {
            return Err(CoreError::config("build.output_dir cannot be empty"));
        }

        if self.build.concurrency == 0 {
            return Err(CoreError::config("build.concurrency must be greater than zero"));
        }

        Ok(())
    }

    /// Base URL with exactly one trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/", self.site.base_url.trim_end_matches('/'))
    }

    /// Read the configured SSR template, if any.
    pub fn load_template(&self) -> Result<Option<String>> {
        let Some(path) = &self.build.template else {
            return Ok(None);
        };

        std::fs::read_to_string(path).map(Some).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to read template: {}", path.display()),
                e,
            )
        })
    }

    /// Read the configured asset manifest, or an empty one when unset.
    pub fn load_manifest(&self) -> Result<Manifest> {
        match &self.build.manifest {
            Some(path) => Manifest::load(path),
            None => Ok(Manifest::default()),
        }
    }
}

/// Overrides read from the environment once at the start of a run.
///
/// `PRERENDER_SSR_CONCURRENCY` caps the number of pages rendered in parallel and
/// `PRERENDER_SKIP_HTML_MINIFICATION` writes assembled documents untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuntimeOverrides {
    #[serde(default)]
    pub ssr_concurrency: Option<usize>,

    #[serde(default)]
    pub skip_html_minification: Option<bool>,
}

impl RuntimeOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Read overrides from an explicit set of variables instead of the
    /// process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: config::Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::from_environment(config::Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        let overrides: Self = settings.try_deserialize()?;
        if overrides.ssr_concurrency == Some(0) {
            return Err(CoreError::config(
                "PRERENDER_SSR_CONCURRENCY must be greater than zero",
            ));
        }

        Ok(overrides)
    }

    /// Concurrency to use, given the configured value.
    #[must_use]
    pub fn concurrency_or(&self, configured: usize) -> usize {
        self.ssr_concurrency.unwrap_or(configured)
    }

    /// Whether minification should run, given the configured value.
    #[must_use]
    pub fn minify_or(&self, configured: bool) -> bool {
        match self.skip_html_minification {
            Some(skip) => !skip,
            None => configured,
        }
    }
}
