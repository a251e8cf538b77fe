//! Build command - renders the listed pages to static HTML

use std::{fs, path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use prerender_core::{Config, RuntimeOverrides};
use prerender_generator::{Builder, CommandLoader, Minifier, RenderParams};

/// Options of the build command.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions<'a> {
    /// Server rendering artifact.
    pub renderer: &'a Path,
    /// Arguments passed to the renderer before the page path.
    pub renderer_args: &'a [String],
    /// File listing the page paths.
    pub paths: &'a Path,
    /// Output directory override.
    pub output: Option<&'a Path>,
    /// Skip HTML minification.
    pub no_minify: bool,
}

/// Run the build command.
///
/// Renders every listed page through the renderer into the output directory.
pub fn run(config_path: &Path, options: &BuildOptions<'_>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?options, "Starting build");

    // Load configuration, falling back to defaults when there is no file
    let mut config = if config_path.exists() {
        Config::load_with_env(config_path).wrap_err("Failed to load configuration")?
    } else {
        tracing::warn!(?config_path, "Configuration file not found, using defaults");
        Config::default()
    };

    // Override output directory if specified
    if let Some(output) = options.output {
        config.build.output_dir = output.to_string_lossy().to_string();
    }

    if options.no_minify {
        config.build.minify = false;
    }

    config.validate().wrap_err("Invalid configuration")?;
    tracing::debug!(?config, "Loaded configuration");

    let overrides =
        RuntimeOverrides::from_env().wrap_err("Invalid PRERENDER_* environment overrides")?;
    let manifest = config
        .load_manifest()
        .wrap_err("Failed to load asset manifest")?;
    let template = config
        .load_template()
        .wrap_err("Failed to load SSR template")?;

    let paths = read_paths(options.paths)?;
    if paths.is_empty() {
        tracing::warn!(paths = ?options.paths, "No page paths to render");
    }

    let params = RenderParams::from_config(&config, manifest, template);
    let output_dir = params.output_dir.clone();
    let builder = Builder::new(params)
        .with_concurrency(config.build.concurrency)
        .with_minifier(Minifier::new().with_enabled(config.build.minify))
        .with_overrides(&overrides);

    let loader = CommandLoader::new(options.renderer).with_args(options.renderer_args);
    let output = builder
        .generate(&paths, &loader)
        .wrap_err("Static site generation failed")?;

    let duration = start.elapsed();
    let stats = &output.stats;

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:       {}", stats.pages);
    println!("  Concurrency: {}", builder.concurrency());
    println!("  Minified:    {}", builder.minifier().is_enabled());
    println!();
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!("  Output:      {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}

/// Read page paths from a file.
pub fn read_paths(file: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(file)
        .wrap_err_with(|| format!("Failed to read page paths from {}", file.display()))?;
    Ok(parse_paths(&content))
}

/// One path per line; blank lines and `#` comments are skipped.
#[must_use]
pub fn parse_paths(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}
