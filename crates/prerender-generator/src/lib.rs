//! Prerender Generator Library
//!
//! Static site generation engine for prerender: renders every page path of a
//! site through a renderer, wraps the markup into a full HTML document and
//! writes it to disk.
//!
//! # Modules
//!
//! - [`output`] - Page path to output file mapping
//! - [`assets`] - Script and stylesheet resolution from the client manifest
//! - [`template`] - Document template system with a process-wide compiled cache
//! - [`html`] - HTML document assembly
//! - [`minify`] - HTML minification
//! - [`renderer`] - Renderer capability and loaders
//! - [`task`] - Single page render task
//! - [`build`] - Build orchestration

pub mod assets;
pub mod build;
pub mod html;
pub mod minify;
pub mod output;
pub mod params;
pub mod renderer;
pub mod task;
pub mod template;

pub use assets::{AssetBundles, resolve_bundles};
pub use build::{AggregatedGenerationError, BuildStats, Builder, GenerateError, GenerationOutput};
pub use html::{HtmlError, TemplateData, assemble};
pub use minify::{MinificationError, Minifier};
pub use output::{output_file_name, output_file_path, strip_base_url};
pub use params::{GENERATOR_VERSION, RenderParams};
pub use renderer::{
    BoxError, CommandLoader, CommandRenderError, CommandRenderer, Renderer, RendererLoadError,
    RendererLoader,
};
pub use task::{PageError, RenderError, TaskOutcome, render_page};
pub use template::{DEFAULT_SSR_TEMPLATE, Template, TemplateCache, TemplateContext, TemplateError};
