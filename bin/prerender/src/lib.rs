//! prerender CLI Library
//!
//! This library provides the core functionality for the prerender CLI.
//! It is designed to be used by the binary entry point while also exposing
//! public APIs for documentation and integration purposes.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use prerender::cmd::build::{self, BuildOptions};
//!
//! let options = BuildOptions {
//!     renderer: Path::new("dist/server.bin"),
//!     renderer_args: &[],
//!     paths: Path::new("paths.txt"),
//!     output: None,
//!     no_minify: false,
//! };
//! build::run(Path::new("prerender.toml"), &options).unwrap();
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use prerender_core::{Config, RuntimeOverrides};
pub use prerender_generator::{BuildStats, Builder, GenerationOutput, RenderParams};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// prerender::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
