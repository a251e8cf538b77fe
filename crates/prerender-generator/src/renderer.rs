//! Renderer capability.
//!
//! A [`Renderer`] turns a page path into its markup and collected metadata. The
//! orchestrator obtains exactly one renderer per run from a [`RendererLoader`];
//! [`CommandLoader`] loads an executable rendering artifact that speaks JSON on
//! stdout.

use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::Arc,
};

use prerender_core::RenderResult;
use thiserror::Error;
use tracing::{info, trace};

use crate::params::RenderParams;

/// Boxed error produced by renderers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Environment variable carrying the site base URL to command renderers.
pub const BASE_URL_ENV: &str = "PRERENDER_BASE_URL";

/// Environment variable carrying the site version to command renderers.
pub const VERSION_ENV: &str = "PRERENDER_VERSION";

/// Produces the markup of one page.
///
/// One renderer is shared by every page task of a run, so implementations must
/// tolerate concurrent calls.
pub trait Renderer: Send + Sync {
    /// Render the page at `path`.
    fn render(&self, path: &str, params: &RenderParams) -> Result<RenderResult, BoxError>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &RenderParams) -> Result<RenderResult, BoxError> + Send + Sync,
{
    fn render(&self, path: &str, params: &RenderParams) -> Result<RenderResult, BoxError> {
        self(path, params)
    }
}

/// Renderer loading errors.
#[derive(Debug, Error)]
pub enum RendererLoadError {
    /// The rendering artifact does not exist.
    #[error("renderer not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The rendering artifact is a directory or special file.
    #[error("renderer is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The rendering artifact lacks execute permission.
    #[error("renderer is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    /// The rendering artifact could not be inspected.
    #[error("failed to inspect renderer {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other loader failure.
    #[error("failed to load renderer")]
    Other(#[source] BoxError),
}

/// Loads the renderer used for a whole generation run.
pub trait RendererLoader {
    /// Load the renderer.
    fn load(&self) -> Result<Arc<dyn Renderer>, RendererLoadError>;
}

impl<F> RendererLoader for F
where
    F: Fn() -> Result<Arc<dyn Renderer>, RendererLoadError>,
{
    fn load(&self) -> Result<Arc<dyn Renderer>, RendererLoadError> {
        self()
    }
}

/// Loader for an executable rendering artifact.
///
/// The artifact is invoked as `program [args..] <path>` once per page and must
/// print the page's [`RenderResult`] as JSON on stdout.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandLoader {
    /// Loader for `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments passed before the page path, e.g. a script for an interpreter.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path of the rendering artifact.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl RendererLoader for CommandLoader {
    fn load(&self) -> Result<Arc<dyn Renderer>, RendererLoadError> {
        let metadata = match fs::metadata(&self.program) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RendererLoadError::NotFound(self.program.clone()));
            }
            Err(source) => {
                return Err(RendererLoadError::Io {
                    path: self.program.clone(),
                    source,
                });
            }
        };

        if !metadata.is_file() {
            return Err(RendererLoadError::NotAFile(self.program.clone()));
        }
        if !is_executable(&metadata) {
            return Err(RendererLoadError::NotExecutable(self.program.clone()));
        }

        info!(
            program = %self.program.display(),
            args = self.args.len(),
            "loaded command renderer"
        );

        Ok(Arc::new(CommandRenderer {
            program: self.program.clone(),
            args: self.args.clone(),
        }))
    }
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Command renderer errors.
#[derive(Debug, Error)]
pub enum CommandRenderError {
    /// The process could not be started.
    #[error("failed to run renderer {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("renderer exited unsuccessfully ({status}): {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    /// The process printed something that is not a render result.
    #[error("renderer printed an invalid render result")]
    Output(#[source] serde_json::Error),
}

/// Renderer backed by an external executable.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Renderer for CommandRenderer {
    fn render(&self, path: &str, params: &RenderParams) -> Result<RenderResult, BoxError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .env(BASE_URL_ENV, &params.base_url)
            .env(VERSION_ENV, &params.version)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| CommandRenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandRenderError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let result: RenderResult =
            serde_json::from_slice(&output.stdout).map_err(CommandRenderError::Output)?;
        trace!(path, bytes = output.stdout.len(), "parsed renderer output");

        Ok(result)
    }
}
