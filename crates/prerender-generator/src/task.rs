//! Page render task.
//!
//! Renders, assembles, minifies and writes a single page. Every failure along
//! the way is reported as a [`RenderError`] naming the page path.

use std::{
    any::Any,
    fs, io,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
};

use prerender_core::RenderResult;
use thiserror::Error;
use tracing::{debug, debug_span};

use crate::{
    html::{self, HtmlError},
    minify::{MinificationError, Minifier},
    output::output_file_path,
    params::RenderParams,
    renderer::{BoxError, Renderer},
};

/// What went wrong while producing one page.
#[derive(Debug, Error)]
pub enum PageError {
    /// The renderer failed.
    #[error("renderer failed")]
    Render(#[source] BoxError),

    /// The document could not be assembled.
    #[error("document assembly failed")]
    Html(#[from] HtmlError),

    /// The document could not be minified.
    #[error("document minification failed")]
    Minify(#[from] MinificationError),

    /// The document could not be written.
    #[error("failed to write {}", file.display())]
    Write {
        file: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The task panicked.
    #[error("render task panicked: {0}")]
    Panic(String),
}

/// Failure to produce the static file of one page path.
#[derive(Debug, Error)]
#[error("can't render static file for path \"{path}\"")]
pub struct RenderError {
    /// The page path that failed.
    pub path: String,

    /// What went wrong.
    #[source]
    pub source: PageError,
}

impl RenderError {
    /// Create an error for `path`.
    pub fn new(path: impl Into<String>, source: PageError) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of one page task, collected by the orchestrator.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The page was written.
    Success { path: String, result: RenderResult },

    /// The page failed.
    Failure { path: String, error: RenderError },
}

impl TaskOutcome {
    /// The page path this outcome belongs to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Success { path, .. } | Self::Failure { path, .. } => path,
        }
    }

    /// Whether the page was written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Render one page and write it below the output directory.
///
/// Returns the renderer's result; the final document only goes to disk.
pub fn render_page(
    path: &str,
    renderer: &dyn Renderer,
    params: &RenderParams,
    minifier: &Minifier,
) -> Result<RenderResult, RenderError> {
    let _span = debug_span!("render_page", path).entered();

    try_render_page(path, renderer, params, minifier)
        .map_err(|source| RenderError::new(path, source))
}

/// Run a page task and turn any error or panic into a [`TaskOutcome`].
pub fn run_task(
    path: &str,
    renderer: &dyn Renderer,
    params: &RenderParams,
    minifier: &Minifier,
) -> TaskOutcome {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        render_page(path, renderer, params, minifier)
    }));

    match outcome {
        Ok(Ok(result)) => TaskOutcome::Success {
            path: path.to_string(),
            result,
        },
        Ok(Err(error)) => TaskOutcome::Failure {
            path: path.to_string(),
            error,
        },
        Err(payload) => TaskOutcome::Failure {
            path: path.to_string(),
            error: RenderError::new(path, PageError::Panic(panic_message(payload.as_ref()))),
        },
    }
}

/// Write a document to the file `path` maps to, creating parent directories.
pub fn write_static_file(
    params: &RenderParams,
    path: &str,
    content: &str,
) -> Result<PathBuf, PageError> {
    let file = output_file_path(
        &params.output_dir,
        path,
        &params.base_url,
        params.trailing_slash,
    );

    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|source| PageError::Write {
            file: file.clone(),
            source,
        })?;
    }
    fs::write(&file, content).map_err(|source| PageError::Write {
        file: file.clone(),
        source,
    })?;

    Ok(file)
}

fn try_render_page(
    path: &str,
    renderer: &dyn Renderer,
    params: &RenderParams,
    minifier: &Minifier,
) -> Result<RenderResult, PageError> {
    let result = renderer.render(path, params).map_err(PageError::Render)?;
    let document = html::assemble(params, &result)?;
    let document = minifier.minify(&document)?;
    let file = write_static_file(params, path, &document)?;

    debug!(file = %file.display(), bytes = document.len(), "wrote page");
    Ok(result)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use tempfile::TempDir;

    use super::*;

    fn ok_renderer(path: &str, _params: &RenderParams) -> Result<RenderResult, BoxError> {
        Ok(RenderResult::new(format!("<h1>{path}</h1>")))
    }

    fn test_params(dir: &TempDir) -> RenderParams {
        RenderParams::new(dir.path()).with_base_url("/docs/")
    }

    #[test]
    fn test_render_page_writes_document() {
        let dir = TempDir::new().unwrap();
        let params = test_params(&dir);

        let result =
            render_page("/docs/guide/intro", &ok_renderer, &params, &Minifier::new()).unwrap();

        assert_eq!(result.html, "<h1>/docs/guide/intro</h1>");
        let written = fs::read_to_string(dir.path().join("guide/intro/index.html")).unwrap();
        assert!(written.contains("<h1>/docs/guide/intro</h1>"));
    }

    #[test]
    fn test_trailing_slash_policy_applied() {
        let dir = TempDir::new().unwrap();
        let params = test_params(&dir).with_trailing_slash(Some(false));

        render_page("/docs/guide/intro", &ok_renderer, &params, &Minifier::new()).unwrap();

        assert!(dir.path().join("guide/intro.html").is_file());
    }

    #[test]
    fn test_existing_file_overwritten() {
        let dir = TempDir::new().unwrap();
        let params = test_params(&dir);
        fs::write(dir.path().join("index.html"), "stale").unwrap();

        render_page("/docs/", &ok_renderer, &params, &Minifier::disabled()).unwrap();

        let written = fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(written.contains("<h1>/docs/</h1>"));
    }

    #[test]
    fn test_renderer_failure_names_path() {
        let dir = TempDir::new().unwrap();
        let failing = |_: &str, _: &RenderParams| -> Result<RenderResult, BoxError> {
            Err("component threw".into())
        };

        let err = render_page("/docs/broken", &failing, &test_params(&dir), &Minifier::new())
            .unwrap_err();

        assert_eq!(err.path, "/docs/broken");
        assert_eq!(
            err.to_string(),
            r#"can't render static file for path "/docs/broken""#
        );
        assert!(matches!(err.source, PageError::Render(_)));
        let cause = err.source().and_then(|e| e.source()).unwrap();
        assert_eq!(cause.to_string(), "component threw");
        assert!(!dir.path().join("broken/index.html").exists());
    }

    #[test]
    fn test_template_failure() {
        let dir = TempDir::new().unwrap();
        let params = test_params(&dir).with_template("{{ missing_variable }}");

        let err = render_page("/docs/a", &ok_renderer, &params, &Minifier::new()).unwrap_err();
        assert!(matches!(err.source, PageError::Html(_)));
    }

    #[test]
    fn test_write_failure() {
        let dir = TempDir::new().unwrap();
        // A file where the page directory should go.
        fs::write(dir.path().join("blocked"), "").unwrap();

        let params = test_params(&dir);
        let err =
            render_page("/docs/blocked/page", &ok_renderer, &params, &Minifier::new()).unwrap_err();
        assert!(matches!(err.source, PageError::Write { .. }));
    }

    #[test]
    fn test_run_task_outcomes() {
        let dir = TempDir::new().unwrap();
        let params = test_params(&dir);

        let outcome = run_task("/docs/ok", &ok_renderer, &params, &Minifier::new());
        assert!(outcome.is_success());
        assert_eq!(outcome.path(), "/docs/ok");

        let failing = |_: &str, _: &RenderParams| -> Result<RenderResult, BoxError> {
            Err("nope".into())
        };
        let outcome = run_task("/docs/bad", &failing, &params, &Minifier::new());
        assert!(matches!(outcome, TaskOutcome::Failure { ref path, .. } if path == "/docs/bad"));
    }

    #[test]
    fn test_run_task_captures_panic() {
        let dir = TempDir::new().unwrap();
        let panicking = |path: &str, _: &RenderParams| -> Result<RenderResult, BoxError> {
            panic!("renderer blew up on {path}")
        };

        let outcome = run_task("/docs/panic", &panicking, &test_params(&dir), &Minifier::new());

        match outcome {
            TaskOutcome::Failure { error, .. } => match error.source {
                PageError::Panic(message) => {
                    assert_eq!(message, "renderer blew up on /docs/panic");
                }
                other => panic!("unexpected error: {other}"),
            },
            TaskOutcome::Success { .. } => panic!("panicking renderer succeeded"),
        }
    }
}
