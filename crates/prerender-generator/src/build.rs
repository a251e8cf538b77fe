//! Build orchestration.
//!
//! Renders every requested page over a bounded worker pool and reports the
//! outcome of the whole run: either the collected metadata of every page, or
//! one error naming every page that failed.

use std::{
    collections::HashMap,
    error::Error as StdError,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use prerender_core::{CollectedMetadata, DEFAULT_SSR_CONCURRENCY, RuntimeOverrides};
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder, prelude::*};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    minify::Minifier,
    params::RenderParams,
    renderer::{RendererLoadError, RendererLoader},
    task::{RenderError, TaskOutcome, run_task},
};

/// Generation errors.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The renderer could not be loaded; no page was attempted.
    #[error("failed to load renderer")]
    RendererLoad(#[from] RendererLoadError),

    /// The worker pool could not be started.
    #[error("failed to start render workers")]
    ThreadPool(#[from] ThreadPoolBuildError),

    /// One or more pages failed.
    #[error(transparent)]
    Aggregated(#[from] AggregatedGenerationError),
}

/// Result type for generation.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Every page failure of a run, in the order the paths were requested.
#[derive(Debug)]
pub struct AggregatedGenerationError {
    failures: Vec<RenderError>,
}

impl AggregatedGenerationError {
    /// Aggregate page failures.
    #[must_use]
    pub fn new(failures: Vec<RenderError>) -> Self {
        Self { failures }
    }

    /// The individual failures.
    #[must_use]
    pub fn failures(&self) -> &[RenderError] {
        &self.failures
    }

    /// Paths that failed.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.path.as_str())
    }

    /// Number of failed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Take the individual failures.
    #[must_use]
    pub fn into_failures(self) -> Vec<RenderError> {
        self.failures
    }
}

impl fmt::Display for AggregatedGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "static site generation failed for {} path(s):",
            self.failures.len()
        )?;
        for path in self.paths() {
            write!(f, "\n- {path}")?;
        }
        Ok(())
    }
}

impl StdError for AggregatedGenerationError {}

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of pages written.
    pub pages: usize,

    /// Number of pages that failed.
    pub failures: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of a fully successful run.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Collected metadata of every page, keyed by path.
    pub collected: HashMap<String, CollectedMetadata>,

    /// Run statistics.
    pub stats: BuildStats,
}

/// Static site builder that renders pages in parallel.
#[derive(Debug, Clone)]
pub struct Builder {
    params: Arc<RenderParams>,
    concurrency: usize,
    minifier: Minifier,
}

impl Builder {
    /// Create a new builder with the default concurrency and minification on.
    #[must_use]
    pub fn new(params: impl Into<Arc<RenderParams>>) -> Self {
        Self {
            params: params.into(),
            concurrency: DEFAULT_SSR_CONCURRENCY,
            minifier: Minifier::new(),
        }
    }

    /// Set the maximum number of pages rendered at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the minifier.
    #[must_use]
    pub fn with_minifier(mut self, minifier: Minifier) -> Self {
        self.minifier = minifier;
        self
    }

    /// Apply environment overrides on top of the current settings.
    #[must_use]
    pub fn with_overrides(self, overrides: &RuntimeOverrides) -> Self {
        let concurrency = overrides.concurrency_or(self.concurrency);
        let minify = overrides.minify_or(self.minifier.is_enabled());

        self.with_concurrency(concurrency)
            .with_minifier(Minifier::new().with_enabled(minify))
    }

    /// Shared render parameters.
    #[must_use]
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Maximum number of pages rendered at once.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The minifier applied to every page.
    #[must_use]
    pub fn minifier(&self) -> Minifier {
        self.minifier
    }

    /// Render and write every path.
    ///
    /// The renderer is loaded once before any page is attempted. All paths are
    /// attempted even when some fail; pages that succeeded stay on disk.
    pub fn generate<S>(&self, paths: &[S], loader: &dyn RendererLoader) -> Result<GenerationOutput>
    where
        S: AsRef<str> + Sync,
    {
        let start = Instant::now();
        let renderer = loader.load()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|index| format!("prerender-{index}"))
            .build()?;

        info!(
            paths = paths.len(),
            concurrency = self.concurrency,
            minify = self.minifier.is_enabled(),
            output = %self.params.output_dir.display(),
            "starting static site generation"
        );

        let params = self.params.as_ref();
        let minifier = &self.minifier;
        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| run_task(path.as_ref(), renderer.as_ref(), params, minifier))
                .collect()
        });

        let mut stats = BuildStats::default();
        let mut collected = HashMap::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                TaskOutcome::Success { path, result } => {
                    stats.pages += 1;
                    collected.insert(path, result.collected);
                }
                TaskOutcome::Failure { error, .. } => failures.push(error),
            }
        }

        stats.failures = failures.len();
        stats.duration_ms = duration_ms(start.elapsed());

        if !failures.is_empty() {
            for failure in &failures {
                error!(
                    path = %failure.path,
                    error = %error_chain(failure),
                    "failed to render page"
                );
            }
            error!(
                pages = stats.pages,
                failures = stats.failures,
                duration_ms = stats.duration_ms,
                "static site generation failed"
            );
            return Err(AggregatedGenerationError::new(failures).into());
        }

        info!(
            pages = stats.pages,
            duration_ms = stats.duration_ms,
            "static site generation complete"
        );

        Ok(GenerationOutput { collected, stats })
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// An error and all of its causes, joined with `: `.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
