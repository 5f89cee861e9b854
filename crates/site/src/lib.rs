//! The incremental build engine.
//!
//! A [`Site`] ties three storage backends (content, templates, output) to a
//! configuration snapshot and drives the pipeline: scan sources into units,
//! load templates and persisted state, plan the minimal set of work, render
//! with bounded concurrency, regenerate aggregate artifacts, persist state.
//!
//! The engine's contract is that an incremental run produces byte-identical
//! output to a full rebuild of the same inputs; the persisted state is only
//! ever an optimisation, never a source of truth. Whenever state is absent
//! or suspect, the engine errs toward redoing work.

mod build;
pub mod error;
mod fingerprint;
mod plan;
mod report;
mod scan;
mod state;

pub use crate::plan::{BuildMode, BuildPlan, PlannedUnit, StaleEntry};
pub use crate::report::{AggregateFailure, BuildReport, FailureStage, StaleOutput, UnitFailure};
pub use crate::scan::ScanOutcome;
pub use crate::state::{BuildState, STATE_FILE, UnitRecord};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use plume_config::SiteConfig;
use plume_render::{Renderer, TemplateSet};
use plume_storage::{BackendHandle, LocalBackend};
use std::path::Path;
use std::sync::Arc;

/// One site: configuration plus the three storage roots a build touches.
pub struct Site {
    config: SiteConfig,
    content: BackendHandle,
    templates: BackendHandle,
    output: BackendHandle,
}

impl Site {
    /// Opens a site on the local filesystem using the configured paths,
    /// resolved against the working directory when relative.
    pub fn open(config: SiteConfig) -> Result<Self> {
        let cwd = std::env::current_dir().or_raise(|| ErrorKind::Storage)?;
        let backend = |name: &str, path: &Path| -> Result<BackendHandle> {
            let root = if path.is_absolute() { path.to_path_buf() } else { cwd.join(path) };
            Ok(Arc::new(LocalBackend::new(name, root).or_raise(|| ErrorKind::Storage)?))
        };
        Ok(Self {
            content: backend("content", &config.paths.content)?,
            templates: backend("templates", &config.paths.templates)?,
            output: backend("output", &config.paths.output)?,
            config,
        })
    }

    /// Assembles a site from explicit backends. Tests use this with
    /// in-memory backends; nothing else should need it.
    pub fn with_backends(
        config: SiteConfig,
        content: BackendHandle,
        templates: BackendHandle,
        output: BackendHandle,
    ) -> Self {
        Self { config, content, templates, output }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Runs one build and persists the resulting state.
    ///
    /// The returned report is the authoritative account of the run: callers
    /// must check [`BuildReport::success`] rather than rely on `Ok` alone,
    /// since unit and aggregate failures are isolated into the report. `Err`
    /// is reserved for conditions that prevent the run as a whole — an
    /// unscannable content directory, an uncompilable template set, or
    /// state that cannot be persisted.
    #[tracing::instrument(skip(self), fields(mode = ?mode))]
    pub async fn build(&self, mode: BuildMode) -> Result<BuildReport> {
        let templates = self.template_set().await?;
        let renderer = Renderer::new(&templates, &self.config.site).or_raise(|| ErrorKind::Templates)?;
        let scanned = scan::scan(&self.content, self.config.build.include_drafts).await?;

        let loaded = state::BuildState::load(&self.output).await;
        let mode = if loaded.corrupted { BuildMode::Full } else { mode };
        let plan =
            plan::plan(scanned.units, &scanned.failed, &templates, &self.config, &loaded.state, mode);
        tracing::info!(
            rebuild = plan.rebuild.len(),
            skipped = plan.skipped.len(),
            stale = plan.stale.len(),
            aggregates = plan.aggregates,
            "Planned build"
        );

        let (mut report, new_state) = build::execute(
            plan,
            renderer,
            &templates,
            &self.config,
            &self.output,
            loaded.state,
            loaded.corrupted,
        )
        .await;
        report.failures.extend(scanned.failures);

        // State persists exactly once, after all outputs have settled. An
        // interruption before this point loses only the record of work done,
        // which the next run will redo.
        new_state.persist(&self.output).await?;
        Ok(report)
    }

    /// Computes the plan for an incremental run without performing any of
    /// its work or touching persisted state.
    pub async fn plan(&self) -> Result<BuildPlan> {
        let templates = self.template_set().await?;
        let scanned = scan::scan(&self.content, self.config.build.include_drafts).await?;
        let loaded = state::BuildState::load(&self.output).await;
        let mode = if loaded.corrupted { BuildMode::Full } else { BuildMode::Incremental };
        Ok(plan::plan(scanned.units, &scanned.failed, &templates, &self.config, &loaded.state, mode))
    }

    /// Loads the template set: embedded defaults overridden by every file
    /// in the template directory.
    async fn template_set(&self) -> Result<TemplateSet> {
        let files = self.templates.list(None).await.or_raise(|| ErrorKind::Templates)?;
        let mut overrides = Vec::with_capacity(files.len());
        for info in files {
            let body = self.templates.read(&info.path).await.or_raise(|| ErrorKind::Templates)?;
            overrides.push((info.path, body));
        }
        overrides.sort_by(|a, b| a.0.cmp(&b.0));
        TemplateSet::defaults()
            .and_then(|set| set.with_overrides(overrides))
            .or_raise(|| ErrorKind::Templates)
    }
}
