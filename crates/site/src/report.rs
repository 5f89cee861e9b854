//! Build outcome reporting.

use crate::plan::BuildMode;
use std::path::PathBuf;

/// Where in the pipeline a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The source file could not be read or parsed into a unit.
    Parse,
    /// The unit names a template that does not exist.
    MissingTemplate,
    /// The template engine failed while rendering the unit.
    Render,
    /// The rendered artifact could not be written.
    Write,
}

/// One unit that failed to make it from source to output.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    /// Slug of the unit, or the source path when parsing never got that far.
    pub unit: String,
    pub stage: FailureStage,
    pub message: String,
}

/// One aggregate artifact that failed to regenerate.
#[derive(Debug, Clone)]
pub struct AggregateFailure {
    pub name: String,
    pub message: String,
}

/// An output artifact whose source unit no longer exists.
#[derive(Debug, Clone)]
pub struct StaleOutput {
    pub slug: String,
    pub output: PathBuf,
    /// `true` when the delete policy removed the artifact this run.
    pub deleted: bool,
}

/// Summary of one build run.
///
/// A run that completes is not necessarily a successful run: individual
/// units and aggregates fail in isolation and land here rather than
/// aborting the build. Callers decide the process exit status from
/// [`success`](Self::success).
#[derive(Debug)]
pub struct BuildReport {
    pub mode: BuildMode,
    /// `true` when persisted state was unreadable and the run fell back to
    /// a full rebuild.
    pub state_recovered: bool,
    /// Slugs rendered and written this run.
    pub rebuilt: Vec<String>,
    /// Units whose fingerprints matched and were left untouched.
    pub skipped: usize,
    /// `true` when the aggregate artifacts were regenerated.
    pub aggregates_rebuilt: bool,
    pub failures: Vec<UnitFailure>,
    pub aggregate_failures: Vec<AggregateFailure>,
    pub stale: Vec<StaleOutput>,
}

impl BuildReport {
    pub(crate) fn new(mode: BuildMode, state_recovered: bool) -> Self {
        Self {
            mode,
            state_recovered,
            rebuilt: Vec::new(),
            skipped: 0,
            aggregates_rebuilt: false,
            failures: Vec::new(),
            aggregate_failures: Vec::new(),
            stale: Vec::new(),
        }
    }

    /// A run succeeds only when nothing failed, units and aggregates alike.
    pub fn success(&self) -> bool {
        self.failures.is_empty() && self.aggregate_failures.is_empty()
    }
}
