//! Build execution: the bounded render phase and the aggregate pass.
//!
//! Execution takes a [`BuildPlan`] and performs its I/O: units render and
//! write concurrently up to the configured limit, then the aggregate
//! artifacts regenerate after every unit has settled. State mutation stays
//! on the driving task — render futures return outcomes, they never touch
//! the shared state themselves.

use crate::plan::{BuildPlan, PlannedUnit};
use crate::report::{AggregateFailure, BuildReport, FailureStage, StaleOutput, UnitFailure};
use crate::state::{BuildState, UnitRecord};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use plume_config::{SiteConfig, StaleOutputs};
use plume_content::ContentUnit;
use plume_render::{Aggregate, Renderer, TemplateSet};
use plume_storage::BackendHandle;
use std::collections::VecDeque;

/// What one unit's render-and-write produced.
enum UnitOutcome {
    Built { slug: String, record: UnitRecord },
    Failed(UnitFailure),
}

/// Executes a plan against the output backend.
///
/// Returns the run report and the state to persist. Nothing in here is
/// fatal: unit, stale-cleanup and aggregate failures are all collected into
/// the report so the rest of the run can proceed.
pub(crate) async fn execute(
    plan: BuildPlan,
    renderer: Renderer,
    templates: &TemplateSet,
    config: &SiteConfig,
    output: &BackendHandle,
    mut state: BuildState,
    state_recovered: bool,
) -> (BuildReport, BuildState) {
    let mut report = BuildReport::new(plan.mode, state_recovered);
    report.skipped = plan.skipped.len();

    // Aggregates render over the whole surviving corpus, so keep the units
    // before the rebuild queue consumes them.
    let mut corpus_units: Vec<ContentUnit> =
        plan.skipped.iter().map(|p| p.unit.clone()).chain(plan.rebuild.iter().map(|p| p.unit.clone())).collect();
    corpus_units.sort_by(|a, b| a.slug.cmp(&b.slug));

    render_units(plan.rebuild, &renderer, templates, config, output, &mut state, &mut report).await;

    for stale in plan.stale {
        state.units.remove(&stale.slug);
        let deleted = match config.build.stale_outputs {
            StaleOutputs::Keep => false,
            StaleOutputs::Delete => match output.delete(&stale.record.output).await {
                Ok(()) => true,
                Err(err) => {
                    // Already gone or undeletable; either way the artifact is
                    // reported as stale-but-present only if it still exists.
                    tracing::warn!(slug = %stale.slug, %err, "Could not delete stale output");
                    false
                },
            },
        };
        tracing::info!(slug = %stale.slug, output = %stale.record.output.display(), deleted, "Stale output");
        report.stale.push(StaleOutput { slug: stale.slug, output: stale.record.output, deleted });
    }

    if plan.aggregates {
        report.aggregates_rebuilt = true;
        let mut all_ok = true;
        for aggregate in Aggregate::ALL {
            if let Err(failure) = render_aggregate(aggregate, &renderer, &corpus_units, output).await {
                all_ok = false;
                report.aggregate_failures.push(failure);
            }
        }
        // Only a fully successful aggregate pass counts as current; a
        // partial one must be retried next run.
        state.aggregates = if all_ok { Some(plan.corpus) } else { None };
    }

    (report, state)
}

/// Renders and writes the rebuild set with bounded concurrency.
///
/// Futures are promoted from the queue in FIFO order as slots free up, so
/// at most `build.concurrency` units are in flight at once. Outcomes are
/// folded into state and report here, on the driving task.
async fn render_units(
    rebuild: Vec<PlannedUnit>,
    renderer: &Renderer,
    templates: &TemplateSet,
    config: &SiteConfig,
    output: &BackendHandle,
    state: &mut BuildState,
    report: &mut BuildReport,
) {
    let spawn = |planned: PlannedUnit| {
        let template_fingerprint =
            templates.fingerprint(&planned.unit.front.template).unwrap_or_default().to_string();
        render_one(planned, renderer, output.clone(), template_fingerprint)
    };

    let mut queue: VecDeque<PlannedUnit> = rebuild.into();
    let mut inflight = FuturesUnordered::new();
    while inflight.len() < config.build.concurrency {
        let Some(planned) = queue.pop_front() else { break };
        inflight.push(spawn(planned));
    }
    while let Some(outcome) = inflight.next().await {
        // Promote the next queued unit in FIFO order before folding in the
        // finished one, keeping the pipeline full.
        if let Some(planned) = queue.pop_front() {
            inflight.push(spawn(planned));
        }
        match outcome {
            UnitOutcome::Built { slug, record } => {
                tracing::info!(slug = %slug, "Rebuilt");
                state.units.insert(slug.clone(), record);
                report.rebuilt.push(slug);
            },
            UnitOutcome::Failed(failure) => {
                tracing::warn!(unit = %failure.unit, stage = ?failure.stage, message = %failure.message, "Unit failed");
                // The old state record, if any, stays put: the existing
                // output on disk still matches it.
                report.failures.push(failure);
            },
        }
    }
    report.rebuilt.sort();
}

async fn render_one(
    planned: PlannedUnit,
    renderer: &Renderer,
    output: BackendHandle,
    template_fingerprint: String,
) -> UnitOutcome {
    let unit = &planned.unit;
    let html = match renderer.render_unit(unit) {
        Ok(html) => html,
        Err(err) => {
            let stage = match &*err {
                plume_render::error::ErrorKind::UnknownTemplate(_) => FailureStage::MissingTemplate,
                _ => FailureStage::Render,
            };
            return UnitOutcome::Failed(UnitFailure {
                unit: unit.slug.clone(),
                stage,
                message: err.to_string(),
            });
        },
    };
    let path = unit.output_path();
    if let Err(err) = output.write(&path, html.as_bytes()).await {
        return UnitOutcome::Failed(UnitFailure {
            unit: unit.slug.clone(),
            stage: FailureStage::Write,
            message: err.to_string(),
        });
    }
    UnitOutcome::Built {
        slug: unit.slug.clone(),
        record: UnitRecord {
            composite: planned.composite,
            template: unit.front.template.clone(),
            template_fingerprint,
            output: path,
        },
    }
}

async fn render_aggregate(
    aggregate: Aggregate,
    renderer: &Renderer,
    units: &[ContentUnit],
    output: &BackendHandle,
) -> Result<(), AggregateFailure> {
    let name = aggregate.template().to_string();
    let body = renderer
        .render_aggregate(aggregate, units)
        .map_err(|err| AggregateFailure { name: name.clone(), message: err.to_string() })?;
    output
        .write(aggregate.output_path(), body.as_bytes())
        .await
        .map_err(|err| AggregateFailure { name: name.clone(), message: err.to_string() })?;
    tracing::info!(aggregate = %name, "Regenerated");
    Ok(())
}
