//! Build planning: deciding which units need work.
//!
//! Planning is pure. Given the scanned units, the template set, the
//! configuration and the persisted state, it partitions units into rebuild
//! and skip sets, identifies stale state entries, and decides whether the
//! aggregate artifacts need regenerating. No I/O happens here, which is what
//! makes the decision rule easy to test exhaustively.

use crate::fingerprint;
use crate::state::{BuildState, UnitRecord};
use plume_config::SiteConfig;
use plume_content::ContentUnit;
use plume_render::TemplateSet;
use std::collections::BTreeSet;

/// How much of the corpus a run is willing to reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Rebuild everything, ignoring persisted state.
    Full,
    /// Rebuild only units whose composite fingerprint changed.
    Incremental,
}

/// A unit scheduled for this run, with its composite fingerprint computed
/// once at planning time.
#[derive(Debug, Clone)]
pub struct PlannedUnit {
    pub unit: ContentUnit,
    pub composite: String,
}

/// A state entry whose source unit disappeared from the content directory.
#[derive(Debug, Clone)]
pub struct StaleEntry {
    pub slug: String,
    pub record: UnitRecord,
}

/// The work a build run will perform.
#[derive(Debug)]
pub struct BuildPlan {
    pub mode: BuildMode,
    pub rebuild: Vec<PlannedUnit>,
    pub skipped: Vec<PlannedUnit>,
    pub stale: Vec<StaleEntry>,
    /// Corpus fingerprint over the scanned units, aggregate templates and
    /// configuration.
    pub corpus: String,
    /// `true` when the aggregate artifacts must be regenerated.
    pub aggregates: bool,
}

/// Partitions units against persisted state.
///
/// A unit rebuilds when it has no state entry or its composite fingerprint
/// differs from the recorded one. Template edits flow through the composite,
/// so every unit using an edited template rebuilds while units on untouched
/// templates do not. In [`BuildMode::Full`] every unit rebuilds regardless.
///
/// Aggregates regenerate whenever the corpus fingerprint differs from the
/// one recorded after the last successful aggregate pass; membership changes
/// and per-unit edits both feed that fingerprint.
///
/// `failed` holds the slugs of sources that exist but could not be read or
/// parsed this run. Their state entries are neither planned nor stale: the
/// source is still there, so its previous output and record survive until
/// the source parses again or is actually removed.
pub fn plan(
    units: Vec<ContentUnit>,
    failed: &BTreeSet<String>,
    templates: &TemplateSet,
    config: &SiteConfig,
    state: &BuildState,
    mode: BuildMode,
) -> BuildPlan {
    let config_fp = config.fingerprint();
    let planned: Vec<PlannedUnit> = units
        .into_iter()
        .map(|unit| {
            let composite = fingerprint::unit_composite(&unit, templates, &config_fp);
            PlannedUnit { unit, composite }
        })
        .collect();

    let corpus_inputs: Vec<(String, String)> =
        planned.iter().map(|p| (p.unit.slug.clone(), p.composite.clone())).collect();
    let corpus = fingerprint::corpus(&corpus_inputs, templates, &config_fp);

    let stale: Vec<StaleEntry> = state
        .units
        .iter()
        .filter(|(slug, _)| {
            !failed.contains(slug.as_str()) && !planned.iter().any(|p| &p.unit.slug == *slug)
        })
        .map(|(slug, record)| StaleEntry { slug: slug.clone(), record: record.clone() })
        .collect();

    let (rebuild, skipped): (Vec<_>, Vec<_>) = planned.into_iter().partition(|p| match mode {
        BuildMode::Full => true,
        BuildMode::Incremental => {
            state.units.get(&p.unit.slug).is_none_or(|record| record.composite != p.composite)
        },
    });

    let aggregates = match mode {
        BuildMode::Full => true,
        BuildMode::Incremental => state.aggregates.as_deref() != Some(corpus.as_str()),
    };

    BuildPlan { mode, rebuild, skipped, stale, corpus, aggregates }
}
