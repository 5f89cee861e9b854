//! Content directory scanning.

use crate::error::{ErrorKind, Result};
use crate::report::{FailureStage, UnitFailure};
use exn::ResultExt;
use plume_content::ContentUnit;
use plume_storage::BackendHandle;
use std::collections::{BTreeMap, BTreeSet};

/// Everything a scan of the content directory produced.
///
/// Units are sorted by slug. Files that could not be read or parsed land in
/// `failures` instead of aborting the scan; one malformed article must never
/// block the rest of the corpus. Their slugs are tracked in `failed` so
/// planning can tell a broken source apart from a removed one: a broken
/// source still exists, and its previous output must not be treated as
/// stale.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub units: Vec<ContentUnit>,
    pub failures: Vec<UnitFailure>,
    /// Slugs of sources that are present but failed to read or parse.
    pub failed: BTreeSet<String>,
}

impl ScanOutcome {
    /// Records a source that exists but could not become a unit. The slug is
    /// derived from the filename alone where possible, so the unit keeps its
    /// state record until the source parses again (or is removed).
    fn fail(&mut self, path: &std::path::Path, message: String) {
        self.failures.push(UnitFailure {
            unit: path.display().to_string(),
            stage: FailureStage::Parse,
            message,
        });
        if let Ok(slug) = plume_content::derive_slug(path) {
            self.failed.insert(slug);
        }
    }
}

/// Enumerates and parses every Markdown source under the content root.
///
/// Only `.md` files are considered. Drafts are dropped unless
/// `include_drafts` is set — a dropped draft behaves exactly like a removed
/// unit as far as planning is concerned. Two files that slugify to the same
/// slug keep the first (in path order) and fail the second.
///
/// Fails only when the directory itself cannot be listed.
#[tracing::instrument(skip(backend), fields(backend = backend.name()))]
pub async fn scan(backend: &BackendHandle, include_drafts: bool) -> Result<ScanOutcome> {
    let mut files = backend.list(None).await.or_raise(|| ErrorKind::Scan)?;
    files.retain(|info| info.path.extension().is_some_and(|ext| ext == "md"));
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut outcome = ScanOutcome::default();
    let mut seen: BTreeMap<String, std::path::PathBuf> = BTreeMap::new();
    for info in files {
        let bytes = match backend.read(&info.path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                outcome.fail(&info.path, format!("could not read source: {err}"));
                continue;
            },
        };
        let unit = match plume_content::parse_unit(&info.path, &bytes) {
            Ok(unit) => unit,
            Err(err) => {
                outcome.fail(&info.path, err.to_string());
                continue;
            },
        };
        if unit.front.draft && !include_drafts {
            tracing::debug!(slug = %unit.slug, "Skipping draft");
            continue;
        }
        if let Some(existing) = seen.get(&unit.slug) {
            outcome.failures.push(UnitFailure {
                unit: info.path.display().to_string(),
                stage: FailureStage::Parse,
                message: format!("slug '{}' already produced by {}", unit.slug, existing.display()),
            });
            continue;
        }
        seen.insert(unit.slug.clone(), info.path.clone());
        outcome.units.push(unit);
    }
    outcome.units.sort_by(|a, b| a.slug.cmp(&b.slug));
    tracing::debug!(units = outcome.units.len(), failures = outcome.failures.len(), "Scan complete");
    Ok(outcome)
}
