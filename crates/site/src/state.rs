//! Persisted build state.
//!
//! The state file is a cache of "this output is already correct", keyed by
//! slug — never a cache of "this output exists". It is read once at build
//! start, merged from render results, and persisted once at build end, so an
//! interrupted run can only err toward redoing work, never toward skipping
//! work that was needed.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use plume_storage::BackendHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Relative path of the state file inside the output root.
///
/// Living next to the rendered artifacts means a deployment step that wipes
/// the output directory also wipes the state, which degrades safely into a
/// full rebuild.
pub const STATE_FILE: &str = ".plume-state.json";

/// The fingerprint combination that produced one unit's current output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Composite fingerprint (content + template + config digests).
    pub composite: String,
    /// Name of the template the unit rendered with.
    pub template: String,
    /// Fingerprint of that template's body at render time.
    pub template_fingerprint: String,
    /// Output artifact path relative to the output root.
    pub output: PathBuf,
}

/// Mapping from slug to last-known-correct fingerprint combination, plus the
/// corpus fingerprint behind the aggregate artifacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildState {
    #[serde(default)]
    pub units: BTreeMap<String, UnitRecord>,
    /// Corpus fingerprint recorded after the last successful aggregate pass.
    #[serde(default)]
    pub aggregates: Option<String>,
}

/// Result of loading persisted state, with a flag for the corruption
/// fallback so callers can force a full rebuild for the run.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub state: BuildState,
    /// `true` when a state file existed but could not be parsed.
    pub corrupted: bool,
}

impl BuildState {
    /// Loads state from the output backend.
    ///
    /// A missing file is a normal first build (empty state). An unreadable
    /// or unparseable file is *not* fatal: the state is discarded with a
    /// warning and the caller falls back to full-rebuild mode, which will
    /// rewrite both outputs and state from scratch.
    pub async fn load(backend: &BackendHandle) -> LoadedState {
        let path = Path::new(STATE_FILE);
        let exists = match backend.exists(path).await {
            Ok(exists) => exists,
            Err(err) => {
                tracing::warn!(%err, "Could not probe for build state; treating as corrupt");
                return LoadedState { state: BuildState::default(), corrupted: true };
            },
        };
        if !exists {
            return LoadedState::default();
        }
        let bytes = match backend.read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%err, "Could not read build state; falling back to full rebuild");
                return LoadedState { state: BuildState::default(), corrupted: true };
            },
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => LoadedState { state, corrupted: false },
            Err(err) => {
                tracing::warn!(%err, "Build state is malformed; falling back to full rebuild");
                LoadedState { state: BuildState::default(), corrupted: true }
            },
        }
    }

    /// Persists state to the output backend.
    pub async fn persist(&self, backend: &BackendHandle) -> Result<()> {
        // Infallible: BuildState contains only strings, paths and maps.
        let bytes = serde_json::to_vec_pretty(self).or_raise(|| ErrorKind::State)?;
        backend.write(Path::new(STATE_FILE), &bytes).await.or_raise(|| ErrorKind::State)
    }
}
