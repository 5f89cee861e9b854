//! Configuration loading and fingerprinting.
//!
//! A [`SiteConfig`] is assembled by layering, in increasing precedence:
//! built-in defaults, an optional TOML file, and `PLUME_`-prefixed
//! environment variables. The loaded value is treated as an immutable
//! snapshot for the duration of a build.
//!
//! Only the fields that can change rendered output participate in
//! [`SiteConfig::fingerprint`]; operational knobs like the concurrency limit
//! deliberately do not, so that tuning them never invalidates existing
//! output artifacts.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration snapshot for one site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteMeta,
    pub paths: Paths,
    pub build: BuildOptions,
}

/// Site metadata injected into every rendered template.
///
/// Every field here feeds the configuration fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    /// Site title, shown in the index header and feed metadata.
    pub title: String,
    /// One-line site description for the index and RSS channel.
    pub description: String,
    /// Absolute base URL, used for sitemap/RSS links. No trailing slash.
    pub base_url: String,
    /// BCP 47 language tag for the `<html lang>` attribute and feed.
    pub language: String,
    /// Optional author name for feed items.
    pub author: Option<String>,
}
impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "Untitled blog".to_string(),
            description: String::new(),
            base_url: "http://localhost:8000".to_string(),
            language: "en".to_string(),
            author: None,
        }
    }
}

/// Input and output directories, relative to the working directory unless
/// absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub content: PathBuf,
    pub templates: PathBuf,
    pub output: PathBuf,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            templates: PathBuf::from("templates"),
            output: PathBuf::from("public"),
        }
    }
}

/// Operational build options. None of these affect rendered bytes, so none
/// of them participate in the configuration fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Maximum number of units rendered concurrently.
    pub concurrency: usize,
    /// Render units whose frontmatter marks them as drafts.
    pub include_drafts: bool,
    /// What to do with the outputs of units whose source was removed.
    pub stale_outputs: StaleOutputs,
}
impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            include_drafts: false,
            stale_outputs: StaleOutputs::default(),
        }
    }
}

/// Policy for output artifacts whose source unit no longer exists.
///
/// The safe default is to keep them on disk; they are reported as stale
/// either way so a deployment step can act on the information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleOutputs {
    /// Leave stale outputs in place, report them in the build summary.
    #[default]
    Keep,
    /// Delete stale outputs from the output directory.
    Delete,
}

impl SiteConfig {
    /// Load configuration by layering defaults, an optional TOML file, and
    /// `PLUME_` environment variables (nested keys split on `__`, e.g.
    /// `PLUME_SITE__TITLE`).
    ///
    /// When `file` is `Some`, the file must exist. When `None`, the default
    /// location from [`default_path`](Self::default_path) is merged only if
    /// present.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match file {
            Some(path) => {
                if !path.exists() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            },
            None => {
                if let Some(path) = Self::default_path()
                    && path.exists()
                {
                    tracing::debug!(path = %path.display(), "Merging default configuration file");
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        let config: Self =
            figment.merge(Env::prefixed("PLUME_").split("__")).extract().map_err(ErrorKind::Invalid)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file: `plume.toml` in the working directory,
    /// falling back to the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from("plume.toml");
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("", "", "plume").map(|dirs| dirs.config_dir().join("plume.toml"))
    }

    /// Deterministic digest over every render-affecting field.
    ///
    /// Fields are fed to the hasher in a fixed order with NUL separators so
    /// that `("ab", "c")` and `("a", "bc")` cannot collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for field in [
            &self.site.title,
            &self.site.description,
            &self.site.base_url,
            &self.site.language,
            self.site.author.as_deref().map(str::to_string).as_ref().unwrap_or(&String::new()),
        ] {
            hasher.update(field.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }

    fn validate(&self) -> Result<()> {
        if self.build.concurrency == 0 {
            exn::bail!(ErrorKind::Validation("build.concurrency must be at least 1".to_string()));
        }
        if self.site.base_url.ends_with('/') {
            exn::bail!(ErrorKind::Validation("site.base_url must not end with a slash".to_string()));
        }
        Ok(())
    }
}
