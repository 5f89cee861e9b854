//! Template collections and their fingerprints.

use crate::assets::Defaults;
use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// One template: its body and the BLAKE3 fingerprint over the body bytes.
#[derive(Debug, Clone)]
pub struct Template {
    pub body: String,
    pub fingerprint: String,
    /// `true` when the template came from the user's template directory
    /// rather than the compiled-in defaults.
    pub user_provided: bool,
}
impl Template {
    fn new(body: String, user_provided: bool) -> Self {
        let fingerprint = blake3::hash(body.as_bytes()).to_string();
        Self { body, fingerprint, user_provided }
    }
}

/// The named collection of render templates for one site.
///
/// Starts from the embedded defaults (`post`, `index`, `listing`, `sitemap`,
/// `rss`, `robots`) and lets user files override any of them — or add new
/// page templates that units can select via their frontmatter `template`
/// key. Keys are file stems: `templates/post.html` overrides `post`.
///
/// Shared read-only across every unit rendered in a build.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    entries: BTreeMap<String, Template>,
}

impl TemplateSet {
    /// The full set of embedded default templates.
    pub fn defaults() -> Result<Self> {
        let mut entries = BTreeMap::new();
        for file in Defaults::list() {
            let body = Defaults::load(file.as_ref())?;
            let body = String::from_utf8(body.into_owned())
                // Infallible: the embedded templates are UTF-8 source files
                // in this repository.
                .map_err(|_| ErrorKind::AssetNotFound(file.to_string()))?;
            entries.insert(stem(file.as_ref()).to_string(), Template::new(body, false));
        }
        Ok(Self { entries })
    }

    /// Layer user template files over the defaults.
    ///
    /// Each item is a template file's relative path and raw bytes; the file
    /// stem becomes the template name. Non-UTF-8 bodies fail the whole set —
    /// a broken template directory should not silently fall back.
    pub fn with_overrides(
        mut self,
        files: impl IntoIterator<Item = (impl AsRef<Path>, impl Into<Vec<u8>>)>,
    ) -> Result<Self> {
        for (path, body) in files {
            let name = stem_of_path(path.as_ref());
            let body = String::from_utf8(body.into())
                .map_err(|_| ErrorKind::Compile(name.clone()))?;
            tracing::debug!(template = name, "Using user-provided template");
            self.entries.insert(name, Template::new(body, true));
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Fingerprint of a named template, if it exists.
    pub fn fingerprint(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|t| t.fingerprint.as_str())
    }

    /// Iterate over `(name, template)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Template)> {
        self.entries.iter().map(|(name, template)| (name.as_str(), template))
    }
}

fn stem(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name)
}

fn stem_of_path(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
