//! Embedded default templates.
//!
//! Every template a site needs ships inside the binary via
//! [`rust-embed`](rust_embed), so a bare content directory renders without
//! any template authoring. User templates with the same name override these.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;

#[derive(Embed)]
#[folder = "templates/"]
pub struct Defaults;
impl Defaults {
    /// Get the body of a default template by file name (e.g. `post.html`).
    pub fn load(name: impl AsRef<str>) -> Result<Cow<'static, [u8]>> {
        Self::get(name.as_ref()).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(name.as_ref().to_string()))
    }

    /// List all embedded default template file names.
    pub fn list() -> Vec<Cow<'static, str>> {
        Self::iter().collect()
    }

    pub fn exists(name: impl AsRef<str>) -> bool {
        Self::get(name.as_ref()).is_some()
    }
}
