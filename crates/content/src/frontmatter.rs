//! Frontmatter extraction and resolution.
//!
//! A source document may open with a YAML frontmatter block delimited by
//! `---` lines. Everything the block omits gets a deterministic fallback —
//! never "now", since a unit's rendered bytes must be a pure function of its
//! source bytes.

use crate::error::{ErrorKind, Result};
use serde::Deserialize;
use time::Date;
use time::macros::format_description;

/// Frontmatter exactly as written in the source document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFrontmatter {
    title: Option<String>,
    date: Option<String>,
    summary: Option<String>,
    tags: Vec<String>,
    template: Option<String>,
    draft: bool,
}

/// Resolved frontmatter with all fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    /// Post title; falls back to the slug when absent.
    pub title: String,
    /// Publication date (`YYYY-MM-DD`). Unparseable dates are dropped with a
    /// warning rather than failing the unit.
    pub date: Option<Date>,
    /// Short summary for listings and feeds; derived from the body if absent.
    pub summary: Option<String>,
    pub tags: Vec<String>,
    /// Name of the page template this unit renders with.
    pub template: String,
    /// Draft units are skipped unless the build is configured otherwise.
    pub draft: bool,
}

/// Name of the template a unit uses when frontmatter does not say.
pub const DEFAULT_PAGE_TEMPLATE: &str = "post";

/// Splits a source document into its frontmatter block and Markdown body.
///
/// Returns `(yaml, body)` where `yaml` is `None` if the document does not
/// open with a `---` delimiter. The delimiters themselves are consumed.
pub(crate) fn split(source: &str) -> (Option<&str>, &str) {
    let Some(rest) = source.strip_prefix("---").and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
    else {
        return (None, source);
    };
    // Empty block: the closing delimiter is the very next line.
    if rest == "---" || rest.starts_with("---\n") || rest.starts_with("---\r\n") {
        return (Some(""), rest[3..].trim_start_matches(['\r', '\n']));
    }
    // Find the closing delimiter on its own line.
    for (idx, _) in rest.match_indices('\n') {
        let candidate = &rest[idx + 1..];
        if candidate == "---" || candidate.starts_with("---\n") || candidate.starts_with("---\r\n") {
            let yaml = rest[..idx].trim_end_matches('\r');
            let body = candidate[3..].trim_start_matches(['\r', '\n']);
            return (Some(yaml), body);
        }
    }
    // Opening delimiter without a closing one: treat the whole thing as body.
    (None, source)
}

/// Parses and resolves the frontmatter of one source document.
///
/// `slug` supplies the title fallback. YAML syntax errors are fatal for the
/// unit ([`ErrorKind::Frontmatter`]); an absent block just means all
/// fallbacks apply.
pub(crate) fn parse(yaml: Option<&str>, slug: &str) -> Result<Frontmatter> {
    let raw: RawFrontmatter = match yaml {
        // An empty block deserializes as YAML null, which won't populate a
        // struct even with defaults, so short-circuit it.
        Some(yaml) if !yaml.trim().is_empty() => serde_yaml::from_str(yaml).map_err(ErrorKind::Frontmatter)?,
        _ => RawFrontmatter::default(),
    };
    let date = raw.date.as_deref().and_then(|d| parse_date(d, slug));
    Ok(Frontmatter {
        title: raw.title.unwrap_or_else(|| slug.to_string()),
        date,
        summary: raw.summary,
        tags: raw.tags,
        template: raw.template.unwrap_or_else(|| DEFAULT_PAGE_TEMPLATE.to_string()),
        draft: raw.draft,
    })
}

fn parse_date(value: &str, slug: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    // Accept a full timestamp by only looking at the date prefix.
    let prefix = value.get(..10).unwrap_or(value);
    match Date::parse(prefix, &format) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::warn!(slug, value, %err, "Ignoring unparseable frontmatter date");
            None
        },
    }
}
