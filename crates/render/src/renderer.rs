//! Unit and aggregate rendering through a compiled [`upon`] engine.

use crate::error::{ErrorKind, Result};
use crate::set::TemplateSet;
use exn::{OptionExt, ResultExt};
use plume_config::SiteMeta;
use plume_content::ContentUnit;
use std::cmp::Reverse;
use std::path::Path;
use time::Date;
use time::format_description::well_known::Rfc2822;
use tracing::instrument;
use upon::Engine;

/// An output artifact derived from the whole corpus rather than one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Index,
    Listing,
    Sitemap,
    Rss,
    Robots,
}
impl Aggregate {
    pub const ALL: [Aggregate; 5] = [Self::Index, Self::Listing, Self::Sitemap, Self::Rss, Self::Robots];

    /// Name of the template this aggregate renders with.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Listing => "listing",
            Self::Sitemap => "sitemap",
            Self::Rss => "rss",
            Self::Robots => "robots",
        }
    }

    /// Relative path of the artifact in the output root.
    pub fn output_path(&self) -> &'static Path {
        Path::new(match self {
            Self::Index => "index.html",
            Self::Listing => "archive.html",
            Self::Sitemap => "sitemap.xml",
            Self::Rss => "rss.xml",
            Self::Robots => "robots.txt",
        })
    }
}

/// Renders units and aggregates against a compiled template set.
///
/// Construction compiles every template eagerly so that syntax errors
/// surface before any output is written, not halfway through a build. The
/// site context is escaped and converted to a template value once and
/// reused for every render.
#[derive(Debug)]
pub struct Renderer {
    engine: Engine<'static>,
    site: upon::Value,
}

impl Renderer {
    /// Compiles all templates in `set` and prepares the shared site context.
    ///
    /// Returns [`ErrorKind::Compile`] naming the offending template if any
    /// body has invalid syntax.
    pub fn new(set: &TemplateSet, site: &SiteMeta) -> Result<Self> {
        let mut engine = Engine::new();
        for (name, template) in set.iter() {
            engine
                .add_template(name.to_string(), template.body.clone())
                .or_raise(|| ErrorKind::Compile(name.to_string()))?;
        }
        Ok(Self { engine, site: Self::site_value(site) })
    }

    /// Renders one unit with the page template named by its frontmatter.
    ///
    /// Returns [`ErrorKind::UnknownTemplate`] when the unit references a
    /// template that is in neither the user directory nor the defaults.
    #[instrument(skip_all, fields(slug = %unit.slug))]
    pub fn render_unit(&self, unit: &ContentUnit) -> Result<String> {
        let name = unit.front.template.as_str();
        let template =
            self.engine.get_template(name).ok_or_raise(|| ErrorKind::UnknownTemplate(name.to_string()))?;
        let ctx = upon::value! {
            site: self.site.clone(),
            post: Self::post_value(unit, true),
        };
        template.render(ctx).to_string().or_raise(|| ErrorKind::Render(name.to_string()))
    }

    /// Renders one aggregate artifact over the full corpus.
    ///
    /// Units are ordered newest-first (undated last), ties broken by slug,
    /// so output is deterministic regardless of input enumeration order.
    #[instrument(skip(self, units), fields(aggregate = aggregate.template()))]
    pub fn render_aggregate(&self, aggregate: Aggregate, units: &[ContentUnit]) -> Result<String> {
        let name = aggregate.template();
        let template =
            self.engine.get_template(name).ok_or_raise(|| ErrorKind::UnknownTemplate(name.to_string()))?;
        let mut ordered: Vec<&ContentUnit> = units.iter().collect();
        ordered.sort_by_key(|unit| (Reverse(unit.front.date.unwrap_or(Date::MIN)), unit.slug.clone()));
        let posts: Vec<upon::Value> = ordered.iter().map(|unit| Self::post_value(unit, false)).collect();
        let ctx = upon::value! {
            site: self.site.clone(),
            posts: posts,
        };
        template.render(ctx).to_string().or_raise(|| ErrorKind::Render(name.to_string()))
    }

    fn site_value(site: &SiteMeta) -> upon::Value {
        upon::value! {
            title: escape(&site.title),
            description: escape(&site.description),
            base_url: site.base_url.as_str(),
            language: site.language.as_str(),
            author: site.author.as_deref().map(escape).unwrap_or_default(),
            has_author: site.author.is_some(),
        }
    }

    /// Builds the template value for one post. Body HTML is only included
    /// for page renders; aggregates work from metadata and summaries.
    fn post_value(unit: &ContentUnit, with_content: bool) -> upon::Value {
        upon::value! {
            slug: unit.slug.as_str(),
            url: format!("{}.html", unit.slug),
            title: escape(&unit.front.title),
            summary: escape(&unit.summary),
            tags: unit.front.tags.iter().map(|t| escape(t)).collect::<Vec<_>>(),
            has_tags: !unit.front.tags.is_empty(),
            date: unit.front.date.map(|d| d.to_string()).unwrap_or_default(),
            rfc2822: unit.front.date.and_then(rfc2822_midnight).unwrap_or_default(),
            has_date: unit.front.date.is_some(),
            content: if with_content { unit.html.as_str() } else { "" },
        }
    }
}

/// Escapes a value for interpolation into HTML or XML text content.
///
/// Rendered Markdown bodies are *not* escaped — they are trusted fragments —
/// but every metadata string is, since titles and summaries flow into both
/// HTML attributes and XML elements.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// RFC 2822 timestamp at midnight UTC for feed `pubDate` elements.
///
/// Deterministic: derived only from the frontmatter date, never the clock.
fn rfc2822_midnight(date: Date) -> Option<String> {
    date.with_hms(0, 0, 0).ok().map(|dt| dt.assume_utc()).and_then(|dt| dt.format(&Rfc2822).ok())
}
